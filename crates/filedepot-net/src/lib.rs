//! Framed RPC layer: message header, frame taxonomy, socket traits,
//! service dispatch and the server accept loop.
//!
//! Calls on a connection are sequential. A call opens with a `Request`
//! frame; streamed messages travel as `Data` frames terminated by `End`,
//! and the call concludes with a single `Reply` or `Error` frame.

pub mod call;
pub mod error;
pub mod frame;
pub mod message;
pub mod server;
pub mod service;
pub mod socket;

pub use call::ServerCall;
pub use error::NetError;
pub use frame::{recv_frame, send_frame, Frame, FLAG_CLIENT_STREAMING};
pub use message::{MessageHeader, MESSAGE_HEADER_SIZE, MESSAGE_MAX_SIZE};
pub use server::Server;
pub use service::{ServiceHandler, ServiceRegistry};
pub use socket::{Listener, Socket};
