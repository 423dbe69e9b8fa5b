//! The file service: admission control, storage-backed upload/download
//! streaming and directory listing, exposed as an RPC service handler.

use bytes::Bytes;
use filedepot_types::{RPCCode, Result, Status};
use filedepot_wire::{WireDeserialize, WireSerialize};

pub mod admission;
pub mod config;
pub mod download;
pub mod lister;
pub mod path;
pub mod service;
pub mod upload;

pub use admission::{AdmissionClass, AdmissionGate, AdmissionPermit};
pub use config::ServiceConfig;
pub use service::FileService;

/// Decode a wire message body, mapping malformed input to an RPC status.
pub(crate) fn decode_message<T: WireDeserialize>(buf: &[u8]) -> Result<T> {
    let mut offset = 0;
    T::wire_deserialize(buf, &mut offset)
        .map_err(|e| Status::with_message(RPCCode::INVALID_MESSAGE_TYPE, e.to_string()))
}

/// Encode a wire message into a frame body.
pub(crate) fn encode_message<T: WireSerialize>(msg: &T) -> Result<Bytes> {
    let mut buf = Vec::new();
    msg.wire_serialize(&mut buf)
        .map_err(|e| Status::with_message(RPCCode::SEND_FAILED, e.to_string()))?;
    Ok(Bytes::from(buf))
}
