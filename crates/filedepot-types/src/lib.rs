//! Core types shared across filedepot crates: the status-code taxonomy,
//! the `Status` error type and the crate-wide `Result` alias.

#[allow(non_snake_case)]
pub mod status_code;

pub mod result;
pub mod status;

pub use result::{make_error, make_error_msg, Result};
pub use status::Status;
pub use status_code::{status_code_t, FileCode, RPCCode, StatusCode};
