use thiserror::Error;

/// Errors that can occur in the networking layer.
#[derive(Debug, Error)]
pub enum NetError {
    /// The connection was closed by the remote peer.
    #[error("connection closed")]
    ConnectionClosed,

    /// An I/O error from the underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The message checksum did not match the computed CRC32C.
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The received message does not carry the frame magic number.
    #[error("invalid message: bad magic (checksum low byte: {0:#04x})")]
    InvalidMagic(u8),

    /// The message size exceeds the maximum allowed.
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The message header is incomplete (not enough bytes for the 8-byte header).
    #[error("incomplete header: need {need} bytes, have {have}")]
    IncompleteHeader { need: usize, have: usize },

    /// The frame kind byte is not a known kind.
    #[error("invalid frame kind: {0}")]
    InvalidFrameKind(u8),

    /// A frame arrived that the current call state does not allow.
    #[error("unexpected frame: expected {expected}, got {got}")]
    UnexpectedFrame {
        expected: &'static str,
        got: &'static str,
    },

    /// The server is shutting down and not accepting new requests.
    #[error("server shutting down")]
    ShuttingDown,

    /// A serialization/deserialization error from the wire format.
    #[error("wire error: {0}")]
    WireError(#[from] filedepot_wire::WireError),

    /// An error propagated from a service handler (carries a Status).
    #[error("service error: {0}")]
    ServiceError(#[from] filedepot_types::Status),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_connection_closed() {
        let err = NetError::ConnectionClosed;
        assert_eq!(err.to_string(), "connection closed");
    }

    #[test]
    fn test_display_checksum_mismatch() {
        let err = NetError::ChecksumMismatch {
            expected: 0xAABBCC9D,
            actual: 0x1122339D,
        };
        let s = err.to_string();
        assert!(s.contains("checksum mismatch"));
        assert!(s.contains("0xaabbcc9d"));
        assert!(s.contains("0x1122339d"));
    }

    #[test]
    fn test_display_unexpected_frame() {
        let err = NetError::UnexpectedFrame {
            expected: "Data or End",
            got: "Reply",
        };
        assert!(err.to_string().contains("Data or End"));
        assert!(err.to_string().contains("Reply"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let net_err: NetError = io_err.into();
        assert!(matches!(net_err, NetError::Io(_)));
        assert!(net_err.to_string().contains("pipe broke"));
    }

    #[test]
    fn test_wire_error_conversion() {
        let wire_err = filedepot_wire::WireError::InsufficientData { need: 8, have: 2 };
        let net_err: NetError = wire_err.into();
        assert!(matches!(net_err, NetError::WireError(_)));
    }
}
