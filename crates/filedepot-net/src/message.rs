/// Size of the message header in bytes.
pub const MESSAGE_HEADER_SIZE: usize = 8;

/// Magic number identifying a filedepot frame (occupies the low byte of `checksum`).
pub const FRAME_MAGIC_NUM: u8 = 0x9D;

/// Maximum allowed message size (16 MiB). Transfer chunks are 1 MiB, so
/// any larger frame indicates a corrupt or hostile peer.
pub const MESSAGE_MAX_SIZE: usize = 16 * 1024 * 1024;

/// Wire header prepended to every network message: 4-byte checksum followed
/// by 4-byte payload size, both in little-endian byte order.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    pub checksum: u32,
    pub size: u32,
}

impl MessageHeader {
    /// Create a new header for the given payload.
    ///
    /// Computes the CRC32C checksum with the frame magic number embedded in
    /// the low byte.
    pub fn for_payload(payload: &[u8]) -> Self {
        Self {
            checksum: calc_frame_checksum(payload),
            size: payload.len() as u32,
        }
    }

    /// Returns `true` if this header carries a filedepot frame.
    pub fn is_frame_message(&self) -> bool {
        (self.checksum & 0xFF) == FRAME_MAGIC_NUM as u32
    }

    /// Deserialize a header from an 8-byte little-endian buffer.
    pub fn from_bytes(data: &[u8; MESSAGE_HEADER_SIZE]) -> Self {
        let checksum = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        Self { checksum, size }
    }

    /// Serialize this header into an 8-byte little-endian buffer.
    pub fn to_bytes(&self) -> [u8; MESSAGE_HEADER_SIZE] {
        let mut buf = [0u8; MESSAGE_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.checksum.to_le_bytes());
        buf[4..8].copy_from_slice(&self.size.to_le_bytes());
        buf
    }

    /// Validate that this header describes a legitimate frame and that the
    /// payload checksum matches.
    pub fn validate(&self, payload: &[u8]) -> Result<(), crate::error::NetError> {
        if !self.is_frame_message() {
            return Err(crate::error::NetError::InvalidMagic(
                (self.checksum & 0xFF) as u8,
            ));
        }

        let size = self.size as usize;
        if size > MESSAGE_MAX_SIZE {
            return Err(crate::error::NetError::MessageTooLarge {
                size,
                max: MESSAGE_MAX_SIZE,
            });
        }

        let expected = calc_frame_checksum(payload);
        if self.checksum != expected {
            return Err(crate::error::NetError::ChecksumMismatch {
                expected,
                actual: self.checksum,
            });
        }

        Ok(())
    }
}

/// Calculate CRC32C checksum with the frame magic number in the low byte.
pub fn calc_frame_checksum(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    (crc & !0xff) | (FRAME_MAGIC_NUM as u32)
}
