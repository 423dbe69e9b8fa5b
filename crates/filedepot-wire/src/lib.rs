//! Little-endian wire serialization for filedepot RPC messages.
//!
//! Strings and byte buffers are length-prefixed with a `u32`, collections
//! with a `u32` element count, and `Option` with a single tag byte.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("insufficient data: need {need} bytes but only {have} remain")]
    InsufficientData { need: usize, have: usize },
    #[error("invalid enum variant for {enum_name}: {value}")]
    InvalidEnumVariant {
        enum_name: &'static str,
        value: u64,
    },
    #[error("invalid UTF-8 string")]
    InvalidUtf8,
}

pub trait WireSerialize {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError>;
}

pub trait WireDeserialize: Sized {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError>;
}

fn read_bytes<'a>(buf: &'a [u8], offset: &mut usize, n: usize) -> Result<&'a [u8], WireError> {
    if buf.len() - *offset < n {
        return Err(WireError::InsufficientData {
            need: n,
            have: buf.len() - *offset,
        });
    }
    let slice = &buf[*offset..*offset + n];
    *offset += n;
    Ok(slice)
}

// ---------------------------------------------------------------------------
// Integer types
// ---------------------------------------------------------------------------

macro_rules! impl_wire_for_int {
    ($ty:ty, $size:expr, $read:ident, $write:ident) => {
        impl WireSerialize for $ty {
            fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
                let mut tmp = [0u8; $size];
                LittleEndian::$write(&mut tmp, *self);
                buf.extend_from_slice(&tmp);
                Ok(())
            }
        }

        impl WireDeserialize for $ty {
            fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
                let bytes = read_bytes(buf, offset, $size)?;
                Ok(LittleEndian::$read(bytes))
            }
        }
    };
}

impl_wire_for_int!(u16, 2, read_u16, write_u16);
impl_wire_for_int!(u32, 4, read_u32, write_u32);
impl_wire_for_int!(u64, 8, read_u64, write_u64);
impl_wire_for_int!(i64, 8, read_i64, write_i64);

// u8 is single-byte, no endianness needed.

impl WireSerialize for u8 {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.push(*self);
        Ok(())
    }
}

impl WireDeserialize for u8 {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        let bytes = read_bytes(buf, offset, 1)?;
        Ok(bytes[0])
    }
}

// ---------------------------------------------------------------------------
// bool
// ---------------------------------------------------------------------------

impl WireSerialize for bool {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.push(if *self { 1u8 } else { 0u8 });
        Ok(())
    }
}

impl WireDeserialize for bool {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        let v = u8::wire_deserialize(buf, offset)?;
        Ok(v != 0)
    }
}

// ---------------------------------------------------------------------------
// String
// ---------------------------------------------------------------------------

impl WireSerialize for String {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        let len = self.len() as u32;
        len.wire_serialize(buf)?;
        buf.extend_from_slice(self.as_bytes());
        Ok(())
    }
}

impl WireDeserialize for String {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        let len = u32::wire_deserialize(buf, offset)? as usize;
        let bytes = read_bytes(buf, offset, len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8)
    }
}

// ---------------------------------------------------------------------------
// bytes::Bytes
// ---------------------------------------------------------------------------

impl WireSerialize for bytes::Bytes {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        let len = self.len() as u32;
        len.wire_serialize(buf)?;
        buf.extend_from_slice(self);
        Ok(())
    }
}

impl WireDeserialize for bytes::Bytes {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        let len = u32::wire_deserialize(buf, offset)? as usize;
        let bytes = read_bytes(buf, offset, len)?;
        Ok(bytes::Bytes::copy_from_slice(bytes))
    }
}

// ---------------------------------------------------------------------------
// Vec<T> (generic)
// ---------------------------------------------------------------------------

// Since u8 serializes as a single byte, Vec<u8> produces identical bytes
// to a raw length-prefixed byte buffer (u32 count + raw bytes).

impl<T: WireSerialize> WireSerialize for Vec<T> {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        let len = self.len() as u32;
        len.wire_serialize(buf)?;
        for item in self {
            item.wire_serialize(buf)?;
        }
        Ok(())
    }
}

impl<T: WireDeserialize> WireDeserialize for Vec<T> {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        let len = u32::wire_deserialize(buf, offset)? as usize;
        let mut result = Vec::with_capacity(len);
        for _ in 0..len {
            result.push(T::wire_deserialize(buf, offset)?);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Option<T>
// ---------------------------------------------------------------------------

impl<T: WireSerialize> WireSerialize for Option<T> {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        match self {
            None => 0u8.wire_serialize(buf),
            Some(val) => {
                1u8.wire_serialize(buf)?;
                val.wire_serialize(buf)
            }
        }
    }
}

impl<T: WireDeserialize> WireDeserialize for Option<T> {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        let tag = u8::wire_deserialize(buf, offset)?;
        match tag {
            0 => Ok(None),
            _ => Ok(Some(T::wire_deserialize(buf, offset)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: WireSerialize + WireDeserialize + std::fmt::Debug + PartialEq>(val: &T) -> T {
        let mut buf = Vec::new();
        val.wire_serialize(&mut buf).unwrap();
        let mut offset = 0;
        let result = T::wire_deserialize(&buf, &mut offset).unwrap();
        assert_eq!(offset, buf.len(), "all bytes should be consumed");
        result
    }

    #[test]
    fn test_ints() {
        assert_eq!(roundtrip(&255u8), 255u8);
        assert_eq!(roundtrip(&0x1234u16), 0x1234u16);
        assert_eq!(roundtrip(&0xDEADBEEFu32), 0xDEADBEEFu32);
        assert_eq!(roundtrip(&u64::MAX), u64::MAX);
        assert_eq!(roundtrip(&i64::MIN), i64::MIN);
    }

    #[test]
    fn test_bool() {
        assert_eq!(roundtrip(&true), true);
        assert_eq!(roundtrip(&false), false);
    }

    #[test]
    fn test_string() {
        assert_eq!(roundtrip(&String::new()), String::new());
        assert_eq!(
            roundtrip(&"hello world".to_string()),
            "hello world".to_string()
        );
        assert_eq!(
            roundtrip(&"utf-8: \u{1F600}".to_string()),
            "utf-8: \u{1F600}".to_string()
        );
    }

    #[test]
    fn test_bytes() {
        let empty = bytes::Bytes::new();
        assert_eq!(roundtrip(&empty), empty);
        let data = bytes::Bytes::from_static(b"hello");
        assert_eq!(roundtrip(&data), data);
    }

    #[test]
    fn test_vec() {
        assert_eq!(roundtrip(&Vec::<u32>::new()), Vec::<u32>::new());
        assert_eq!(roundtrip(&vec![100u32, 200, 300]), vec![100u32, 200, 300]);
        let v = vec!["foo".to_string(), "bar".to_string()];
        assert_eq!(roundtrip(&v), v);
    }

    #[test]
    fn test_option() {
        assert_eq!(roundtrip(&None::<u32>), None);
        assert_eq!(roundtrip(&Some(42u32)), Some(42));
        assert_eq!(roundtrip(&Some("test".to_string())), Some("test".to_string()));
    }

    #[test]
    fn test_little_endian_encoding() {
        let mut buf = Vec::new();
        0x04030201u32.wire_serialize(&mut buf).unwrap();
        assert_eq!(buf, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_insufficient_data() {
        let buf = vec![0u8; 2];
        let mut offset = 0;
        let result = u32::wire_deserialize(&buf, &mut offset);
        match result.unwrap_err() {
            WireError::InsufficientData { need, have } => {
                assert_eq!(need, 4);
                assert_eq!(have, 2);
            }
            _ => panic!("expected InsufficientData error"),
        }
    }

    #[test]
    fn test_invalid_utf8() {
        let mut buf = Vec::new();
        2u32.wire_serialize(&mut buf).unwrap();
        buf.extend_from_slice(&[0xFF, 0xFE]);
        let mut offset = 0;
        let result = String::wire_deserialize(&buf, &mut offset);
        assert!(matches!(result, Err(WireError::InvalidUtf8)));
    }

    #[test]
    fn test_multiple_values_in_buffer() {
        let mut buf = Vec::new();
        42u32.wire_serialize(&mut buf).unwrap();
        "hello".to_string().wire_serialize(&mut buf).unwrap();
        true.wire_serialize(&mut buf).unwrap();

        let mut offset = 0;
        assert_eq!(u32::wire_deserialize(&buf, &mut offset).unwrap(), 42);
        assert_eq!(
            String::wire_deserialize(&buf, &mut offset).unwrap(),
            "hello"
        );
        assert_eq!(bool::wire_deserialize(&buf, &mut offset).unwrap(), true);
        assert_eq!(offset, buf.len());
    }
}
