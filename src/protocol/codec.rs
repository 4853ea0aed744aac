//! Binary codec primitives
//!
//! All multi-byte fields on the wire are little-endian. Strings are packed
//! one byte per character: the protocol predates any UTF-8 support on the
//! panels, so characters above U+00FF are rejected rather than truncated.

use bytes::{BufMut, BytesMut};
use thiserror::Error;

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Character {ch:?} at index {index} does not fit in one byte")]
    WideChar { ch: char, index: usize },

    #[error("{field} is {value}, exceeds maximum {max}")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("Opcode {0} is reserved and has no payload encoding")]
    ReservedOpcode(u8),

    #[error("Unknown opcode {0}")]
    UnknownOpcode(u8),

    #[error("Payload truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Append an unsigned 8-bit field
pub fn put_u8(buf: &mut BytesMut, value: u8) {
    buf.put_u8(value);
}

/// Append an unsigned 16-bit field, little-endian
pub fn put_u16(buf: &mut BytesMut, value: u16) {
    buf.put_u16_le(value);
}

/// Append an unsigned 32-bit field, little-endian
pub fn put_u32(buf: &mut BytesMut, value: u32) {
    buf.put_u32_le(value);
}

/// Append a string one byte per character.
///
/// The byte length written always equals `s.chars().count()`; callers use
/// that count for any length prefix. Characters above U+00FF fail.
pub fn put_str(buf: &mut BytesMut, s: &str) -> CodecResult<()> {
    for (index, ch) in s.chars().enumerate() {
        let code = ch as u32;
        if code > 0xFF {
            return Err(CodecError::WideChar { ch, index });
        }
        buf.put_u8(code as u8);
    }
    Ok(())
}

/// Byte length of a string under the one-byte-per-character encoding,
/// checked against a u8 length-prefix field.
pub fn str_len_u8(s: &str, field: &'static str) -> CodecResult<u8> {
    let len = s.chars().count();
    check_width(len as u64, u8::MAX as u64, field)?;
    Ok(len as u8)
}

/// Range-check a value against a field's maximum before packing.
pub fn check_width(value: u64, max: u64, field: &'static str) -> CodecResult<()> {
    if value > max {
        return Err(CodecError::FieldOverflow { field, value, max });
    }
    Ok(())
}

/// Decode raw bytes into two-digit hex strings, one per byte.
///
/// Used to interpret an opaque reply before structured extraction, and for
/// the datagram echo in the log.
pub fn to_hex_list(data: &[u8]) -> Vec<String> {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Space-separated hex dump of a byte sequence
pub fn hex_dump(data: &[u8]) -> String {
    to_hex_list(data).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_little_endian() {
        let mut buf = BytesMut::new();
        put_u8(&mut buf, 0xAB);
        put_u16(&mut buf, 0x1234);
        put_u32(&mut buf, 0xCAFECAFE);
        assert_eq!(&buf[..], &[0xAB, 0x34, 0x12, 0xFE, 0xCA, 0xFE, 0xCA]);
    }

    #[test]
    fn test_put_str_one_byte_per_char() {
        let mut buf = BytesMut::new();
        put_str(&mut buf, "Hi!").unwrap();
        assert_eq!(&buf[..], b"Hi!");
    }

    #[test]
    fn test_put_str_rejects_wide_chars() {
        let mut buf = BytesMut::new();
        let err = put_str(&mut buf, "caf\u{12E9}").unwrap_err();
        assert!(matches!(err, CodecError::WideChar { index: 3, .. }));
    }

    #[test]
    fn test_check_width_boundary() {
        assert!(check_width(255, 255, "addr").is_ok());
        assert!(check_width(256, 255, "addr").is_err());
    }

    #[test]
    fn test_hex_list() {
        assert_eq!(to_hex_list(&[0x01, 0xFF]), vec!["01", "ff"]);
        assert_eq!(hex_dump(&[0x01, 0xFF]), "01 ff");
    }
}
