//! Low-level protobuf wire format primitives.
//!
//! ## Wire Format Overview
//!
//! Each protobuf field is encoded as:
//! - A varint "tag" containing the field number and wire type
//! - The field data (format depends on wire type)
//!
//! Wire types:
//! - 0: VARINT (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages, packed repeated fields)
//! - 5: I32 (fixed32, sfixed32, float)
//!
//! The deprecated group markers (3 and 4) are treated as unknown.

use crate::error::{Error, Result};
use std::fmt;

/// Protobuf wire types understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    Fixed64 = 1,
    /// Length-delimited (strings, bytes, embedded messages)
    LengthDelimited = 2,
    /// 32-bit fixed-width
    Fixed32 = 5,
}

impl WireType {
    /// Extracts the wire type from the low 3 bits of a tag.
    ///
    /// `offset` is only used to locate the tag in the returned error.
    pub fn from_tag(tag: u64, offset: usize) -> Result<Self> {
        let code = (tag & 0b111) as u8;
        Self::try_from(code).map_err(|_| Error::unknown_wire_type(offset, code))
    }

    /// Returns the short lowercase name used in rendered output
    pub fn as_str(&self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "i64",
            WireType::LengthDelimited => "len",
            WireType::Fixed32 => "i32",
        }
    }
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            _ => Err(Error::unknown_wire_type(0, value)),
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode a varint from `buffer` starting at `offset`.
///
/// Returns the decoded value and the number of bytes consumed. The number of
/// 7-bit groups is not capped, so zero padding past the 64th bit is accepted.
///
/// Fails with [`Error::VarintTooWide`] as soon as a group carries a set bit
/// that does not fit in a `u64`, and with [`Error::Overflow`] if the buffer
/// ends before a byte with the continuation bit clear.
pub fn read_varint(buffer: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in buffer.iter().skip(offset).enumerate() {
        let group = u64::from(byte & 0x7F);
        if shift < u64::BITS {
            let bits = group << shift;
            if bits >> shift != group {
                return Err(Error::varint_too_wide(offset));
            }
            result |= bits;
        } else if group != 0 {
            return Err(Error::varint_too_wide(offset));
        }
        shift = shift.saturating_add(7);

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    let available = buffer.len().saturating_sub(offset);
    Err(Error::overflow(offset, available + 1, available))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_varint_single_byte() {
        let (value, len) = read_varint(&[0x08], 0).unwrap();
        assert_eq!(value, 8);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_read_varint_multi_byte() {
        assert_eq!(read_varint(&[0xAC, 0x02], 0).unwrap(), (300, 2));
    }

    #[test]
    fn test_read_varint_with_offset() {
        assert_eq!(read_varint(&[0xAC, 0x02], 1).unwrap(), (2, 1));
    }

    #[test]
    fn test_read_varint_unterminated() {
        let err = read_varint(&[0xAC, 0xAC], 1).unwrap_err();
        assert!(matches!(err, Error::Overflow { offset: 1, .. }));
    }

    #[test]
    fn test_read_varint_empty_and_past_end() {
        assert!(matches!(read_varint(&[], 0), Err(Error::Overflow { .. })));
        assert!(matches!(read_varint(&[0x01], 5), Err(Error::Overflow { .. })));
    }

    #[test]
    fn test_read_varint_max() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        assert_eq!(read_varint(&data, 0).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn test_read_varint_zero_padded_past_64_bits() {
        // 12 groups, everything past the 64th bit is zero
        let data = [
            0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00,
        ];
        assert_eq!(read_varint(&data, 0).unwrap(), (1, 12));
    }

    #[test]
    fn test_read_varint_too_wide() {
        // 10th group carries 7 bits where only bit 63 fits
        let data = [0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        let err = read_varint(&data, 1).unwrap_err();
        assert!(matches!(err, Error::VarintTooWide { offset: 1 }));

        // a set bit in the 12th group
        let data = [
            0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01,
        ];
        assert!(matches!(read_varint(&data, 0), Err(Error::VarintTooWide { offset: 0 })));

        // the 10th group may still set bit 63
        let data = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert_eq!(read_varint(&data, 0).unwrap(), (1u64 << 63, 10));
    }

    #[test]
    fn test_wire_type_conversion() {
        assert_eq!(WireType::try_from(0).unwrap(), WireType::Varint);
        assert_eq!(WireType::try_from(1).unwrap(), WireType::Fixed64);
        assert_eq!(WireType::try_from(2).unwrap(), WireType::LengthDelimited);
        assert_eq!(WireType::try_from(5).unwrap(), WireType::Fixed32);
        for code in [3, 4, 6, 7] {
            assert!(WireType::try_from(code).is_err());
        }
    }

    #[test]
    fn test_wire_type_from_tag() {
        assert_eq!(WireType::from_tag(0x12, 0).unwrap(), WireType::LengthDelimited);
        let err = WireType::from_tag(0x0F, 4).unwrap_err();
        assert!(matches!(err, Error::UnknownWireType { offset: 4, code: 7 }));
    }
}
