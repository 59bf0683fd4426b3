//! Optional transport framing header.
//!
//! Some transports (gRPC being the common one) prefix each message with a
//! 5-byte header: a flag byte followed by the big-endian payload length.

use super::cursor::ByteCursor;
use tracing::trace;

/// Size of the framing header in bytes
pub const FRAME_HEADER_LEN: usize = 5;

/// A framing header found in front of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// The flag byte (always zero for a detected header)
    pub flag: u8,
    /// The payload length declared by the header
    pub length: u32,
}

/// Skips a framing header at the cursor position if one is plausibly present.
///
/// A header is only accepted when the current byte is `0x00`, at least
/// [`FRAME_HEADER_LEN`] bytes remain, and the declared length fits in what
/// follows the header. Otherwise the leading zero is treated as payload and
/// the cursor is left where it was.
pub fn maybe_skip_frame_header(cursor: &mut ByteCursor) -> Option<FrameHeader> {
    if cursor.is_empty() || cursor.peek() != Some(0x00) || cursor.bytes_left() < FRAME_HEADER_LEN {
        return None;
    }

    cursor.set_checkpoint();
    let header = cursor.read_array::<FRAME_HEADER_LEN>().ok()?;
    let length = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);

    if length as usize > cursor.bytes_left() {
        trace!(
            "Rejected frame header: declares {} bytes, {} remain",
            length,
            cursor.bytes_left()
        );
        cursor.rollback();
        return None;
    }

    trace!("Skipped frame header declaring {} bytes", length);
    Some(FrameHeader {
        flag: header[0],
        length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_empty_frame() {
        let mut cursor = ByteCursor::new(&b"\x00\x00\x00\x00\x00"[..]);
        let header = maybe_skip_frame_header(&mut cursor).unwrap();
        assert_eq!(header.length, 0);
        assert_eq!(cursor.bytes_left(), 0);
    }

    #[test]
    fn test_skips_frame_with_payload() {
        let mut cursor = ByteCursor::new(&b"\x00\x00\x00\x00\x03\x08\x96\x01"[..]);
        let header = maybe_skip_frame_header(&mut cursor).unwrap();
        assert_eq!(header, FrameHeader { flag: 0, length: 3 });
        assert_eq!(cursor.position(), FRAME_HEADER_LEN);
    }

    #[test]
    fn test_shorter_declared_length_is_accepted() {
        let mut cursor = ByteCursor::new(&b"\x00\x00\x00\x00\x01\x08\x96\x01"[..]);
        assert!(maybe_skip_frame_header(&mut cursor).is_some());
        assert_eq!(cursor.bytes_left(), 3);
    }

    #[test]
    fn test_declared_length_too_large() {
        let mut cursor = ByteCursor::new(&b"\x00\x00\x00\x00\x09\x08\x96\x01"[..]);
        assert!(maybe_skip_frame_header(&mut cursor).is_none());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_no_leading_zero() {
        let mut cursor = ByteCursor::new(&b"\x08\x96\x01\x00\x00"[..]);
        assert!(maybe_skip_frame_header(&mut cursor).is_none());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_too_short() {
        let mut cursor = ByteCursor::new(&b"\x00\x00\x00\x00"[..]);
        assert!(maybe_skip_frame_header(&mut cursor).is_none());

        let mut cursor = ByteCursor::new(&b""[..]);
        assert!(maybe_skip_frame_header(&mut cursor).is_none());
    }
}
