//! Schema-less decoding of protobuf wire format data.
//!
//! ## Algorithm Overview
//!
//! 1. Skip an optional 5-byte framing header (top level only)
//! 2. Read tag/value pairs until the buffer is exhausted or a read fails
//! 3. On failure, roll back to the start of the failing field and return
//!    everything from there as leftover bytes
//! 4. Re-run step 2 over every non-empty length-delimited payload; a payload
//!    that is consumed completely becomes a nested message
//!
//! Step 4 is a heuristic. A string or blob that happens to be a valid field
//! sequence is reported as a nested message.
//!
//! ## Example
//!
//! ```
//! use blindwire_core::{decode, FieldValue};
//!
//! let fields = decode(b"\x08\x96\x01\x12\x07testing");
//! assert_eq!(fields[0].value, FieldValue::Varint(150));
//! assert_eq!(fields[1].as_str(), Some("testing"));
//! ```

mod cursor;
mod frame;
mod wire;

use crate::error::{Error, Result};
use crate::field::{Field, FieldList, FieldValue, RawField};
use bytes::Bytes;
use tracing::{debug, trace};

pub use cursor::{ByteCursor, Checkpoint};
pub use frame::{maybe_skip_frame_header, FrameHeader, FRAME_HEADER_LEN};
pub use wire::{read_varint, WireType};

/// Default limit on how many levels of nested messages are inferred
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration for the decoder
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Skip a leading framing header when one is detected
    pub skip_frame_header: bool,
    /// Maximum nesting depth for structure inference. Payloads below this
    /// depth are left as opaque bytes. Zero disables inference.
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            skip_frame_header: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecoderConfig {
    /// Creates a new decoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether a leading framing header is skipped
    pub fn skip_frame_header(mut self, skip: bool) -> Self {
        self.skip_frame_header = skip;
        self
    }

    /// Sets the maximum nesting depth for structure inference
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Result of a single-level decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Fields decoded before the first failure, in encounter order
    pub fields: Vec<RawField>,
    /// Bytes from the first undecodable field to the end of the buffer
    pub leftover: Bytes,
}

impl Segment {
    /// Splits the segment into its fields and leftover bytes
    pub fn into_parts(self) -> (Vec<RawField>, Bytes) {
        (self.fields, self.leftover)
    }

    /// Returns true if the whole buffer was decoded
    pub fn is_complete(&self) -> bool {
        self.leftover.is_empty()
    }
}

/// Everything a top-level decode found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    /// The framing header that was skipped, if any
    pub frame_header: Option<FrameHeader>,
    /// Decoded field tree
    pub fields: FieldList,
    /// Top-level bytes that could not be decoded
    pub leftover: Bytes,
}

/// Schema-less wire format decoder
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Creates a new decoder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new decoder with custom configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes `buffer` into a field tree. Undecodable trailing bytes are
    /// dropped; use [`decode_report`](Self::decode_report) to keep them.
    pub fn decode(&self, buffer: impl Into<Bytes>) -> FieldList {
        self.decode_report(buffer).fields
    }

    /// Decodes one level of `buffer` without structure inference
    pub fn decode_segment(&self, buffer: impl Into<Bytes>) -> Segment {
        let mut cursor = ByteCursor::new(buffer);
        self.skip_frame_header(&mut cursor);
        let (fields, leftover) = decode_fields(&mut cursor);
        Segment { fields, leftover }
    }

    /// Decodes `buffer` into a field tree and reports the framing header and
    /// leftover bytes alongside it
    pub fn decode_report(&self, buffer: impl Into<Bytes>) -> DecodeReport {
        let mut cursor = ByteCursor::new(buffer);
        debug!("Decoding {} bytes", cursor.len());

        let frame_header = self.skip_frame_header(&mut cursor);
        let (raw, leftover) = decode_fields(&mut cursor);
        let fields = self.infer_structure(raw, 0);

        debug!(
            "Decoded {} top-level field(s), {} byte(s) left over",
            fields.len(),
            leftover.len()
        );

        DecodeReport {
            frame_header,
            fields,
            leftover,
        }
    }

    /// Converts flat fields into a tree, inferring nested messages in
    /// length-delimited payloads. `depth` is the nesting level of `fields`.
    pub fn infer_structure(&self, fields: Vec<RawField>, depth: usize) -> FieldList {
        fields
            .into_iter()
            .map(|raw| {
                let mut field = Field::from(raw);
                if let Some(sub_fields) = self.infer_nested(&field.value, depth) {
                    field.sub_fields = sub_fields;
                }
                field
            })
            .collect()
    }

    fn infer_nested(&self, value: &FieldValue, depth: usize) -> Option<FieldList> {
        let payload = value.as_payload().filter(|p| !p.is_empty())?;

        if depth >= self.config.max_depth {
            trace!(
                "Depth limit {} reached, keeping {} byte payload opaque",
                self.config.max_depth,
                payload.len()
            );
            return None;
        }

        let mut cursor = ByteCursor::new(payload.clone());
        let (fields, leftover) = decode_fields(&mut cursor);
        if !leftover.is_empty() || fields.is_empty() {
            return None;
        }

        trace!(
            "Inferred nested message with {} field(s) at depth {}",
            fields.len(),
            depth + 1
        );
        Some(self.infer_structure(fields, depth + 1))
    }

    fn skip_frame_header(&self, cursor: &mut ByteCursor) -> Option<FrameHeader> {
        if self.config.skip_frame_header {
            maybe_skip_frame_header(cursor)
        } else {
            None
        }
    }
}

/// Reads fields from the cursor until it is exhausted or a field fails to
/// decode.
///
/// A failing field is rolled back completely, so the returned leftover
/// starts at its tag. No attempt is made to resynchronize past it.
pub fn decode_fields(cursor: &mut ByteCursor) -> (Vec<RawField>, Bytes) {
    let mut fields = Vec::new();

    while cursor.bytes_left() > 0 {
        let checkpoint = cursor.set_checkpoint();
        match read_field(cursor) {
            Ok(field) => fields.push(field),
            Err(e) => {
                trace!("Stopped decoding at offset {}: {}", checkpoint.position(), e);
                cursor.rollback();
                break;
            }
        }
    }

    (fields, cursor.remaining())
}

/// Reads a single tag/value pair
fn read_field(cursor: &mut ByteCursor) -> Result<RawField> {
    let offset = cursor.position();
    let tag = cursor.read_varint()?;
    let wire_type = WireType::from_tag(tag, offset)?;

    let value = match wire_type {
        WireType::Varint => FieldValue::Varint(cursor.read_varint()?),
        WireType::LengthDelimited => {
            let length = cursor.read_varint()?;
            let available = cursor.bytes_left();
            match usize::try_from(length) {
                Ok(n) if n <= available => FieldValue::LengthDelimited(cursor.read_exact(n)?),
                _ => return Err(Error::length_overflow(cursor.position(), length, available)),
            }
        }
        WireType::Fixed32 => FieldValue::Fixed32(cursor.read_array()?),
        WireType::Fixed64 => FieldValue::Fixed64(cursor.read_array()?),
    };

    Ok(RawField::new(tag >> 3, value))
}

/// Decodes `buffer` into a field tree using the default configuration
pub fn decode(buffer: &[u8]) -> FieldList {
    Decoder::new().decode(Bytes::copy_from_slice(buffer))
}

/// Decodes one level of `buffer` using the default configuration
pub fn decode_segment(buffer: &[u8]) -> Segment {
    Decoder::new().decode_segment(Bytes::copy_from_slice(buffer))
}

/// Converts flat fields into a tree using the default configuration
pub fn infer_structure(fields: Vec<RawField>) -> FieldList {
    Decoder::new().infer_structure(fields, 0)
}

/// Read a file and decode it
///
/// This is a convenience function that reads the file and decodes it.
pub fn decode_file(path: impl AsRef<std::path::Path>) -> Result<FieldList> {
    decode_file_with_config(path, DecoderConfig::default())
}

/// Read a file and decode it with custom configuration
pub fn decode_file_with_config(
    path: impl AsRef<std::path::Path>,
    config: DecoderConfig,
) -> Result<FieldList> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    Ok(Decoder::with_config(config).decode(data))
}
