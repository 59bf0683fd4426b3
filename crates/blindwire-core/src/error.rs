//! Error types for the blindwire-core library.
//!
//! Decoding itself is best-effort and never fails: the variants below that
//! describe malformed input are recovered from inside the field decoder.
//! They only reach callers through the strict, low-level entry points.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for blindwire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all blindwire operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A read asked for more bytes than the buffer has left
    #[error("buffer overflow at offset {offset}: requested {requested} byte(s), {available} available")]
    Overflow {
        /// Byte offset where the read started
        offset: usize,
        /// Number of bytes the read needed
        requested: usize,
        /// Number of bytes left in the buffer
        available: usize,
    },

    /// A varint carried set bits past the 64th
    #[error("varint at offset {offset} does not fit in 64 bits")]
    VarintTooWide {
        /// Byte offset where the varint started
        offset: usize,
    },

    /// A length-delimited field declared more bytes than the buffer has left
    #[error("declared length {length} at offset {offset} exceeds the {available} byte(s) left")]
    LengthOverflow {
        /// Byte offset where the payload would start
        offset: usize,
        /// Length as declared on the wire
        length: u64,
        /// Number of bytes left in the buffer
        available: usize,
    },

    /// A tag carried a wire type code that is not recognized
    #[error("unknown wire type {code} at offset {offset}")]
    UnknownWireType {
        /// Byte offset of the tag
        offset: usize,
        /// The 3-bit wire type code
        code: u8,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Creates a new overflow error
    pub fn overflow(offset: usize, requested: usize, available: usize) -> Self {
        Self::Overflow {
            offset,
            requested,
            available,
        }
    }

    /// Creates a new varint width error
    pub fn varint_too_wide(offset: usize) -> Self {
        Self::VarintTooWide { offset }
    }

    /// Creates a new declared length overflow error
    pub fn length_overflow(offset: usize, length: u64, available: usize) -> Self {
        Self::LengthOverflow {
            offset,
            length,
            available,
        }
    }

    /// Creates a new unknown wire type error
    pub fn unknown_wire_type(offset: usize, code: u8) -> Self {
        Self::UnknownWireType { offset, code }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the segment decoder stops and rolls back on this error
    /// instead of surfacing it
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Overflow { .. }
                | Self::VarintTooWide { .. }
                | Self::LengthOverflow { .. }
                | Self::UnknownWireType { .. }
        )
    }
}
