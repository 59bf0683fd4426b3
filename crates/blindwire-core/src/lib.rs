//! # blindwire-core
//!
//! A library for decoding protobuf wire format data without a schema.
//!
//! This crate provides the core functionality for:
//! - Decoding varints and tag/value pairs from raw bytes
//! - Skipping an optional gRPC-style framing header
//! - Recovering a best-effort field tree, guessing which length-delimited
//!   payloads are nested messages
//! - Rendering decoded trees as text
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`decoder`]: Varint codec, read cursor and field decoding
//! - [`field`]: Decoded field records
//! - [`render`]: Text rendering and tree traversal
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use blindwire_core::{Decoder, DecoderConfig, TreeRenderer};
//!
//! let decoder = Decoder::with_config(DecoderConfig::new().max_depth(16));
//! let report = decoder.decode_report(&b"\x08\x96\x01\x1A\x03\x08\x96\x01\xFF"[..]);
//!
//! print!("{}", TreeRenderer::new(&report.fields).render());
//! assert_eq!(report.fields.len(), 2);
//! assert!(report.fields[1].is_message());
//! assert_eq!(&report.leftover[..], b"\xFF");
//! ```
//!
//! Decoding never fails. Input that stops making sense ends up in the
//! leftover bytes instead of an error.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod decoder;
pub mod error;
pub mod field;
pub mod render;

// Re-export primary types for convenience
pub use decoder::{
    decode, decode_file, decode_file_with_config, decode_segment, infer_structure, read_varint,
    DecodeReport, Decoder, DecoderConfig, Segment, WireType,
};
pub use error::{Error, Result};
pub use field::{Field, FieldList, FieldValue, RawField};
pub use render::{RenderConfig, StatsVisitor, TreeRenderer};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
