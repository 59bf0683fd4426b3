//! Decoded field records.
//!
//! [`RawField`] is what a single-level segment decode produces. [`Field`] is
//! the tree form returned by [`decode`](crate::decode), where length-delimited
//! values that parse cleanly carry their nested fields in
//! [`Field::sub_fields`].

use crate::decoder::WireType;
use bytes::Bytes;
use std::ops::{Deref, Index};

/// A field value. The variant determines the wire type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    /// Varint-encoded integer
    Varint(u64),
    /// Exactly 8 bytes, in wire order
    Fixed64([u8; 8]),
    /// Length-delimited payload
    LengthDelimited(Bytes),
    /// Exactly 4 bytes, in wire order
    Fixed32([u8; 4]),
}

impl FieldValue {
    /// Returns the wire type this value was encoded with
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldValue::Varint(_) => WireType::Varint,
            FieldValue::Fixed64(_) => WireType::Fixed64,
            FieldValue::LengthDelimited(_) => WireType::LengthDelimited,
            FieldValue::Fixed32(_) => WireType::Fixed32,
        }
    }

    /// Returns the integer of a varint value
    pub fn as_varint(&self) -> Option<u64> {
        match self {
            FieldValue::Varint(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the raw bytes of a fixed-width or length-delimited value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Varint(_) => None,
            FieldValue::Fixed64(b) => Some(b.as_slice()),
            FieldValue::LengthDelimited(b) => Some(&b[..]),
            FieldValue::Fixed32(b) => Some(b.as_slice()),
        }
    }

    /// Returns the payload of a length-delimited value
    pub fn as_payload(&self) -> Option<&Bytes> {
        match self {
            FieldValue::LengthDelimited(b) => Some(b),
            _ => None,
        }
    }
}

/// A single field from a one-level segment decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    /// Field number (tag >> 3)
    pub field_number: u64,
    /// The decoded value
    pub value: FieldValue,
}

impl RawField {
    /// Creates a new raw field
    pub fn new(field_number: u64, value: FieldValue) -> Self {
        Self {
            field_number,
            value,
        }
    }

    /// Returns the wire type of the value
    pub fn wire_type(&self) -> WireType {
        self.value.wire_type()
    }
}

/// A decoded field with any nested structure that could be inferred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field number (tag >> 3)
    pub field_number: u64,
    /// The decoded value. Length-delimited payloads are always kept, even
    /// when `sub_fields` is populated.
    pub value: FieldValue,
    /// Nested fields, non-empty only when the length-delimited value decoded
    /// cleanly with no bytes left over
    pub sub_fields: FieldList,
}

impl Field {
    /// Creates a field with no nested structure
    pub fn new(field_number: u64, value: FieldValue) -> Self {
        Self {
            field_number,
            value,
            sub_fields: FieldList::new(),
        }
    }

    /// Returns the wire type of the value
    pub fn wire_type(&self) -> WireType {
        self.value.wire_type()
    }

    /// Returns true if this field was inferred to hold a nested message
    pub fn is_message(&self) -> bool {
        !self.sub_fields.is_empty()
    }

    /// Returns a length-delimited payload as UTF-8, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.value
            .as_payload()
            .and_then(|b| std::str::from_utf8(b).ok())
    }
}

impl From<RawField> for Field {
    fn from(raw: RawField) -> Self {
        Field::new(raw.field_number, raw.value)
    }
}

/// Ordered list of decoded fields.
///
/// Encounter order is preserved and repeated field numbers are kept as
/// separate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList(Vec<Field>);

impl FieldList {
    /// Creates an empty list
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a field
    pub fn push(&mut self, field: Field) {
        self.0.push(field);
    }

    /// Returns the first field with the given number
    pub fn get_field(&self, field_number: u64) -> Option<&Field> {
        self.0.iter().find(|f| f.field_number == field_number)
    }

    /// Returns every field with the given number, in encounter order
    pub fn get_fields(&self, field_number: u64) -> Vec<&Field> {
        self.0
            .iter()
            .filter(|f| f.field_number == field_number)
            .collect()
    }

    /// Consumes the list, returning the underlying vector
    pub fn into_vec(self) -> Vec<Field> {
        self.0
    }
}

impl Deref for FieldList {
    type Target = [Field];

    fn deref(&self) -> &[Field] {
        &self.0
    }
}

impl Index<usize> for FieldList {
    type Output = Field;

    fn index(&self, index: usize) -> &Field {
        &self.0[index]
    }
}

impl From<Vec<Field>> for FieldList {
    fn from(fields: Vec<Field>) -> Self {
        Self(fields)
    }
}

impl FromIterator<Field> for FieldList {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FieldList {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldList {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
