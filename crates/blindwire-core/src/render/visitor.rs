//! Extensible field tree traversal.
//!
//! This module provides the [`FieldVisitor`] trait for walking a decoded
//! tree without writing the recursion by hand.

use crate::decoder::WireType;
use crate::field::{Field, FieldList};

/// Trait for visiting the fields of a decoded tree.
///
/// All methods default to doing nothing. `depth` is 0 for top-level fields.
///
/// # Example
///
/// ```
/// use blindwire_core::decode;
/// use blindwire_core::render::{walk, FieldVisitor};
/// use blindwire_core::Field;
///
/// struct Numbers(Vec<u64>);
///
/// impl FieldVisitor for Numbers {
///     fn visit_field(&mut self, field: &Field, _depth: usize) {
///         self.0.push(field.field_number);
///     }
/// }
///
/// let mut numbers = Numbers(Vec::new());
/// walk(&decode(b"\x0A\x02\x10\x01"), &mut numbers);
/// assert_eq!(numbers.0, vec![1, 2]);
/// ```
pub trait FieldVisitor {
    /// Called for every field, before its nested fields are visited
    fn visit_field(&mut self, field: &Field, depth: usize) {
        let _ = (field, depth);
    }

    /// Called before the nested fields of a message field
    fn enter_message(&mut self, field: &Field, depth: usize) {
        let _ = (field, depth);
    }

    /// Called after the nested fields of a message field
    fn leave_message(&mut self, field: &Field, depth: usize) {
        let _ = (field, depth);
    }
}

/// Visits every field of `fields` depth-first, in encounter order
pub fn walk<V: FieldVisitor + ?Sized>(fields: &FieldList, visitor: &mut V) {
    walk_at(fields, visitor, 0);
}

fn walk_at<V: FieldVisitor + ?Sized>(fields: &FieldList, visitor: &mut V, depth: usize) {
    for field in fields {
        visitor.visit_field(field, depth);
        if field.is_message() {
            visitor.enter_message(field, depth);
            walk_at(&field.sub_fields, visitor, depth + 1);
            visitor.leave_message(field, depth);
        }
    }
}

/// A no-op visitor
pub struct NullVisitor;

impl FieldVisitor for NullVisitor {}

/// A visitor that collects statistics about a decoded tree
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsVisitor {
    /// Number of fields at any depth
    pub field_count: usize,
    /// Number of varint fields
    pub varint_count: usize,
    /// Number of 32-bit fixed fields
    pub fixed32_count: usize,
    /// Number of 64-bit fixed fields
    pub fixed64_count: usize,
    /// Number of length-delimited fields, messages included
    pub length_delimited_count: usize,
    /// Number of length-delimited fields inferred to be messages
    pub message_count: usize,
    /// Deepest nesting level reached (0 = no nested messages)
    pub max_depth: usize,
}

impl StatsVisitor {
    /// Walks `fields` and returns the collected statistics
    pub fn collect(fields: &FieldList) -> Self {
        let mut stats = Self::default();
        walk(fields, &mut stats);
        stats
    }
}

impl FieldVisitor for StatsVisitor {
    fn visit_field(&mut self, field: &Field, depth: usize) {
        self.field_count += 1;
        self.max_depth = self.max_depth.max(depth);
        match field.wire_type() {
            WireType::Varint => self.varint_count += 1,
            WireType::Fixed32 => self.fixed32_count += 1,
            WireType::Fixed64 => self.fixed64_count += 1,
            WireType::LengthDelimited => self.length_delimited_count += 1,
        }
    }

    fn enter_message(&mut self, _field: &Field, _depth: usize) {
        self.message_count += 1;
    }
}
