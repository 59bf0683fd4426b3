//! Text rendering of decoded field trees.
//!
//! [`TreeRenderer`] prints one line per field, with nested messages in
//! braces:
//!
//! ```text
//! 1: 150
//! 3: {
//!   1: "testing"
//! }
//! 4: i32 0x4020aaab
//! 5: bytes ff00
//! ```
//!
//! Fixed-width values are shown as little-endian hex integers. For anything
//! else, walk the tree with a [`FieldVisitor`].

mod visitor;

use crate::field::{Field, FieldList, FieldValue};
use std::fmt::Write as FmtWrite;

pub use visitor::{walk, FieldVisitor, NullVisitor, StatsVisitor};

/// Configuration for tree rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Indentation string (default: 2 spaces)
    pub indent_str: String,
    /// Maximum number of payload bytes shown before truncating (0 = no limit)
    pub max_bytes: usize,
    /// Show printable UTF-8 payloads as quoted strings
    pub detect_strings: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent_str: "  ".to_string(),
            max_bytes: 64,
            detect_strings: true,
        }
    }
}

impl RenderConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Sets the payload preview limit
    pub fn max_bytes(mut self, max: usize) -> Self {
        self.max_bytes = max;
        self
    }

    /// Sets whether printable payloads are shown as strings
    pub fn detect_strings(mut self, detect: bool) -> Self {
        self.detect_strings = detect;
        self
    }
}

/// Renders a [`FieldList`] as indented text
#[derive(Debug)]
pub struct TreeRenderer<'a> {
    fields: &'a FieldList,
    config: RenderConfig,
}

impl<'a> TreeRenderer<'a> {
    /// Creates a renderer with default configuration
    pub fn new(fields: &'a FieldList) -> Self {
        Self {
            fields,
            config: RenderConfig::default(),
        }
    }

    /// Creates a new renderer with custom config
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Render the tree as a string
    pub fn render(&self) -> String {
        let mut output = String::new();
        self.write_to(&mut output).expect("String write cannot fail");
        output
    }

    /// Write the rendered tree to a writer
    pub fn write_to(&self, w: &mut impl FmtWrite) -> std::fmt::Result {
        let mut writer = TextWriter::new(w, &self.config);
        writer.write_fields(self.fields)
    }
}

struct TextWriter<'a, W: FmtWrite> {
    writer: &'a mut W,
    config: &'a RenderConfig,
    indent_level: usize,
}

impl<'a, W: FmtWrite> TextWriter<'a, W> {
    fn new(writer: &'a mut W, config: &'a RenderConfig) -> Self {
        Self {
            writer,
            config,
            indent_level: 0,
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) -> std::fmt::Result {
        for _ in 0..self.indent_level {
            write!(self.writer, "{}", self.config.indent_str)?;
        }
        Ok(())
    }

    fn writeln(&mut self, s: &str) -> std::fmt::Result {
        self.write_indent()?;
        writeln!(self.writer, "{}", s)
    }

    fn write_fields(&mut self, fields: &FieldList) -> std::fmt::Result {
        for field in fields {
            self.write_field(field)?;
        }
        Ok(())
    }

    fn write_field(&mut self, field: &Field) -> std::fmt::Result {
        let n = field.field_number;

        if field.is_message() {
            self.writeln(&format!("{}: {{", n))?;
            self.indent();
            self.write_fields(&field.sub_fields)?;
            self.dedent();
            return self.writeln("}");
        }

        let line = match &field.value {
            FieldValue::Varint(v) => format!("{}: {}", n, v),
            FieldValue::Fixed32(b) => format!("{}: i32 0x{:08x}", n, u32::from_le_bytes(*b)),
            FieldValue::Fixed64(b) => format!("{}: i64 0x{:016x}", n, u64::from_le_bytes(*b)),
            FieldValue::LengthDelimited(payload) => {
                match field.as_str().filter(|s| self.config.detect_strings && is_printable(s)) {
                    Some(s) => format!("{}: \"{}\"", n, escape_string(s)),
                    None => format!("{}: bytes {}", n, hex_preview(payload, self.config.max_bytes)),
                }
            }
        };
        self.writeln(&line)
    }
}

/// Lowercase hex of `bytes`, truncated after `max` bytes (0 = no limit)
pub fn hex_preview(bytes: &[u8], max: usize) -> String {
    let shown = if max == 0 { bytes.len() } else { bytes.len().min(max) };
    let hex = hex::encode(&bytes[..shown]);
    if shown < bytes.len() {
        format!("{}... ({} bytes)", hex, bytes.len())
    } else {
        hex
    }
}

fn is_printable(s: &str) -> bool {
    s.chars()
        .all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
}

/// Escape a string for quoted output
fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_flat() {
        let fields = decode(b"\x08\x96\x01\x12\x07testing\x1D\xAB\xAA\x20\x40");
        assert_eq!(
            TreeRenderer::new(&fields).render(),
            "1: 150\n2: \"testing\"\n3: i32 0x4020aaab\n"
        );
    }

    #[test]
    fn test_render_nested() {
        let fields = decode(b"\x1A\x0C\x08\x96\x01\x12\x07testing\x21\x01\x00\x00\x00\x00\x00\x00\x00");
        let expected = "3: {\n  1: 150\n  2: \"testing\"\n}\n4: i64 0x0000000000000001\n";
        assert_eq!(TreeRenderer::new(&fields).render(), expected);
    }

    #[test]
    fn test_render_custom_indent() {
        let fields = decode(b"\x0A\x02\x08\x01");
        let config = RenderConfig::new().indent_str("\t");
        assert_eq!(
            TreeRenderer::new(&fields).with_config(config).render(),
            "1: {\n\t1: 1\n}\n"
        );
    }

    #[test]
    fn test_render_binary_payload() {
        let fields = decode(b"\x0A\x03\xFF\x00\x80");
        assert_eq!(TreeRenderer::new(&fields).render(), "1: bytes ff0080\n");

        let config = RenderConfig::new().max_bytes(2);
        assert_eq!(
            TreeRenderer::new(&fields).with_config(config).render(),
            "1: bytes ff00... (3 bytes)\n"
        );
    }

    #[test]
    fn test_render_strings_disabled() {
        let fields = decode(b"\x12\x02ok");
        let config = RenderConfig::new().detect_strings(false);
        assert_eq!(
            TreeRenderer::new(&fields).with_config(config).render(),
            "2: bytes 6f6b\n"
        );
    }

    #[test]
    fn test_render_empty_payload() {
        let fields = decode(b"\x0A\x00");
        assert_eq!(TreeRenderer::new(&fields).render(), "1: \"\"\n");
    }

    #[test]
    fn test_hex_preview() {
        assert_eq!(hex_preview(b"", 4), "");
        assert_eq!(hex_preview(b"\x01\x02", 0), "0102");
        assert_eq!(hex_preview(b"\x01\x02\x03", 1), "01... (3 bytes)");
        assert_eq!(hex_preview(b"\xAB\xCD", 2), "abcd");
        assert_eq!(hex_preview(&[0xFE; 3], 8), "fefefe");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("hello"), "hello");
        assert_eq!(escape_string("hello\\world"), "hello\\\\world");
        assert_eq!(escape_string("hello\"world"), "hello\\\"world");
        assert_eq!(escape_string("hello\nworld"), "hello\\nworld");
    }
}
