//! JSON serialization.
//!
//! Writes a [`Value`] tree back to text. Object members come out in insertion
//! order, and numbers follow the policy described in [`crate::number`].
//! Output produced here always parses back to an equal value.
//!
//! Containers are walked with an explicit stack, so arbitrarily deep trees
//! serialize without growing the call stack.

use std::io;

use tracing::{debug, trace};

use crate::error::JsonResult;
use crate::number::Number;
use crate::value::Value;

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// No whitespace between tokens.
    #[default]
    Compact,
    /// One member or element per line, indented by `indent` spaces per level.
    Pretty {
        /// Spaces per nesting level.
        indent: usize,
    },
}

/// Serializer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SerializeOptions {
    /// Output layout.
    pub format: Format,
    /// Write every non-ASCII character as a `\uXXXX` escape.
    pub escape_non_ascii: bool,
}

impl SerializeOptions {
    /// Compact output, UTF-8 passed through.
    pub const fn compact() -> Self {
        Self {
            format: Format::Compact,
            escape_non_ascii: false,
        }
    }

    /// Pretty output with `indent` spaces per level.
    pub const fn pretty(indent: usize) -> Self {
        Self {
            format: Format::Pretty { indent },
            escape_non_ascii: false,
        }
    }

    /// Same options with non-ASCII escaping switched on or off.
    pub const fn with_escape_non_ascii(mut self, escape: bool) -> Self {
        self.escape_non_ascii = escape;
        self
    }
}

/// Serialize `value` to a new string.
pub fn serialize(value: &Value, options: SerializeOptions) -> JsonResult<String> {
    let mut out = String::new();
    serialize_into(value, options, &mut out)?;
    Ok(out)
}

/// Append the serialization of `value` to `out`.
///
/// On error `out` is restored to its original length.
pub fn serialize_into(value: &Value, options: SerializeOptions, out: &mut String) -> JsonResult<()> {
    trace!(kind = value.type_name(), ?options, "serializing value");
    let mark = out.len();
    let mut serializer = Serializer {
        out: &mut *out,
        options,
        depth: 0,
    };
    let result = serializer.serialize_value(value);
    if let Err(e) = &result {
        debug!(code = e.code(), error = %e, "serialization failed");
        out.truncate(mark);
    }
    result
}

/// Serialize `value` without whitespace.
pub fn to_string(value: &Value) -> JsonResult<String> {
    serialize(value, SerializeOptions::compact())
}

/// Serialize `value` with `indent` spaces per nesting level.
pub fn to_string_pretty(value: &Value, indent: usize) -> JsonResult<String> {
    serialize(value, SerializeOptions::pretty(indent))
}

/// Serialize `value` without whitespace into `writer`.
pub fn to_writer<W: io::Write>(writer: W, value: &Value) -> JsonResult<()> {
    to_writer_with_options(writer, value, SerializeOptions::compact())
}

/// Serialize `value` into `writer`.
///
/// The text is built in memory first, so nothing reaches `writer` when the
/// value cannot be serialized. Write failures are reported as
/// [`Error::Io`](crate::Error::Io).
pub fn to_writer_with_options<W: io::Write>(
    mut writer: W,
    value: &Value,
    options: SerializeOptions,
) -> JsonResult<()> {
    let text = serialize(value, options)?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// An array or object whose members are still being written.
enum Frame<'v> {
    Array {
        elements: std::slice::Iter<'v, Value>,
        started: bool,
    },
    Object {
        members: indexmap::map::Iter<'v, String, Value>,
        started: bool,
    },
}

struct Serializer<'o> {
    out: &'o mut String,
    options: SerializeOptions,
    depth: usize,
}

impl Serializer<'_> {
    fn serialize_value<'v>(&mut self, value: &'v Value) -> JsonResult<()> {
        let mut stack: Vec<Frame<'v>> = Vec::new();
        let mut next = Some(value);

        loop {
            if let Some(value) = next.take() {
                match value {
                    Value::Null => self.out.push_str("null"),
                    Value::Bool(true) => self.out.push_str("true"),
                    Value::Bool(false) => self.out.push_str("false"),
                    Value::Number(n) => self.serialize_number(n)?,
                    Value::String(s) => self.serialize_string(s),
                    Value::Array(arr) if arr.is_empty() => self.out.push_str("[]"),
                    Value::Object(obj) if obj.is_empty() => self.out.push_str("{}"),
                    Value::Array(arr) => {
                        self.out.push('[');
                        self.depth += 1;
                        stack.push(Frame::Array {
                            elements: arr.iter(),
                            started: false,
                        });
                    }
                    Value::Object(obj) => {
                        self.out.push('{');
                        self.depth += 1;
                        stack.push(Frame::Object {
                            members: obj.iter(),
                            started: false,
                        });
                    }
                }
            }

            let Some(frame) = stack.last_mut() else {
                return Ok(());
            };
            let (member, started, close) = match frame {
                Frame::Array { elements, started } => {
                    (elements.next().map(|v| (None, v)), started, ']')
                }
                Frame::Object { members, started } => {
                    (members.next().map(|(k, v)| (Some(k), v)), started, '}')
                }
            };

            match member {
                Some((key, value)) => {
                    if *started {
                        self.out.push(',');
                    }
                    *started = true;
                    self.newline();
                    if let Some(key) = key {
                        self.serialize_string(key);
                        self.out.push(':');
                        if self.is_pretty() {
                            self.out.push(' ');
                        }
                    }
                    next = Some(value);
                }
                None => {
                    stack.pop();
                    self.depth -= 1;
                    self.newline();
                    self.out.push(close);
                }
            }
        }
    }

    fn serialize_number(&mut self, number: &Number) -> JsonResult<()> {
        number.write_json(self.out)
    }

    /// Serialize a string with proper JSON escaping.
    fn serialize_string(&mut self, s: &str) {
        let escape_non_ascii = self.options.escape_non_ascii;
        let out = &mut *self.out;
        out.push('"');

        // Copy unescaped runs in one go
        let mut run_start = 0;
        for (i, ch) in s.char_indices() {
            let needs_escape =
                ch < '\x20' || ch == '"' || ch == '\\' || (escape_non_ascii && !ch.is_ascii());
            if !needs_escape {
                continue;
            }
            out.push_str(&s[run_start..i]);
            run_start = i + ch.len_utf8();

            match ch {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\x08' => out.push_str("\\b"),
                '\x0C' => out.push_str("\\f"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c => {
                    // Other controls as \u00XX, non-ASCII as UTF-16 units
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units).iter() {
                        push_unicode_escape(out, *unit);
                    }
                }
            }
        }
        out.push_str(&s[run_start..]);
        out.push('"');
    }

    fn is_pretty(&self) -> bool {
        matches!(self.options.format, Format::Pretty { .. })
    }

    /// Line break plus indentation, pretty format only.
    fn newline(&mut self) {
        if let Format::Pretty { indent } = self.options.format {
            self.out.push('\n');
            self.out
                .extend(std::iter::repeat(' ').take(indent.saturating_mul(self.depth)));
        }
    }
}

fn push_unicode_escape(out: &mut String, unit: u16) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    out.push_str("\\u");
    for shift in [12, 8, 4, 0] {
        out.push(char::from(HEX[usize::from((unit >> shift) & 0xF)]));
    }
}
