//! JSON tokenizer, parser and serializer.
//!
//! Text goes in through [`parse`], comes out as a [`Value`] tree, and goes
//! back to text through [`serialize`]. Along the way:
//!
//! - object members keep their insertion order;
//! - parsed numbers keep their exact source text, so `1.0`, `1E5` and
//!   integers beyond 2^53 come back out unchanged;
//! - every parse failure carries an offset, line, column and snippet;
//! - [`from_reader`] and [`to_writer`] work over any `Read` or `Write`.
//!
//! ```
//! let value = json::parse(r#"{"a": 1.0, "b": [true, null]}"#)?;
//! assert_eq!(json::to_string(&value)?, r#"{"a":1.0,"b":[true,null]}"#);
//! # Ok::<(), json::Error>(())
//! ```
//!
//! # Architecture
//!
//! - [`lexer`] - lazy tokenizer with byte spans
//! - [`parser`] - stack-based parser with depth and size limits
//! - [`value`] - the value tree
//! - [`number`] - number storage and formatting
//! - [`serializer`] - compact and pretty output
//! - [`limits`] - parse-time resource bounds
//! - [`error`] - error types and numeric codes

// Library code propagates errors instead of panicking.
// Tests are checked separately with `cargo test`.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod error;
pub mod lexer;
pub mod limits;
pub mod number;
pub mod parser;
pub mod serializer;
pub mod value;

// Re-export commonly used types
pub use error::{Error, JsonResult, ParseError, ParseErrorKind};
pub use limits::Limits;
pub use number::Number;
pub use parser::{
    from_reader, from_reader_with_limits, from_slice, from_slice_with_limits, parse,
    parse_with_limits,
};
pub use serializer::{
    serialize, serialize_into, to_string, to_string_pretty, to_writer, to_writer_with_options,
    Format, SerializeOptions,
};
pub use value::{Map, Value};
