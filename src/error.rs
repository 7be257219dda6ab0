//! Error types for parsing, value access and serialization.
//!
//! Every failure the crate can report is a typed value carrying a stable
//! numeric code:
//!
//! | Code | Kind                 | Raised by                 |
//! |------|----------------------|---------------------------|
//! | 100  | lex error            | lexer                     |
//! | 101  | syntax error         | parser                    |
//! | 102  | depth exceeded       | parser                    |
//! | 103  | limit exceeded       | lexer, parser             |
//! | 200  | type mismatch        | [`Value`](crate::Value) accessors |
//! | 300  | unrepresentable value| serializer                |
//! | 400  | I/O error            | reader and writer adapters |
//!
//! Parse failures carry the byte offset of the first offending character
//! together with its 1-based line and column.

use std::borrow::Cow;
use std::fmt;
use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type JsonResult<T> = Result<T, Error>;

/// Category of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Malformed token: bad literal, bad escape, bad number, control
    /// character in a string, invalid UTF-8.
    Lex,
    /// Well-formed tokens in an order the grammar does not allow.
    Syntax,
    /// Arrays/objects nested deeper than [`Limits::max_depth`](crate::Limits).
    DepthExceeded,
    /// Input size, string length, member or element count over its limit.
    LimitExceeded,
}

impl ParseErrorKind {
    /// Numeric code for this kind.
    pub const fn code(self) -> u32 {
        match self {
            ParseErrorKind::Lex => 100,
            ParseErrorKind::Syntax => 101,
            ParseErrorKind::DepthExceeded => 102,
            ParseErrorKind::LimitExceeded => 103,
        }
    }

    /// Short lowercase name, used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            ParseErrorKind::Lex => "lex error",
            ParseErrorKind::Syntax => "syntax error",
            ParseErrorKind::DepthExceeded => "depth exceeded",
            ParseErrorKind::LimitExceeded => "limit exceeded",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A positioned parse failure.
///
/// Parsing stops at the first error, so a `ParseError` always describes the
/// earliest offending character of the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("{kind}: {message} at line {line}, column {column}")]
pub struct ParseError {
    kind: ParseErrorKind,
    message: Cow<'static, str>,
    offset: usize,
    line: usize,
    column: usize,
    snippet: String,
}

/// Longest snippet (in characters) copied into a [`ParseError`].
const SNIPPET_LEN: usize = 16;

impl ParseError {
    /// Build an error located at byte `offset` of `input`.
    ///
    /// The snippet is `snippet_len` bytes of input starting at `offset`,
    /// widened to a character boundary and capped at a few characters.
    pub(crate) fn new(
        kind: ParseErrorKind,
        message: impl Into<Cow<'static, str>>,
        input: &str,
        offset: usize,
        snippet_len: usize,
    ) -> Self {
        let offset = floor_char_boundary(input, offset.min(input.len()));
        let (line, column) = line_column(input, offset);
        let end = floor_char_boundary(input, offset.saturating_add(snippet_len).min(input.len()));
        let mut snippet: String = input[offset..end].chars().take(SNIPPET_LEN).collect();
        if snippet.is_empty() && snippet_len > 0 {
            // Zero-width request on a multi-byte char: show the whole char.
            snippet.extend(input[offset..].chars().next());
        }

        Self {
            kind,
            message: message.into(),
            offset,
            line,
            column,
            snippet,
        }
    }

    /// The error category.
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// Human-readable description, without position.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset of the offending character.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 1-based line of the offending character.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column, counted in characters.
    pub fn column(&self) -> usize {
        self.column
    }

    /// The offending character or token text. Empty at end of input.
    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    /// Numeric code of the error kind.
    pub fn code(&self) -> u32 {
        self.kind.code()
    }
}

/// Any error the crate reports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input text could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A typed accessor was called on a value of another type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The type the accessor asked for.
        expected: &'static str,
        /// The type actually stored.
        found: &'static str,
    },

    /// NaN and the infinities have no JSON representation.
    #[error("unrepresentable value: {0} has no JSON representation")]
    UnrepresentableValue(f64),

    /// Reading input or writing output failed.
    #[error("I/O error: {message}")]
    Io {
        /// Category of the underlying failure.
        kind: io::ErrorKind,
        /// Description of the underlying failure.
        message: String,
    },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Numeric error code.
    pub fn code(&self) -> u32 {
        match self {
            Error::Parse(e) => e.code(),
            Error::TypeMismatch { .. } => 200,
            Error::UnrepresentableValue(_) => 300,
            Error::Io { .. } => 400,
        }
    }

    /// The parse error, if this is one.
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// 1-based line and character column of byte `offset`.
///
/// Only `\n` starts a new line; a `\r\n` pair therefore counts once.
fn line_column(input: &str, offset: usize) -> (usize, usize) {
    let before = &input[..offset];
    let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

fn floor_char_boundary(input: &str, mut index: usize) -> usize {
    while !input.is_char_boundary(index) {
        index -= 1;
    }
    index
}
