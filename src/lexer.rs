//! JSON lexer/tokenizer.
//!
//! Converts input text into tokens, one per [`Lexer::next_token`] call. The
//! scan is strictly forward: every byte is inspected once and no token is ever
//! re-read, so lexing is linear in the input length.
//!
//! Strings without escape sequences are returned as slices of the input;
//! only strings containing escapes allocate.

use std::borrow::Cow;
use std::fmt;

use crate::error::{ParseError, ParseErrorKind};
use crate::limits::Limits;

/// Byte range of a token in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Offset of the first byte.
    pub start: usize,
    /// Offset one past the last byte.
    pub end: usize,
}

impl Span {
    /// Create a span from `start` to `end`.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes.
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for the zero-width end-of-input span.
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// Left brace `{`
    LeftBrace,
    /// Right brace `}`
    RightBrace,
    /// Left bracket `[`
    LeftBracket,
    /// Right bracket `]`
    RightBracket,
    /// Colon `:`
    Colon,
    /// Comma `,`
    Comma,
    /// Null literal
    Null,
    /// True literal
    True,
    /// False literal
    False,
    /// String value with escapes decoded
    String(Cow<'a, str>),
    /// Number value as its validated source text
    Number(&'a str),
    /// End of input
    Eof,
}

impl TokenKind<'_> {
    /// Short description used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Null => "null",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::String(_) => "string",
            TokenKind::Number(_) => "number",
            TokenKind::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token together with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// What was read.
    pub kind: TokenKind<'a>,
    /// Where it was read.
    pub span: Span,
}

/// JSON lexer over a borrowed input string.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    limits: Limits,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str, limits: Limits) -> Result<Self, ParseError> {
        if input.len() > limits.max_input_size {
            return Err(ParseError::new(
                ParseErrorKind::LimitExceeded,
                format!(
                    "input is {} bytes, limit is {}",
                    input.len(),
                    limits.max_input_size
                ),
                input,
                limits.max_input_size,
                0,
            ));
        }

        Ok(Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            limits,
            finished: false,
        })
    }

    /// The full input being scanned.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Get the current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Build an error of `kind` at `offset` covering `len` bytes of input.
    pub(crate) fn error(
        &self,
        kind: ParseErrorKind,
        message: impl Into<Cow<'static, str>>,
        offset: usize,
        len: usize,
    ) -> ParseError {
        ParseError::new(kind, message, self.input, offset, len)
    }

    fn lex_error(&self, message: impl Into<Cow<'static, str>>, offset: usize, len: usize) -> ParseError {
        self.error(ParseErrorKind::Lex, message, offset, len)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Advance past spaces, tabs and line breaks.
    pub(crate) fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn skip_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
    }

    /// Read the next token from the input.
    ///
    /// Once the input is exhausted every further call returns
    /// [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(b) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            });
        };

        let kind = match b {
            b'{' => self.single(TokenKind::LeftBrace),
            b'}' => self.single(TokenKind::RightBrace),
            b'[' => self.single(TokenKind::LeftBracket),
            b']' => self.single(TokenKind::RightBracket),
            b':' => self.single(TokenKind::Colon),
            b',' => self.single(TokenKind::Comma),
            b'"' => TokenKind::String(self.read_string()?),
            b'-' | b'0'..=b'9' => TokenKind::Number(self.read_number()?),
            b't' => self.read_literal("true", TokenKind::True)?,
            b'f' => self.read_literal("false", TokenKind::False)?,
            b'n' => self.read_literal("null", TokenKind::Null)?,
            _ => return Err(self.unexpected_char(start)),
        };

        Ok(Token {
            kind,
            span: Span::new(start, self.pos),
        })
    }

    fn single(&mut self, kind: TokenKind<'a>) -> TokenKind<'a> {
        self.pos += 1;
        kind
    }

    fn unexpected_char(&self, offset: usize) -> ParseError {
        match self.input[offset..].chars().next() {
            Some(ch) => self.lex_error(
                format!("unexpected character {ch:?}"),
                offset,
                ch.len_utf8(),
            ),
            None => self.lex_error("unexpected end of input", offset, 0),
        }
    }

    fn read_literal(
        &mut self,
        literal: &'static str,
        kind: TokenKind<'a>,
    ) -> Result<TokenKind<'a>, ParseError> {
        if self.bytes[self.pos..].starts_with(literal.as_bytes()) {
            self.pos += literal.len();
            return Ok(kind);
        }

        let word = self.bytes[self.pos..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        Err(self.lex_error(
            format!("invalid literal, expected `{literal}`"),
            self.pos,
            word.max(1),
        ))
    }

    /// Read a string token, handling escape sequences.
    fn read_string(&mut self) -> Result<Cow<'a, str>, ParseError> {
        let open = self.pos;
        // Consume opening quote
        self.pos += 1;

        let mut run_start = self.pos;
        let mut decoded: Option<String> = None;

        loop {
            let Some(b) = self.peek() else {
                return Err(self.lex_error("unterminated string", self.pos, 0));
            };

            match b {
                b'"' => {
                    let tail = &self.input[run_start..self.pos];
                    self.pos += 1;
                    let text = match decoded {
                        None => Cow::Borrowed(tail),
                        Some(mut buf) => {
                            buf.push_str(tail);
                            Cow::Owned(buf)
                        }
                    };
                    if text.len() > self.limits.max_string_length {
                        return Err(self.error(
                            ParseErrorKind::LimitExceeded,
                            format!(
                                "string is {} bytes, limit is {}",
                                text.len(),
                                self.limits.max_string_length
                            ),
                            open,
                            self.pos - open,
                        ));
                    }
                    return Ok(text);
                }
                b'\\' => {
                    let buf = decoded.get_or_insert_with(String::new);
                    buf.push_str(&self.input[run_start..self.pos]);
                    let ch = self.read_escape()?;
                    buf.push(ch);
                    run_start = self.pos;
                }
                0x00..=0x1F => {
                    return Err(self.lex_error(
                        format!("unescaped control character U+{b:04X} in string"),
                        self.pos,
                        1,
                    ));
                }
                // Multi-byte UTF-8 sequences are copied through unchanged;
                // the input is a `str` so they are already valid.
                _ => self.pos += 1,
            }
        }
    }

    /// Read an escape sequence starting at the backslash.
    fn read_escape(&mut self) -> Result<char, ParseError> {
        let escape_start = self.pos;
        self.pos += 1;

        let Some(b) = self.peek() else {
            return Err(self.lex_error("unterminated escape sequence", self.pos, 0));
        };
        self.pos += 1;

        let ch = match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\x08',
            b'f' => '\x0C',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => self.read_unicode_escape(escape_start)?,
            _ => {
                return Err(self.lex_error("invalid escape sequence", escape_start, 2));
            }
        };
        Ok(ch)
    }

    /// Read the XXXX of a \uXXXX escape, pairing UTF-16 surrogates.
    fn read_unicode_escape(&mut self, escape_start: usize) -> Result<char, ParseError> {
        let unit = self.read_hex4()?;

        match unit {
            0xD800..=0xDBFF => {
                if self.bytes[self.pos..].starts_with(b"\\u") {
                    self.pos += 2;
                    let low = self.read_hex4()?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(self.lex_error(
                            "high surrogate not followed by a low surrogate",
                            escape_start,
                            self.pos - escape_start,
                        ));
                    }
                    let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    char::from_u32(combined).ok_or_else(|| {
                        self.lex_error("invalid unicode escape", escape_start, 12)
                    })
                } else {
                    Err(self.lex_error("unpaired high surrogate", escape_start, 6))
                }
            }
            0xDC00..=0xDFFF => Err(self.lex_error("unpaired low surrogate", escape_start, 6)),
            _ => char::from_u32(unit)
                .ok_or_else(|| self.lex_error("invalid unicode escape", escape_start, 6)),
        }
    }

    /// Read 4 hex digits and return the value.
    fn read_hex4(&mut self) -> Result<u32, ParseError> {
        let mut value = 0;
        for _ in 0..4 {
            let Some(b) = self.peek() else {
                return Err(self.lex_error("unterminated escape sequence", self.pos, 0));
            };
            let digit = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => {
                    return Err(self.lex_error("invalid hex digit in \\u escape", self.pos, 1));
                }
            };
            value = (value << 4) | u32::from(digit);
            self.pos += 1;
        }
        Ok(value)
    }

    /// Read a number token: `-?(0|[1-9]\d*)(\.\d+)?([eE][+-]?\d+)?`.
    fn read_number(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        // Integer part
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                if let Some(b'0'..=b'9') = self.peek() {
                    return Err(self.lex_error("leading zeros are not allowed", self.pos, 1));
                }
            }
            Some(b'1'..=b'9') => {
                self.pos += 1;
                self.skip_digits();
            }
            _ => return Err(self.expected_digit("expected digit after '-'")),
        }

        // Fraction
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.expected_digit("expected digit after decimal point"));
            }
            self.skip_digits();
        }

        // Exponent
        if let Some(b'e' | b'E') = self.peek() {
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.expected_digit("expected digit in exponent"));
            }
            self.skip_digits();
        }

        Ok(&self.input[start..self.pos])
    }

    fn expected_digit(&self, message: &'static str) -> ParseError {
        let len = self.input[self.pos..].chars().next().map_or(0, char::len_utf8);
        self.lex_error(message, self.pos, len)
    }
}

/// Yields tokens up to (not including) end of input, stopping after the
/// first error.
impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(Token {
                kind: TokenKind::Eof,
                ..
            }) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
            token => Some(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Result<Vec<TokenKind<'_>>, ParseError> {
        Lexer::new(input, Limits::default())?
            .map(|token| token.map(|t| t.kind))
            .collect()
    }

    fn lex_err(input: &str) -> ParseError {
        lex(input).unwrap_err()
    }

    #[test]
    fn test_structural_tokens() {
        let tokens = lex("{}[],:").unwrap();
        assert_eq!(
            tokens,
            vec![
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Comma,
                TokenKind::Colon,
            ]
        );
    }

    #[test]
    fn test_literals() {
        let tokens = lex("null true false").unwrap();
        assert_eq!(
            tokens,
            vec![TokenKind::Null, TokenKind::True, TokenKind::False]
        );
    }

    #[test]
    fn test_whitespace_is_skipped() {
        let tokens = lex(" \t\r\n[ \n1 ]\r\n").unwrap();
        assert_eq!(
            tokens,
            vec![
                TokenKind::LeftBracket,
                TokenKind::Number("1"),
                TokenKind::RightBracket,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let mut lexer = Lexer::new(r#"  {"key": 12}"#, Limits::default()).unwrap();
        assert_eq!(lexer.next_token().unwrap().span, Span::new(2, 3));
        assert_eq!(lexer.next_token().unwrap().span, Span::new(3, 8));
        assert_eq!(lexer.next_token().unwrap().span, Span::new(8, 9));
        assert_eq!(lexer.next_token().unwrap().span, Span::new(10, 12));
        assert_eq!(lexer.next_token().unwrap().span, Span::new(12, 13));
        let eof = lexer.next_token().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert!(eof.span.is_empty());
        // Eof is sticky
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_string_without_escapes_is_borrowed() {
        let mut lexer = Lexer::new(r#""hello""#, Limits::default()).unwrap();
        match lexer.next_token().unwrap().kind {
            TokenKind::String(Cow::Borrowed(s)) => assert_eq!(s, "hello"),
            other => panic!("expected borrowed string, got {other:?}"),
        }
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex(r#""a\nb\tc\"d\\e\/f\bg\fh\ri""#).unwrap();
        assert_eq!(
            tokens,
            vec![TokenKind::String(
                "a\nb\tc\"d\\e/f\x08g\x0Ch\ri".into()
            )]
        );
    }

    #[test]
    fn test_unicode_escape() {
        let tokens = lex(r#""\u0041\u00e9""#).unwrap();
        assert_eq!(tokens, vec![TokenKind::String("Aé".into())]);
    }

    #[test]
    fn test_surrogate_pair() {
        let tokens = lex(r#""\uD83D\uDE00""#).unwrap();
        assert_eq!(tokens, vec![TokenKind::String("\u{1F600}".into())]);
    }

    #[test]
    fn test_unpaired_surrogates_rejected() {
        let err = lex_err(r#""\uD800""#);
        assert_eq!(err.kind(), ParseErrorKind::Lex);
        assert_eq!(err.offset(), 1);

        let err = lex_err(r#""\uDC00""#);
        assert_eq!(err.message(), "unpaired low surrogate");

        let err = lex_err(r#""\uD800\u0041""#);
        assert_eq!(err.message(), "high surrogate not followed by a low surrogate");
    }

    #[test]
    fn test_non_ascii_passthrough() {
        let tokens = lex("\"olá_こんにちは 💩\"").unwrap();
        assert_eq!(tokens, vec![TokenKind::String("olá_こんにちは 💩".into())]);
    }

    #[test]
    fn test_control_character_rejected() {
        let err = lex_err("\"a\nb\"");
        assert_eq!(err.kind(), ParseErrorKind::Lex);
        assert_eq!(err.offset(), 2);
        assert_eq!(err.message(), "unescaped control character U+000A in string");
    }

    #[test]
    fn test_invalid_escape_rejected() {
        let err = lex_err(r#""\q""#);
        assert_eq!(err.offset(), 1);
        assert_eq!(err.snippet(), "\\q");

        let err = lex_err(r#""\u12G4""#);
        assert_eq!(err.offset(), 5);
        assert_eq!(err.snippet(), "G");
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex_err("\"unclosed");
        assert_eq!(err.message(), "unterminated string");
        assert_eq!(err.offset(), 9);
    }

    #[test]
    fn test_number() {
        let tokens = lex("42 -123 0 -0 1.5 2e10 2E-3 -0.5e+7").unwrap();
        assert_eq!(
            tokens,
            vec![
                TokenKind::Number("42"),
                TokenKind::Number("-123"),
                TokenKind::Number("0"),
                TokenKind::Number("-0"),
                TokenKind::Number("1.5"),
                TokenKind::Number("2e10"),
                TokenKind::Number("2E-3"),
                TokenKind::Number("-0.5e+7"),
            ]
        );
    }

    #[test]
    fn test_malformed_numbers_rejected() {
        let err = lex_err("01");
        assert_eq!(err.message(), "leading zeros are not allowed");
        assert_eq!(err.offset(), 1);

        let err = lex_err("1.");
        assert_eq!(err.message(), "expected digit after decimal point");
        assert_eq!(err.offset(), 2);

        let err = lex_err("1.e5");
        assert_eq!(err.offset(), 2);

        let err = lex_err("1e+");
        assert_eq!(err.message(), "expected digit in exponent");

        let err = lex_err("-");
        assert_eq!(err.message(), "expected digit after '-'");

        let err = lex_err("-x");
        assert_eq!(err.snippet(), "x");

        let err = lex_err("+1");
        assert_eq!(err.message(), "unexpected character '+'");
        assert_eq!(err.offset(), 0);

        let err = lex_err(".5");
        assert_eq!(err.kind(), ParseErrorKind::Lex);
    }

    #[test]
    fn test_invalid_literal() {
        let err = lex_err("[nul]");
        assert_eq!(err.message(), "invalid literal, expected `null`");
        assert_eq!(err.offset(), 1);
        assert_eq!(err.snippet(), "nul");

        assert!(lex("truth").is_err());
        assert!(lex("NaN").is_err());
        assert!(lex("Infinity").is_err());
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex_err("[1, @]");
        assert_eq!(err.kind(), ParseErrorKind::Lex);
        assert_eq!(err.offset(), 4);
        assert_eq!(err.snippet(), "@");
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut lexer = Lexer::new("1 @ 2", Limits::default()).unwrap();
        assert!(matches!(lexer.next(), Some(Ok(_))));
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_input_too_large() {
        let mut limits = Limits::default();
        limits.max_input_size = 10;
        let err = Lexer::new("this is more than 10 bytes", limits).err().unwrap();
        assert_eq!(err.kind(), ParseErrorKind::LimitExceeded);
        assert_eq!(err.offset(), 10);
    }

    #[test]
    fn test_string_too_long() {
        let mut limits = Limits::default();
        limits.max_string_length = 3;
        let mut lexer = Lexer::new(r#""abcd""#, limits).unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::LimitExceeded);

        let mut lexer = Lexer::new(r#""abc""#, limits).unwrap();
        assert!(lexer.next_token().is_ok());
    }
}
