//! JSON parser.
//!
//! The parser pulls one token at a time from the [`Lexer`] and keeps a single
//! token of lookahead. Open arrays and objects live on an explicit heap stack
//! rather than the call stack, so nesting costs no native stack and is bounded
//! only by [`Limits::max_depth`].
//!
//! Parsing halts at the first violation. The returned [`ParseError`] points at
//! the first offending character and says what was expected there.

use std::borrow::Cow;
use std::io::Read;

use tracing::{debug, trace};

use crate::error::{Error, JsonResult, ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::limits::Limits;
use crate::number::Number;
use crate::value::{Map, Value};

/// An array or object still waiting for its closing bracket.
enum Frame {
    Array {
        items: Vec<Value>,
        open: usize,
    },
    Object {
        map: Map,
        key: String,
        key_start: usize,
        open: usize,
    },
}

/// JSON parser over a borrowed input string.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token<'a>,
    limits: Limits,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input.
    pub fn new(input: &'a str, limits: Limits) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input, limits)?;
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            limits,
            depth: 0,
        })
    }

    /// Parse the input as exactly one JSON value.
    pub fn parse(&mut self) -> Result<Value, ParseError> {
        let value = self.parse_value()?;

        // Ensure no trailing content
        if self.current.kind != TokenKind::Eof {
            return Err(self.error(
                ParseErrorKind::Syntax,
                "trailing content after top-level value",
            ));
        }

        Ok(value)
    }

    /// Advance to the next token.
    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    /// Advance past the last token of a value.
    ///
    /// After the top-level value anything but whitespace is trailing content,
    /// including text that does not form a token.
    fn advance_past_value(&mut self, top_level: bool) -> Result<(), ParseError> {
        if !top_level {
            return self.advance();
        }
        self.lexer.skip_whitespace();
        let start = self.lexer.position();
        match self.lexer.next_token() {
            Ok(token) => {
                self.current = token;
                Ok(())
            }
            Err(_) => Err(self.lexer.error(
                ParseErrorKind::Syntax,
                "trailing content after top-level value",
                start,
                1,
            )),
        }
    }

    /// Error of `kind` located at the current token.
    fn error(&self, kind: ParseErrorKind, message: impl Into<Cow<'static, str>>) -> ParseError {
        self.lexer.error(
            kind,
            message,
            self.current.span.start,
            self.current.span.len(),
        )
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        self.error(
            ParseErrorKind::Syntax,
            format!("expected {expected}, found {}", self.current.kind),
        )
    }

    /// Enter an array or object, enforcing the depth limit.
    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.limits.max_depth {
            return Err(self.error(
                ParseErrorKind::DepthExceeded,
                format!("nesting depth exceeds limit of {}", self.limits.max_depth),
            ));
        }
        Ok(())
    }

    /// Read `"key" :` and return the key with its offset.
    fn parse_key(&mut self, first: bool) -> Result<(String, usize), ParseError> {
        let key_start = self.current.span.start;
        let key = if let TokenKind::String(s) = &mut self.current.kind {
            std::mem::take(s).into_owned()
        } else if first {
            return Err(self.unexpected("string key or '}'"));
        } else if self.current.kind == TokenKind::RightBrace {
            return Err(self.error(ParseErrorKind::Syntax, "trailing comma before '}'"));
        } else {
            return Err(self.unexpected("string key"));
        };
        self.advance()?;

        // Expect colon
        if self.current.kind != TokenKind::Colon {
            return Err(self.unexpected("':' after object key"));
        }
        self.advance()?;

        Ok((key, key_start))
    }

    /// Parse a single JSON value.
    ///
    /// Each pass of the outer loop reads the start of one value. Scalars and
    /// empty containers complete at once; non-empty containers push a frame.
    /// The inner loop then hands each completed value to its parent frame
    /// until a frame needs another value or the stack is empty.
    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let mut stack: Vec<Frame> = Vec::new();

        'value: loop {
            let mut value_start = self.current.span.start;
            let mut value = match &mut self.current.kind {
                TokenKind::LeftBracket => {
                    self.enter()?;
                    self.advance()?;
                    if self.current.kind != TokenKind::RightBracket {
                        stack.push(Frame::Array {
                            items: Vec::new(),
                            open: value_start,
                        });
                        continue 'value;
                    }
                    self.depth -= 1;
                    Value::Array(Vec::new())
                }
                TokenKind::LeftBrace => {
                    self.enter()?;
                    self.advance()?;
                    if self.current.kind != TokenKind::RightBrace {
                        let (key, key_start) = self.parse_key(true)?;
                        stack.push(Frame::Object {
                            map: Map::new(),
                            key,
                            key_start,
                            open: value_start,
                        });
                        continue 'value;
                    }
                    self.depth -= 1;
                    Value::Object(Map::new())
                }
                TokenKind::Null => Value::Null,
                TokenKind::True => Value::Bool(true),
                TokenKind::False => Value::Bool(false),
                TokenKind::String(s) => Value::String(std::mem::take(s).into_owned()),
                TokenKind::Number(text) => Value::Number(Number::from_literal(text)),
                _ => return Err(self.unexpected("a value")),
            };
            self.advance_past_value(stack.is_empty())?;

            loop {
                let Some(frame) = stack.pop() else {
                    return Ok(value);
                };

                match frame {
                    Frame::Array { mut items, open } => {
                        items.push(value);
                        if items.len() > self.limits.max_array_length {
                            return Err(self.lexer.error(
                                ParseErrorKind::LimitExceeded,
                                format!(
                                    "array has more than {} elements",
                                    self.limits.max_array_length
                                ),
                                value_start,
                                0,
                            ));
                        }

                        // Expect comma or closing bracket
                        match self.current.kind {
                            TokenKind::Comma => {
                                self.advance()?;
                                if self.current.kind == TokenKind::RightBracket {
                                    return Err(self.error(
                                        ParseErrorKind::Syntax,
                                        "trailing comma before ']'",
                                    ));
                                }
                                stack.push(Frame::Array { items, open });
                                continue 'value;
                            }
                            TokenKind::RightBracket => {
                                value = Value::Array(items);
                                value_start = open;
                            }
                            _ => return Err(self.unexpected("',' or ']' after array element")),
                        }
                    }
                    Frame::Object {
                        mut map,
                        key,
                        key_start,
                        open,
                    } => {
                        // First-seen position is kept, the last value wins.
                        map.insert(key, value);
                        if map.len() > self.limits.max_object_fields {
                            return Err(self.lexer.error(
                                ParseErrorKind::LimitExceeded,
                                format!(
                                    "object has more than {} members",
                                    self.limits.max_object_fields
                                ),
                                key_start,
                                0,
                            ));
                        }

                        // Expect comma or closing brace
                        match self.current.kind {
                            TokenKind::Comma => {
                                self.advance()?;
                                let (key, key_start) = self.parse_key(false)?;
                                stack.push(Frame::Object {
                                    map,
                                    key,
                                    key_start,
                                    open,
                                });
                                continue 'value;
                            }
                            TokenKind::RightBrace => {
                                value = Value::Object(map);
                                value_start = open;
                            }
                            _ => return Err(self.unexpected("',' or '}' after object member")),
                        }
                    }
                }

                // Consume the closing bracket or brace
                self.depth -= 1;
                self.advance_past_value(stack.is_empty())?;
            }
        }
    }
}

/// Parse a JSON document with the default [`Limits`].
pub fn parse(input: &str) -> Result<Value, ParseError> {
    parse_with_limits(input, Limits::default())
}

/// Parse a JSON document with custom limits.
pub fn parse_with_limits(input: &str, limits: Limits) -> Result<Value, ParseError> {
    trace!(len = input.len(), "parsing document");
    let result = Parser::new(input, limits).and_then(|mut parser| parser.parse());
    if let Err(e) = &result {
        debug!(
            code = e.code(),
            offset = e.offset(),
            line = e.line(),
            column = e.column(),
            message = e.message(),
            "parse failed"
        );
    }
    result
}

/// Parse UTF-8 bytes with the default [`Limits`].
pub fn from_slice(input: &[u8]) -> Result<Value, ParseError> {
    from_slice_with_limits(input, Limits::default())
}

/// Parse UTF-8 bytes with custom limits.
///
/// Invalid UTF-8 is a lex error located at the first invalid byte.
pub fn from_slice_with_limits(input: &[u8], limits: Limits) -> Result<Value, ParseError> {
    match std::str::from_utf8(input) {
        Ok(text) => parse_with_limits(text, limits),
        Err(e) => {
            let valid = e.valid_up_to();
            let prefix = std::str::from_utf8(&input[..valid]).unwrap_or_default();
            let message = match input.get(valid) {
                Some(byte) => format!("invalid UTF-8 byte 0x{byte:02X}"),
                None => "invalid UTF-8".to_string(),
            };
            let err = ParseError::new(ParseErrorKind::Lex, message, prefix, valid, 0);
            debug!(offset = valid, "input is not valid UTF-8");
            Err(err)
        }
    }
}

/// Read and parse a whole document from `reader` with the default [`Limits`].
pub fn from_reader<R: Read>(reader: R) -> JsonResult<Value> {
    from_reader_with_limits(reader, Limits::default())
}

/// Read and parse a whole document from `reader` with custom limits.
///
/// At most `max_input_size + 1` bytes are read, so an oversized stream fails
/// with a limit error without being buffered in full. Read failures are
/// reported as [`Error::Io`].
pub fn from_reader_with_limits<R: Read>(reader: R, limits: Limits) -> JsonResult<Value> {
    let cap = u64::try_from(limits.max_input_size)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let mut buf = Vec::new();
    reader.take(cap).read_to_end(&mut buf)?;
    trace!(len = buf.len(), "read document");

    if buf.len() > limits.max_input_size {
        let head = &buf[..limits.max_input_size];
        let prefix = match std::str::from_utf8(head) {
            Ok(text) => text,
            Err(e) => std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default(),
        };
        let err = ParseError::new(
            ParseErrorKind::LimitExceeded,
            format!("input exceeds limit of {} bytes", limits.max_input_size),
            prefix,
            prefix.len(),
            0,
        );
        debug!(limit = limits.max_input_size, "input too large");
        return Err(Error::Parse(err));
    }

    Ok(from_slice_with_limits(&buf, limits)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(input: &str) -> ParseError {
        parse(input).unwrap_err()
    }

    fn nested_arrays(depth: usize) -> String {
        format!("{}{}", "[".repeat(depth), "]".repeat(depth))
    }

    /// Drop a deeply nested array one level at a time.
    fn dismantle(mut value: Value) {
        while let Value::Array(mut items) = value {
            value = items.pop().unwrap_or_default();
        }
    }

    #[test]
    fn test_parse_null() {
        assert_eq!(parse("null").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_booleans() {
        assert_eq!(parse("true").unwrap(), Value::Bool(true));
        assert_eq!(parse("false").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_parse_number_keeps_literal() {
        let value = parse("1.0").unwrap();
        assert_eq!(value.as_number().unwrap().as_literal(), Some("1.0"));
        assert_eq!(parse("-123").unwrap(), Value::number(-123));
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(parse(r#""hello""#).unwrap(), Value::string("hello"));
        assert_eq!(parse(r#""a\"b""#).unwrap(), Value::string("a\"b"));
    }

    #[test]
    fn test_parse_array() {
        let result = parse("[1, 2, 3]").unwrap();
        assert_eq!(result, Value::array([1, 2, 3]));
        assert_eq!(parse(" [ ] ").unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_parse_object() {
        let result = parse(r#"{"a":1,"b":[true,false,null]}"#).unwrap();
        let expected = Value::object([
            ("a", Value::number(1)),
            (
                "b",
                Value::array([Value::Bool(true), Value::Bool(false), Value::Null]),
            ),
        ]);
        assert_eq!(result, expected);
        assert_eq!(parse("{ }").unwrap(), Value::Object(Map::new()));
    }

    #[test]
    fn test_object_preserves_insertion_order() {
        let result = parse(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<&str> = result
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_duplicate_key_last_value_first_position() {
        let result = parse(r#"{"a": 1, "b": 2, "a": 3}"#).unwrap();
        let map = result.as_object().unwrap();
        assert_eq!(map.len(), 2);
        let entries: Vec<(&str, &Value)> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
        assert_eq!(
            entries,
            [("a", &Value::number(3)), ("b", &Value::number(2))]
        );
    }

    #[test]
    fn test_missing_value_points_at_brace() {
        let err = parse_err(r#"{"a":}"#);
        assert_eq!(err.kind(), ParseErrorKind::Syntax);
        assert_eq!(err.offset(), 5);
        assert_eq!(err.snippet(), "}");
        assert_eq!(err.message(), "expected a value, found '}'");
    }

    #[test]
    fn test_missing_colon() {
        let err = parse_err(r#"{"a" 1}"#);
        assert_eq!(err.message(), "expected ':' after object key, found number");
        assert_eq!(err.offset(), 5);
    }

    #[test]
    fn test_bare_key_rejected() {
        let err = parse_err("{a: 1}");
        assert_eq!(err.kind(), ParseErrorKind::Lex);
        assert_eq!(err.offset(), 1);

        let err = parse_err("{1: 1}");
        assert_eq!(err.kind(), ParseErrorKind::Syntax);
        assert_eq!(err.message(), "expected string key or '}', found number");
    }

    #[test]
    fn test_trailing_content_rejected() {
        let err = parse_err("null extra");
        assert_eq!(err.kind(), ParseErrorKind::Syntax);
        assert_eq!(err.message(), "trailing content after top-level value");
        assert_eq!(err.offset(), 5);

        // Trailing text that is not even a token
        let err = parse_err(r#"{} "abc"#);
        assert_eq!(err.kind(), ParseErrorKind::Syntax);
        assert_eq!(err.offset(), 3);

        let err = parse_err("[1] 01");
        assert_eq!(err.kind(), ParseErrorKind::Syntax);
        assert_eq!(err.offset(), 4);

        let err = parse_err("1\n\n  @");
        assert_eq!(err.kind(), ParseErrorKind::Syntax);
        assert_eq!((err.line(), err.column()), (3, 3));

        // Inside a container the lexer error stands
        let err = parse_err("[1 @]");
        assert_eq!(err.kind(), ParseErrorKind::Lex);

        let err = parse_err("[1] [2]");
        assert_eq!(err.kind(), ParseErrorKind::Syntax);
        assert_eq!(err.message(), "trailing content after top-level value");
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn test_trailing_comma_rejected() {
        let err = parse_err("[1, 2,]");
        assert_eq!(err.message(), "trailing comma before ']'");
        assert_eq!(err.offset(), 6);

        let err = parse_err(r#"{"a": 1,}"#);
        assert_eq!(err.message(), "trailing comma before '}'");
        assert_eq!(err.offset(), 8);
    }

    #[test]
    fn test_missing_separator() {
        let err = parse_err("[1 2]");
        assert_eq!(err.message(), "expected ',' or ']' after array element, found number");
        assert_eq!(err.offset(), 3);

        let err = parse_err(r#"{"a": 1 "b": 2}"#);
        assert_eq!(err.message(), "expected ',' or '}' after object member, found string");
    }

    #[test]
    fn test_empty_and_unterminated_input() {
        let err = parse_err("");
        assert_eq!(err.message(), "expected a value, found end of input");
        assert_eq!(err.offset(), 0);

        let err = parse_err("   ");
        assert_eq!(err.offset(), 3);

        let err = parse_err("[1,");
        assert_eq!(err.message(), "expected a value, found end of input");

        let err = parse_err(r#"{"a": [1"#);
        assert_eq!(err.message(), "expected ',' or ']' after array element, found end of input");
    }

    #[test]
    fn test_error_line_and_column() {
        let err = parse_err("{\n  \"a\": 1,\n  \"b\": ]\n}");
        assert_eq!(err.line(), 3);
        assert_eq!(err.column(), 8);
    }

    #[test]
    fn test_nesting_depth_limit() {
        let limits = Limits::default().with_max_depth(2);

        // Depth 2 is allowed
        assert!(parse_with_limits("[[1]]", limits).is_ok());
        assert!(parse_with_limits(r#"{"a": {"b": 1}}"#, limits).is_ok());

        // Depth 3 exceeds limit
        let err = parse_with_limits("[[[1]]]", limits).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::DepthExceeded);
        assert_eq!(err.offset(), 2);
        assert_eq!(err.code(), 102);

        let err = parse_with_limits(r#"[{"a": [1]}]"#, limits).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::DepthExceeded);
    }

    #[test]
    fn test_depth_counter_resets_between_siblings() {
        let limits = Limits::default().with_max_depth(2);
        assert!(parse_with_limits("[[1], [2], {}, [[]]]", limits).is_ok());
    }

    #[test]
    fn test_default_depth_limit() {
        // Runs on the ordinary test-thread stack.
        let value = parse(&nested_arrays(1000)).unwrap();
        dismantle(value);

        let err = parse(&nested_arrays(1001)).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::DepthExceeded);
        assert_eq!(err.offset(), 1000);
    }

    #[test]
    fn test_depth_limit_on_small_thread_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let unclosed = parse(&"[".repeat(5000)).unwrap_err();
                let closed = parse(&nested_arrays(1001)).unwrap_err();
                (unclosed.kind(), closed.kind())
            })
            .unwrap();
        assert_eq!(
            handle.join().unwrap(),
            (ParseErrorKind::DepthExceeded, ParseErrorKind::DepthExceeded)
        );
    }

    #[test]
    fn test_adversarial_depth_does_not_crash() {
        // Far beyond the limit: fails fast instead of overflowing the stack.
        let err = parse(&"[".repeat(1_000_000)).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::DepthExceeded);
    }

    #[test]
    fn test_unbounded_depth_uses_no_native_stack() {
        let depth = 200_000;
        let input = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
        let mut value = parse_with_limits(&input, Limits::unbounded()).unwrap();

        let mut levels = 0;
        while let Value::Array(mut items) = value {
            assert_eq!(items.len(), 1);
            value = items.pop().unwrap();
            levels += 1;
        }
        assert_eq!(levels, depth);
        assert_eq!(value, Value::number(1));
    }

    #[test]
    fn test_object_field_limit() {
        let mut limits = Limits::default();
        limits.max_object_fields = 2;

        let err = parse_with_limits(r#"{"a": 1, "b": 2, "c": 3}"#, limits).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::LimitExceeded);
        assert_eq!(err.offset(), 17);

        // Duplicates do not add members
        assert!(parse_with_limits(r#"{"a": 1, "b": 2, "a": 3}"#, limits).is_ok());
    }

    #[test]
    fn test_array_length_limit() {
        let mut limits = Limits::default();
        limits.max_array_length = 2;

        let err = parse_with_limits("[1, 2, 3]", limits).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::LimitExceeded);
        assert_eq!(err.code(), 103);
        assert!(parse_with_limits("[1, 2]", limits).is_ok());
    }

    #[test]
    fn test_from_slice() {
        assert_eq!(from_slice(b"[true]").unwrap(), Value::array([true]));

        let err = from_slice(b"[\"ok\", \"\xFF\"]").unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::Lex);
        assert_eq!(err.offset(), 8);
        assert_eq!(err.message(), "invalid UTF-8 byte 0xFF");
    }

    #[test]
    fn test_nested_structure() {
        let result = parse(r#"{"arr": [1, {"nested": true}], "num": 42}"#).unwrap();
        assert!(result.is_object());
        let arr = result.get("arr").unwrap();
        assert!(arr.is_array());
        assert_eq!(
            arr.get_index(1).unwrap().get("nested"),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_from_reader() {
        let value = from_reader(&b"{\"a\": [1, 2]}"[..]).unwrap();
        assert_eq!(value.get("a"), Some(&Value::array([1, 2])));

        let err = from_reader(&b"[1,]"[..]).unwrap_err();
        assert!(matches!(&err, Error::Parse(p) if p.kind() == ParseErrorKind::Syntax));
        assert_eq!(err.code(), 101);
    }

    #[test]
    fn test_from_reader_stops_at_input_limit() {
        let mut limits = Limits::default();
        limits.max_input_size = 8;

        // An endless stream is cut off after the limit
        let endless = std::io::repeat(b' ');
        let err = from_reader_with_limits(endless, limits).unwrap_err();
        let p = err.as_parse_error().unwrap();
        assert_eq!(p.kind(), ParseErrorKind::LimitExceeded);
        assert_eq!(p.offset(), 8);
        assert_eq!(p.message(), "input exceeds limit of 8 bytes");

        assert!(from_reader_with_limits(&b"[1,2,3] "[..], limits).is_ok());
    }

    #[test]
    fn test_from_reader_io_failure() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "pipe closed",
                ))
            }
        }

        let err = from_reader(Broken).unwrap_err();
        assert_eq!(err.code(), 400);
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::BrokenPipe,
                ..
            }
        ));
    }
}
