//! JSON numbers.
//!
//! A [`Number`] is either the exact source text of a parsed literal or a
//! numeric value built in code:
//!
//! - literals are written back verbatim, so `1.0`, `1E5` and integers far
//!   beyond 2^53 survive a parse/serialize cycle bit for bit;
//! - integers are written in plain decimal;
//! - floats are written as integers when integral and within the safe integer
//!   range, otherwise with the shortest text that reads back as the same
//!   double.
//!
//! Equality compares decimal values exactly: `1`, `1.0`, `1e0` and
//! `Number::from(1)` are all equal, while `100000000000000000001` and `1e20`
//! are not. A float stands for the shortest decimal that reads back as it,
//! the same text the serializer writes, so `parse(serialize(v)) == v`. Up to
//! 2^53 that decimal is the float's exact value. NaN equals nothing.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, JsonResult, ParseError, ParseErrorKind};
use crate::lexer::{Lexer, TokenKind};
use crate::limits::{Limits, MAX_SAFE_INT};

/// A JSON number.
#[derive(Debug, Clone)]
pub struct Number {
    repr: Repr,
}

#[derive(Debug, Clone)]
enum Repr {
    /// Validated source text.
    Literal(Box<str>),
    Integer(i128),
    Float(f64),
}

impl Number {
    /// Wrap lexer-validated number text.
    pub(crate) fn from_literal(text: &str) -> Self {
        Self {
            repr: Repr::Literal(text.into()),
        }
    }

    /// A number holding `value`.
    ///
    /// Non-finite values are accepted here but cannot be serialized.
    pub fn from_f64(value: f64) -> Self {
        Self {
            repr: Repr::Float(value),
        }
    }

    /// The source text, for numbers produced by the parser.
    pub fn as_literal(&self) -> Option<&str> {
        match &self.repr {
            Repr::Literal(text) => Some(text),
            _ => None,
        }
    }

    /// Double-precision view. Lossy for integers beyond 2^53; literals too
    /// large for a double read as an infinity.
    pub fn as_f64(&self) -> f64 {
        match &self.repr {
            Repr::Literal(text) => text.parse().unwrap_or(f64::NAN),
            Repr::Integer(i) => *i as f64,
            Repr::Float(f) => *f,
        }
    }

    /// Exact integer view.
    ///
    /// Integer literals are read exactly. Literals with a fraction or exponent
    /// and floats qualify only when integral and within the safe integer range.
    pub fn as_i128(&self) -> Option<i128> {
        match &self.repr {
            Repr::Integer(i) => Some(*i),
            Repr::Literal(text) if !text.contains(&['.', 'e', 'E'][..]) => text.parse().ok(),
            Repr::Literal(_) => safe_integral(self.as_f64()),
            Repr::Float(f) => safe_integral(*f),
        }
    }

    /// Exact view as `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|i| i64::try_from(i).ok())
    }

    /// Exact view as `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|i| u64::try_from(i).ok())
    }

    /// True when an exact integer view exists.
    pub fn is_integer(&self) -> bool {
        self.as_i128().is_some()
    }

    /// True when the double view is finite.
    pub fn is_finite(&self) -> bool {
        self.as_f64().is_finite()
    }

    /// Append the JSON text of this number to `out`.
    pub(crate) fn write_json(&self, out: &mut String) -> JsonResult<()> {
        match &self.repr {
            Repr::Literal(text) => out.push_str(text),
            Repr::Integer(i) => out.push_str(itoa::Buffer::new().format(*i)),
            Repr::Float(f) => {
                if !f.is_finite() {
                    return Err(Error::UnrepresentableValue(*f));
                }
                match safe_integral(*f) {
                    Some(i) => out.push_str(itoa::Buffer::new().format(i)),
                    None => out.push_str(ryu::Buffer::new().format_finite(*f)),
                }
            }
        }
        Ok(())
    }
}

/// `value` as an integer if it is integral and within ±(2^53 - 1).
fn safe_integral(value: f64) -> Option<i128> {
    // `fract` is NaN for infinities, so they fail the first check.
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INT as f64 {
        Some(value as i128)
    } else {
        None
    }
}

/// A number as `digits × 10^exponent`, with no leading or trailing zeros in
/// `digits`. Zero has empty digits, a zero exponent and no sign.
#[derive(Debug, PartialEq)]
enum Exact {
    Decimal {
        negative: bool,
        digits: String,
        exponent: i64,
    },
    Infinite {
        negative: bool,
    },
}

impl Number {
    /// Canonical value for comparison. `None` for NaN.
    fn exact(&self) -> Option<Exact> {
        match &self.repr {
            Repr::Literal(text) => Some(decimal(text)),
            Repr::Integer(i) => Some(decimal(itoa::Buffer::new().format(*i))),
            Repr::Float(f) if f.is_nan() => None,
            Repr::Float(f) if f.is_infinite() => Some(Exact::Infinite {
                negative: f.is_sign_negative(),
            }),
            Repr::Float(f) => Some(decimal(ryu::Buffer::new().format_finite(*f))),
        }
    }
}

/// Normalize JSON number text. Exponents beyond `i64` saturate.
fn decimal(text: &str) -> Exact {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (mantissa, exp) = match rest.find(&['e', 'E'][..]) {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, ""),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let mut digits = String::with_capacity(int.len() + frac.len());
    digits.push_str(int);
    digits.push_str(frac);
    let mut exponent = parse_exponent(exp).saturating_sub(len_i64(frac.len()));

    let kept = digits.trim_end_matches('0').len();
    exponent = exponent.saturating_add(len_i64(digits.len() - kept));
    digits.truncate(kept);
    let leading = digits.len() - digits.trim_start_matches('0').len();
    digits.drain(..leading);

    if digits.is_empty() {
        return Exact::Decimal {
            negative: false,
            digits,
            exponent: 0,
        };
    }
    Exact::Decimal {
        negative,
        digits,
        exponent,
    }
}

fn parse_exponent(text: &str) -> i64 {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = digits
        .bytes()
        .filter(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn len_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Literal(a), Repr::Literal(b)) if a == b => true,
            (Repr::Integer(a), Repr::Integer(b)) => a == b,
            (Repr::Float(a), Repr::Float(b)) => a == b,
            (Repr::Integer(i), Repr::Float(f)) | (Repr::Float(f), Repr::Integer(i))
                if safe_integral(*f).is_some() =>
            {
                Some(*i) == safe_integral(*f)
            }
            _ => match (self.exact(), other.exact()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

/// Writes the JSON form. Non-finite floats print as Rust does (`NaN`, `inf`).
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        match self.write_json(&mut out) {
            Ok(()) => f.write_str(&out),
            Err(_) => write!(f, "{}", self.as_f64()),
        }
    }
}

/// Parses exactly one JSON number literal, keeping its text.
impl FromStr for Number {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lexer = Lexer::new(s, Limits::unbounded())?;
        let token = lexer.next_token()?;
        let TokenKind::Number(text) = token.kind else {
            return Err(lexer.error(
                ParseErrorKind::Syntax,
                format!("expected a number, found {}", token.kind),
                token.span.start,
                token.span.len(),
            ));
        };

        let rest = lexer.next_token()?;
        if rest.kind != TokenKind::Eof {
            return Err(lexer.error(
                ParseErrorKind::Syntax,
                "trailing content after number",
                rest.span.start,
                rest.span.len(),
            ));
        }

        Ok(Number::from_literal(text))
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Self {
                        repr: Repr::Integer(value as i128),
                    }
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Self::from_f64(f64::from(value))
    }
}
