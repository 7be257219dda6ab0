//! Resource limits for parsing.
//!
//! Nesting depth is bounded by default so adversarial input cannot grow the
//! parser's frame stack without end. The remaining limits are off by default and can be tightened with
//! [`Limits::strict`] or field by field when parsing untrusted input.

/// Largest integer exactly representable as an IEEE-754 double (2^53 - 1).
pub const MAX_SAFE_INT: i64 = (1i64 << 53) - 1;

/// Smallest integer exactly representable as an IEEE-754 double.
pub const MIN_SAFE_INT: i64 = -MAX_SAFE_INT;

/// Default maximum nesting depth of arrays and objects.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Parse-time resource bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limits {
    /// Maximum total input size in bytes.
    pub max_input_size: usize,
    /// Maximum nesting depth for arrays/objects.
    pub max_depth: usize,
    /// Maximum decoded string length in bytes (keys included).
    pub max_string_length: usize,
    /// Maximum number of members in one object.
    pub max_object_fields: usize,
    /// Maximum number of elements in one array.
    pub max_array_length: usize,
}

impl Limits {
    /// Depth bounded at [`DEFAULT_MAX_DEPTH`], everything else unlimited.
    pub const fn standard() -> Self {
        Self {
            max_input_size: usize::MAX,
            max_depth: DEFAULT_MAX_DEPTH,
            max_string_length: usize::MAX,
            max_object_fields: usize::MAX,
            max_array_length: usize::MAX,
        }
    }

    /// Tight bounds for untrusted input.
    pub const fn strict() -> Self {
        Self {
            max_input_size: 16 * 1024 * 1024, // 16 MiB
            max_depth: 128,
            max_string_length: 1024 * 1024, // 1 MiB
            max_object_fields: 10_000,
            max_array_length: 100_000,
        }
    }

    /// No bounds at all, not even on depth.
    ///
    /// Only meant for inputs that cannot nest, such as a lone number.
    pub const fn unbounded() -> Self {
        Self {
            max_input_size: usize::MAX,
            max_depth: usize::MAX,
            max_string_length: usize::MAX,
            max_object_fields: usize::MAX,
            max_array_length: usize::MAX,
        }
    }

    /// Same limits with a different maximum depth.
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Check if an integer is within the safe integer range.
    pub fn is_safe_integer(value: i64) -> bool {
        (MIN_SAFE_INT..=MAX_SAFE_INT).contains(&value)
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::standard()
    }
}
