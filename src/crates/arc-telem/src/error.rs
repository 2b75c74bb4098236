use thiserror::Error;

/// Errors raised by telemetry primitives: out-of-range access, type
/// mismatches between a [`crate::Series`] and the value being read or
/// written into it, and malformed conversions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("index {index} out of bounds for series of length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("expected a {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unsupported data type for this operation: {0:?}")]
    UnsupportedType(crate::DataType),
}

pub type Result<T> = std::result::Result<T, Error>;
