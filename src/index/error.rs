use thiserror::Error;

/// Errors raised while parsing or aligning a perceptual hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PHashError {
    /// Input contained no hex digits.
    #[error("perceptual hash is empty")]
    Empty,

    /// Input contained a character that is not a hex digit.
    #[error("invalid hex digit {found:?} at position {position}")]
    InvalidHex { found: char, position: usize },

    /// Value has more significant bits than the target width.
    #[error("hash needs {bits} bits but only {bit_length} are available")]
    TooWide { bits: usize, bit_length: usize },
}

/// Errors returned by index construction and queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The catalog-wide bit length must be positive.
    #[error("invalid bit length {bit_length}: must be greater than zero")]
    InvalidBitLength { bit_length: usize },

    /// A catalog item's hash does not fit the declared bit length.
    #[error("catalog item '{id}' hash needs {bits} bits, index bit length is {bit_length}")]
    HashTooWide {
        id: String,
        bits: usize,
        bit_length: usize,
    },

    /// A query hash does not fit the index bit length.
    #[error("query hash needs {bits} bits, index bit length is {bit_length}")]
    QueryTooWide { bits: usize, bit_length: usize },
}

impl IndexError {
    /// Returns `true` for errors that must stop the index from being built.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            IndexError::InvalidBitLength { .. } | IndexError::HashTooWide { .. }
        )
    }
}

/// Convenience result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
