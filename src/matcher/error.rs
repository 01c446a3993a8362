use thiserror::Error;

use crate::index::IndexError;

/// Errors returned by the matcher.
///
/// "No match" is not an error; it is reported as [`MatchLookup::Miss`](super::MatchLookup::Miss).
#[derive(Debug, Error)]
pub enum MatchError {
    /// The query violates the index contract (e.g. hash wider than the catalog).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("index query failed: {0}")]
    Index(#[from] IndexError),
}

pub type MatcherResult<T> = Result<T, MatchError>;
