use std::path::PathBuf;

use thiserror::Error;

use crate::index::{IndexError, PHashError};

/// Errors raised while loading the reference catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// A line is not a valid catalog row.
    #[error("catalog line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A row's hash is malformed or wider than the catalog bit length.
    #[error("catalog line {line}: invalid hash for '{id}': {source}")]
    InvalidHash {
        line: usize,
        id: String,
        #[source]
        source: PHashError,
    },

    #[error("failed to build index: {0}")]
    Index(#[from] IndexError),

    #[error("catalog {path} contains no items")]
    Empty { path: PathBuf },
}

pub type CatalogResult<T> = Result<T, CatalogError>;
