//! cardscan library crate (used by the server and integration tests).
//!
//! Identifies a card from the perceptual hash of a photographed region by nearest-match
//! search in Hamming space, with a short-lived per-session cache exploiting the fact that
//! consecutive video frames usually show the same card.
//!
//! # Public API Surface
//!
//! ## Index
//! - [`PHash`] - fixed-width hash bit string
//! - [`HashIndex`] - nearest-match contract, implemented by [`TrieIndex`] and [`ScanIndex`]
//! - [`CatalogIndex`] - runtime-selected variant
//! - [`MemoizedIndex`] - bounded memo of repeated queries
//!
//! ## Matching
//! - [`SessionCache`] - TTL candidate cache keyed by session id
//! - [`CardMatcher`] - session cache first, index second
//!
//! ## Service
//! - [`Config`], [`ConfigError`] - server configuration
//! - [`load_catalog`], [`load_index`] - JSON-lines catalog loading
//! - [`gateway`] - Axum router
//!
//! ## Test/Mock Support
//! [`CountingIndex`] and [`ManualClock`] are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod gateway;
pub mod index;
pub mod matcher;

#[cfg(any(test, feature = "mock"))]
pub use cache::ManualClock;
pub use cache::{Clock, SessionCache, SystemClock};

pub use catalog::{
    CatalogError, CatalogResult, HashInput, catalog_digest, load_catalog, load_index,
    parse_catalog,
};
pub use config::{Config, ConfigError};
pub use constants::{
    DEFAULT_BIT_LENGTH, DEFAULT_QUERY_MEMO_CAPACITY, DEFAULT_SESSION_TTL, DEFAULT_TOLERANCE_RATIO,
    DEFAULT_TOP_N, SUPPORTED_BIT_LENGTHS, default_tolerance, similarity,
};

#[cfg(any(test, feature = "mock"))]
pub use index::CountingIndex;
pub use index::{
    CatalogIndex, CatalogItem, HashIndex, IndexError, IndexKind, IndexResult, IndexSummary,
    MatchResult, MemoizedIndex, PHash, PHashError, ScanIndex, TrieIndex, hamming_distance,
};

pub use matcher::{
    CARDSCAN_STATUS_HEADER, CardMatch, CardMatcher, MatchError, MatchLookup, MatchQuery,
    MatchStatus, MatcherResult,
};
