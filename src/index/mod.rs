//! Nearest-neighbour lookup of perceptual hashes under Hamming distance.
//!
//! Two interchangeable implementations of [`HashIndex`] are provided:
//! - [`TrieIndex`]: binary trie with branch-and-bound search (default)
//! - [`ScanIndex`]: exhaustive scan, used as a reference and for tiny catalogs
//!
//! Both are immutable once built and safe to share across threads. [`MemoizedIndex`]
//! wraps either one with a bounded memo of recent queries.

pub mod backend;
mod collector;
pub mod error;
pub mod memo;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod phash;
pub mod scan;
pub mod trie;
pub mod types;

pub use backend::{CatalogIndex, HashIndex};
pub use error::{IndexError, IndexResult, PHashError};
pub use memo::MemoizedIndex;
#[cfg(any(test, feature = "mock"))]
pub use mock::{CountingIndex, flip_bits, random_catalog, random_hash, seeded_rng};
pub use phash::{HashBits, PHash, hamming_distance};
pub use scan::ScanIndex;
pub use trie::TrieIndex;
pub use types::{CatalogItem, IndexKind, IndexSummary, MatchResult};
