use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::phash::PHash;

/// A reference card with its perceptual hash.
///
/// The hash is used for matching only and is never serialized back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Stable catalog identifier (e.g. a Scryfall id).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Set / provenance code.
    pub set: String,
    #[serde(skip_serializing, alias = "phash")]
    pub hash: PHash,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        set: impl Into<String>,
        hash: PHash,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            set: set.into(),
            hash,
        }
    }
}

/// A catalog item together with its Hamming distance to a query.
///
/// Ordered by ascending distance, then by ascending catalog id.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub distance: u32,
    pub item: Arc<CatalogItem>,
}

impl MatchResult {
    pub fn new(distance: u32, item: Arc<CatalogItem>) -> Self {
        Self { distance, item }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.item.id
    }
}

impl PartialEq for MatchResult {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MatchResult {}

impl PartialOrd for MatchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.item.id.cmp(&other.item.id))
    }
}

/// Which [`HashIndex`](super::HashIndex) implementation backs a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Binary trie with branch-and-bound search.
    #[default]
    Trie,
    /// Exhaustive linear scan.
    Scan,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Trie => "trie",
            IndexKind::Scan => "scan",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trie" => Ok(Self::Trie),
            "scan" | "bruteforce" | "brute-force" => Ok(Self::Scan),
            other => Err(format!("unknown index kind: {}", other)),
        }
    }
}

/// Operational summary of a built index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub kind: IndexKind,
    pub bit_length: usize,
    pub items: usize,
    /// Trie nodes; equal to `items` for a scan index.
    pub nodes: usize,
    pub default_tolerance: u32,
}

impl fmt::Display for IndexSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(bit_length={}, items={}, nodes={}, default_tolerance={})",
            self.kind, self.bit_length, self.items, self.nodes, self.default_tolerance
        )
    }
}
