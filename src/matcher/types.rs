use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::index::{CatalogItem, MatchResult, PHash};

pub const CARDSCAN_STATUS_HEADER: &str = "X-Cardscan-Status";
pub const CARDSCAN_STATUS_HEALTHY: &str = "healthy";
pub const CARDSCAN_STATUS_READY: &str = "ready";
pub const CARDSCAN_STATUS_NOT_READY: &str = "not_ready";
pub const CARDSCAN_STATUS_REMOVED: &str = "removed";

/// Where a match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    HitSession,
    HitIndex,
    Miss,
}

impl MatchStatus {
    #[inline]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            MatchStatus::HitSession => "HIT_SESSION",
            MatchStatus::HitIndex => "HIT_INDEX",
            MatchStatus::Miss => "MISS",
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        !matches!(self, MatchStatus::Miss)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_value())
    }
}

/// Outcome of a single lookup, best result first.
#[derive(Debug, Clone)]
pub enum MatchLookup {
    /// Re-scored candidates from the session cache.
    HitSession(Vec<MatchResult>),
    /// Fresh results from the index.
    HitIndex(Vec<MatchResult>),
    Miss,
}

impl MatchLookup {
    pub fn status(&self) -> MatchStatus {
        match self {
            MatchLookup::HitSession(_) => MatchStatus::HitSession,
            MatchLookup::HitIndex(_) => MatchStatus::HitIndex,
            MatchLookup::Miss => MatchStatus::Miss,
        }
    }

    pub fn is_hit(&self) -> bool {
        !matches!(self, MatchLookup::Miss)
    }

    pub fn is_session_hit(&self) -> bool {
        matches!(self, MatchLookup::HitSession(_))
    }

    pub fn results(&self) -> &[MatchResult] {
        match self {
            MatchLookup::HitSession(results) | MatchLookup::HitIndex(results) => results,
            MatchLookup::Miss => &[],
        }
    }

    pub fn best(&self) -> Option<&MatchResult> {
        self.results().first()
    }
}

/// One query: a hash plus optional session, tolerance override and opaque coordinates.
#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub session_id: Option<String>,
    pub hash: PHash,
    pub tolerance: Option<u32>,
    /// Passed through untouched to the [`CardMatch`].
    pub coordinates: Option<Value>,
}

impl MatchQuery {
    pub fn new(hash: PHash) -> Self {
        Self {
            session_id: None,
            hash,
            tolerance: None,
            coordinates: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_tolerance(mut self, tolerance: u32) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_coordinates(mut self, coordinates: Value) -> Self {
        self.coordinates = Some(coordinates);
        self
    }
}

/// Best match for one query, as returned to callers.
///
/// Serialized as `{coordinates, cardData, distance, match}` where `match` is the
/// similarity rounded to two decimals. The catalog hash is never included.
#[derive(Debug, Clone, Serialize)]
pub struct CardMatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,
    #[serde(rename = "cardData")]
    pub item: Arc<CatalogItem>,
    pub distance: u32,
    #[serde(rename = "match", serialize_with = "two_decimals")]
    pub similarity: f32,
    #[serde(skip)]
    pub status: MatchStatus,
}

fn two_decimals<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((f64::from(*value) * 100.0).round() / 100.0)
}
