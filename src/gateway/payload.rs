use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::HashInput;
use crate::index::IndexSummary;
use crate::matcher::CardMatch;

/// `POST /v1/match` body.
#[derive(Deserialize, Debug, Clone)]
pub struct MatchRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub hash: HashInput,
    /// Signed so negative values can be rejected with a clear message.
    #[serde(default)]
    pub tolerance: Option<i64>,
    #[serde(default)]
    pub coordinates: Option<Value>,
}

/// One detected sub-image of a frame.
#[derive(Deserialize, Debug, Clone)]
pub struct FrameCard {
    pub hash: HashInput,
    #[serde(default)]
    pub coordinates: Option<Value>,
}

/// `POST /v1/frames` body.
#[derive(Deserialize, Debug, Clone)]
pub struct FrameRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub tolerance: Option<i64>,
    pub cards: Vec<FrameCard>,
}

#[derive(Serialize, Debug, Clone)]
pub struct MatchResponse {
    pub status: &'static str,
    pub result: Option<CardMatch>,
}

/// Matched sub-images only, in input order.
#[derive(Serialize, Debug, Clone)]
pub struct FrameResponse {
    pub cards: usize,
    pub results: Vec<CardMatch>,
}

#[derive(Serialize, Debug, Clone)]
pub struct IndexResponse {
    #[serde(flatten)]
    pub summary: IndexSummary,
    pub catalog_digest: String,
    pub sessions: usize,
    pub session_ttl_ms: u64,
    pub description: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct SessionResponse {
    pub status: &'static str,
    pub session_id: String,
    pub removed: bool,
}
