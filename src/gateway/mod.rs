//! HTTP gateway (Axum) for card matching.
//!
//! This module is primarily used by the `cardscan` server binary.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

pub use handler::{end_session_handler, frames_handler, match_handler};
pub use state::HandlerState;

use crate::gateway::payload::IndexResponse;
use crate::index::HashIndex;
use crate::matcher::{
    CARDSCAN_STATUS_HEADER, CARDSCAN_STATUS_HEALTHY, CARDSCAN_STATUS_NOT_READY,
    CARDSCAN_STATUS_READY,
};

pub fn create_router_with_state<I>(state: HandlerState<I>) -> Router
where
    I: HashIndex + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler::<I>))
        .route("/v1/index", get(index_handler::<I>))
        .route("/v1/match", post(match_handler::<I>))
        .route("/v1/frames", post(frames_handler::<I>))
        .route("/v1/sessions/{session_id}", delete(end_session_handler::<I>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub items: usize,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        CARDSCAN_STATUS_HEADER,
        HeaderValue::from_static(CARDSCAN_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

/// Ready once the index holds at least one catalog item.
#[tracing::instrument(skip(state))]
pub async fn ready_handler<I>(State(state): State<HandlerState<I>>) -> Response
where
    I: HashIndex + 'static,
{
    let items = state.matcher.index().len();
    let is_ready = items > 0;

    let (status_code, status_msg) = if is_ready {
        (StatusCode::OK, CARDSCAN_STATUS_READY)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, CARDSCAN_STATUS_NOT_READY)
    };

    let mut headers = HeaderMap::new();
    headers.insert(CARDSCAN_STATUS_HEADER, HeaderValue::from_static(status_msg));

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            items,
        }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn index_handler<I>(State(state): State<HandlerState<I>>) -> Json<IndexResponse>
where
    I: HashIndex + 'static,
{
    let summary = state.matcher.summary();
    let sessions = state.matcher.sessions();

    Json(IndexResponse {
        description: summary.to_string(),
        summary,
        catalog_digest: state.catalog_digest.clone(),
        sessions: sessions.len(),
        session_ttl_ms: sessions.ttl().as_millis() as u64,
    })
}
