use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, instrument};

use crate::gateway::error::GatewayError;
use crate::gateway::payload::{
    FrameRequest, FrameResponse, MatchRequest, MatchResponse, SessionResponse,
};
use crate::gateway::state::HandlerState;
use crate::index::HashIndex;
use crate::matcher::{CARDSCAN_STATUS_HEADER, CARDSCAN_STATUS_REMOVED, MatchQuery, MatchStatus};

#[instrument(skip(state, request), fields(session = tracing::field::Empty))]
pub async fn match_handler<I>(
    State(state): State<HandlerState<I>>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError>
where
    I: HashIndex + 'static,
{
    let request: MatchRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;
    let session_id = normalize_session(request.session_id);
    if let Some(session_id) = &session_id {
        tracing::Span::current().record("session", session_id.as_str());
    }

    let hash = request.hash.to_phash(state.matcher.bit_length())?;
    let query = MatchQuery {
        session_id,
        hash,
        tolerance: validate_tolerance(request.tolerance)?,
        coordinates: request.coordinates,
    };

    let matcher = state.matcher.clone();
    let found = tokio::task::spawn_blocking(move || matcher.match_query(&query))
        .await
        .map_err(|e| GatewayError::InternalError(format!("match task failed: {}", e)))??;

    let status = found.as_ref().map_or(MatchStatus::Miss, |m| m.status);
    debug!(status = %status, "Match handled");

    Ok(make_response(
        status,
        MatchResponse {
            status: status.as_header_value(),
            result: found,
        },
    ))
}

#[instrument(skip(state, request), fields(cards = tracing::field::Empty))]
pub async fn frames_handler<I>(
    State(state): State<HandlerState<I>>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError>
where
    I: HashIndex + 'static,
{
    let request: FrameRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;
    tracing::Span::current().record("cards", request.cards.len());

    let session_id = normalize_session(request.session_id);
    let tolerance = validate_tolerance(request.tolerance)?;
    let bit_length = state.matcher.bit_length();

    let queries = request
        .cards
        .into_iter()
        .map(|card| -> Result<MatchQuery, GatewayError> {
            Ok(MatchQuery {
                session_id: session_id.clone(),
                hash: card.hash.to_phash(bit_length)?,
                tolerance,
                coordinates: card.coordinates,
            })
        })
        .collect::<Result<Vec<_>, GatewayError>>()?;

    let cards = queries.len();
    let results: Vec<_> = state
        .matcher
        .match_frame(queries)
        .await?
        .into_iter()
        .flatten()
        .collect();

    let status = if results.is_empty() {
        MatchStatus::Miss
    } else if results.iter().all(|m| m.status == MatchStatus::HitSession) {
        MatchStatus::HitSession
    } else {
        MatchStatus::HitIndex
    };
    info!(cards, matched = results.len(), "Frame handled");

    Ok(make_response(status, FrameResponse { cards, results }))
}

#[instrument(skip(state))]
pub async fn end_session_handler<I>(
    State(state): State<HandlerState<I>>,
    Path(session_id): Path<String>,
) -> Response
where
    I: HashIndex + 'static,
{
    let removed = state.matcher.end_session(&session_id);

    let mut headers = HeaderMap::new();
    headers.insert(
        CARDSCAN_STATUS_HEADER,
        HeaderValue::from_static(CARDSCAN_STATUS_REMOVED),
    );

    (
        StatusCode::OK,
        headers,
        Json(SessionResponse {
            status: CARDSCAN_STATUS_REMOVED,
            session_id,
            removed,
        }),
    )
        .into_response()
}

pub(crate) fn make_response<T: serde::Serialize>(status: MatchStatus, body: T) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        CARDSCAN_STATUS_HEADER,
        HeaderValue::from_static(status.as_header_value()),
    );
    (StatusCode::OK, headers, Json(body)).into_response()
}

/// Blank session ids are treated as absent.
pub(crate) fn normalize_session(session_id: Option<String>) -> Option<String> {
    session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub(crate) fn validate_tolerance(tolerance: Option<i64>) -> Result<Option<u32>, GatewayError> {
    match tolerance {
        None => Ok(None),
        Some(t) => u32::try_from(t).map(Some).map_err(|_| {
            GatewayError::InvalidRequest(format!(
                "tolerance must be a non-negative integer, got {}",
                t
            ))
        }),
    }
}
