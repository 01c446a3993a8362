use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::index::{IndexError, PHashError};
use crate::matcher::{CARDSCAN_STATUS_HEADER, MatchError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid hash: {0}")]
    InvalidHash(#[from] PHashError),

    #[error("match failed: {0}")]
    MatchFailed(#[from] MatchError),

    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, cardscan_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::InvalidHash(_) => (StatusCode::BAD_REQUEST, "invalid_hash"),
            GatewayError::MatchFailed(MatchError::InvalidQuery(_))
            | GatewayError::MatchFailed(MatchError::Index(IndexError::QueryTooWide { .. })) => {
                (StatusCode::BAD_REQUEST, "invalid_query")
            }
            GatewayError::MatchFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "match_error"),
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            CARDSCAN_STATUS_HEADER,
            HeaderValue::from_static(cardscan_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
