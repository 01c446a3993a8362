use std::sync::Arc;

use axum::{Router, body::Body, http::Request, http::StatusCode, response::IntoResponse};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::cache::SessionCache;
use crate::catalog::catalog_digest;
use crate::gateway::create_router_with_state;
use crate::gateway::error::GatewayError;
use crate::gateway::handler::{normalize_session, validate_tolerance};
use crate::gateway::state::HandlerState;
use crate::index::{CatalogItem, CountingIndex, IndexError, PHash, PHashError, TrieIndex};
use crate::matcher::{CARDSCAN_STATUS_HEADER, CardMatcher, MatchError};

const BITS: usize = 64;

fn catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new(
            "bolt",
            "Lightning Bolt",
            "lea",
            PHash::from_u64(0, BITS).unwrap(),
        ),
        CatalogItem::new(
            "counterspell",
            "Counterspell",
            "lea",
            PHash::from_u64(u64::MAX, BITS).unwrap(),
        ),
    ]
}

type TestIndex = CountingIndex<TrieIndex>;

fn setup_state() -> HandlerState<TestIndex> {
    let items = catalog();
    let digest = catalog_digest(&items);
    let index = Arc::new(CountingIndex::new(TrieIndex::build(items, BITS).unwrap()));
    let matcher = CardMatcher::new(index, SessionCache::default());
    HandlerState::new(Arc::new(matcher), digest)
}

fn create_test_router(state: HandlerState<TestIndex>) -> Router {
    create_router_with_state(state)
}

async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    body: Value,
) -> axum::response::Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

async fn send_empty(router: &Router, method: &str, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

fn status_header(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(CARDSCAN_STATUS_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = create_test_router(setup_state());
    let response = send_empty(&router, "GET", "/healthz").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "healthy");
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let router = create_test_router(setup_state());
    let response = send_empty(&router, "GET", "/ready").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "ready");
    assert_eq!(body_json(response).await["items"], 2);
}

#[tokio::test]
async fn test_ready_endpoint_empty_catalog() {
    let index = Arc::new(CountingIndex::new(TrieIndex::build(Vec::new(), BITS).unwrap()));
    let matcher = CardMatcher::new(index, SessionCache::default());
    let router = create_test_router(HandlerState::new(Arc::new(matcher), ""));

    let response = send_empty(&router, "GET", "/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(status_header(&response), "not_ready");
}

#[tokio::test]
async fn test_index_endpoint() {
    let state = setup_state();
    let digest = state.catalog_digest.clone();
    let router = create_test_router(state);

    let response = send_empty(&router, "GET", "/v1/index").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["kind"], "trie");
    assert_eq!(body["bit_length"], 64);
    assert_eq!(body["items"], 2);
    assert_eq!(body["default_tolerance"], 24);
    assert_eq!(body["catalog_digest"], digest);
    assert_eq!(body["session_ttl_ms"], 750);
    assert!(body["description"].as_str().unwrap().starts_with("trie(bit_length=64"));
}

#[tokio::test]
async fn test_match_index_hit() {
    let router = create_test_router(setup_state());
    let response = send_json(
        &router,
        "POST",
        "/v1/match",
        json!({"hash": "0x7", "coordinates": [[0, 0], [1, 0], [1, 1], [0, 1]]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "HIT_INDEX");

    let body = body_json(response).await;
    assert_eq!(body["status"], "HIT_INDEX");
    assert_eq!(body["result"]["cardData"]["id"], "bolt");
    assert_eq!(body["result"]["cardData"]["name"], "Lightning Bolt");
    assert!(body["result"]["cardData"].get("hash").is_none());
    assert_eq!(body["result"]["distance"], 3);
    assert_eq!(body["result"]["match"], 0.95);
    assert_eq!(body["result"]["coordinates"], json!([[0, 0], [1, 0], [1, 1], [0, 1]]));
}

#[tokio::test]
async fn test_match_session_hit_skips_index() {
    let state = setup_state();
    let index = Arc::clone(state.matcher.index());
    let router = create_test_router(state);

    let first = send_json(&router, "POST", "/v1/match", json!({"session_id": "s1", "hash": 1})).await;
    assert_eq!(status_header(&first), "HIT_INDEX");
    assert_eq!(index.queries(), 1);

    let second = send_json(&router, "POST", "/v1/match", json!({"session_id": "s1", "hash": 3})).await;
    assert_eq!(status_header(&second), "HIT_SESSION");
    assert_eq!(index.queries(), 1);
    assert_eq!(body_json(second).await["result"]["distance"], 2);
}

#[tokio::test]
async fn test_match_miss_is_ok() {
    let router = create_test_router(setup_state());
    let response = send_json(
        &router,
        "POST",
        "/v1/match",
        json!({"hash": "ffffffff", "tolerance": 4}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "MISS");
    let body = body_json(response).await;
    assert_eq!(body["status"], "MISS");
    assert!(body["result"].is_null());
}

#[tokio::test]
async fn test_match_rejects_negative_tolerance() {
    let router = create_test_router(setup_state());
    let response = send_json(&router, "POST", "/v1/match", json!({"hash": "0", "tolerance": -1})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(status_header(&response), "invalid_request");
    let body = body_json(response).await;
    assert_eq!(body["code"], 400);
    assert!(body["error"].as_str().unwrap().contains("non-negative"));
}

#[tokio::test]
async fn test_match_rejects_wide_hash() {
    let router = create_test_router(setup_state());
    let response = send_json(
        &router,
        "POST",
        "/v1/match",
        json!({"hash": "1ffffffffffffffff"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(status_header(&response), "invalid_hash");
}

#[tokio::test]
async fn test_match_rejects_bad_schema() {
    let router = create_test_router(setup_state());
    let response = send_json(&router, "POST", "/v1/match", json!({"phash": "00"})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(status_header(&response), "invalid_request");
}

#[tokio::test]
async fn test_frames_drop_unmatched_and_keep_order() {
    let router = create_test_router(setup_state());
    let response = send_json(
        &router,
        "POST",
        "/v1/frames",
        json!({
            "session_id": "table-3",
            "cards": [
                {"hash": "fffffffffffffffe", "coordinates": "left"},
                {"hash": "00000000ffffffff"},
                {"hash": "0000000000000001", "coordinates": "right"}
            ]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "HIT_INDEX");

    let body = body_json(response).await;
    assert_eq!(body["cards"], 3);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["cardData"]["id"], "counterspell");
    assert_eq!(results[0]["coordinates"], "left");
    assert_eq!(results[1]["cardData"]["id"], "bolt");
    assert_eq!(results[1]["coordinates"], "right");
}

#[tokio::test]
async fn test_frames_empty() {
    let router = create_test_router(setup_state());
    let response = send_json(&router, "POST", "/v1/frames", json!({"cards": []})).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "MISS");
    assert_eq!(body_json(response).await["results"], json!([]));
}

#[tokio::test]
async fn test_frames_reject_invalid_card() {
    let router = create_test_router(setup_state());
    let response = send_json(
        &router,
        "POST",
        "/v1/frames",
        json!({"cards": [{"hash": "00"}, {"hash": "xyz"}]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(status_header(&response), "invalid_hash");
}

#[tokio::test]
async fn test_end_session() {
    let state = setup_state();
    let matcher = Arc::clone(&state.matcher);
    let router = create_test_router(state);

    send_json(&router, "POST", "/v1/match", json!({"session_id": "s1", "hash": 0})).await;
    assert!(matcher.sessions().contains("s1"));

    let response = send_empty(&router, "DELETE", "/v1/sessions/s1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "removed");
    let body = body_json(response).await;
    assert_eq!(body["session_id"], "s1");
    assert_eq!(body["removed"], true);
    assert!(!matcher.sessions().contains("s1"));

    let again = send_empty(&router, "DELETE", "/v1/sessions/s1").await;
    assert_eq!(body_json(again).await["removed"], false);
}

#[test]
fn test_normalize_session() {
    assert_eq!(normalize_session(Some(" s1 ".into())), Some("s1".into()));
    assert_eq!(normalize_session(Some("   ".into())), None);
    assert_eq!(normalize_session(None), None);
}

#[test]
fn test_validate_tolerance() {
    assert_eq!(validate_tolerance(None).unwrap(), None);
    assert_eq!(validate_tolerance(Some(0)).unwrap(), Some(0));
    assert_eq!(validate_tolerance(Some(96)).unwrap(), Some(96));
    assert!(validate_tolerance(Some(-1)).is_err());
    assert!(validate_tolerance(Some(i64::MAX)).is_err());
}

#[test]
fn test_error_status_codes() {
    let cases = [
        (
            GatewayError::InvalidRequest("bad".into()),
            StatusCode::BAD_REQUEST,
            "invalid_request",
        ),
        (
            GatewayError::InvalidHash(PHashError::Empty),
            StatusCode::BAD_REQUEST,
            "invalid_hash",
        ),
        (
            GatewayError::MatchFailed(MatchError::InvalidQuery("wide".into())),
            StatusCode::BAD_REQUEST,
            "invalid_query",
        ),
        (
            GatewayError::MatchFailed(MatchError::Index(IndexError::QueryTooWide {
                bits: 70,
                bit_length: 64,
            })),
            StatusCode::BAD_REQUEST,
            "invalid_query",
        ),
        (
            GatewayError::MatchFailed(MatchError::Index(IndexError::InvalidBitLength {
                bit_length: 0,
            })),
            StatusCode::INTERNAL_SERVER_ERROR,
            "match_error",
        ),
        (
            GatewayError::InternalError("boom".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
        ),
    ];

    for (error, expected_status, expected_header) in cases {
        let response = error.into_response();
        assert_eq!(response.status(), expected_status);
        assert_eq!(status_header(&response), expected_header);
    }
}
