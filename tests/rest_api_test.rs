//! REST surface: history, participant directory, health and metrics.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use pair_relay_service::{
    build_router,
    config::Config,
    models::{Message, ParticipantId},
    services::{InMemoryMessageStore, MessageStore},
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{seeded_state, ALICE_TOKEN, BOB_TOKEN};

struct Harness {
    app: Router,
    state: AppState,
    store: Arc<InMemoryMessageStore>,
}

async fn harness_with(config: Config) -> Harness {
    let store = Arc::new(InMemoryMessageStore::new());
    let (state, _, _) = seeded_state(config, store.clone()).await;
    Harness {
        app: build_router(state.clone()),
        state,
        store,
    }
}

async fn harness() -> Harness {
    harness_with(Config::test_defaults()).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn participant_ids(h: &Harness) -> (ParticipantId, ParticipantId) {
    let alice = h.state.directory.get_by_handle("alice").await.unwrap();
    let bob = h.state.directory.get_by_handle("bob").await.unwrap();
    (alice.participant_id(), bob.participant_id())
}

#[tokio::test]
async fn test_health_check() {
    let h = harness().await;
    let response = h.app.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_metrics_exposes_relay_collectors() {
    let h = harness().await;
    let response = h.app.clone().oneshot(get("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("pair_relay_sessions_active"));
    assert!(text.contains("pair_relay_messages_persisted_total"));
}

#[tokio::test]
async fn test_history_returns_both_directions_oldest_first() {
    let h = harness().await;
    let (alice, bob) = participant_ids(&h).await;

    h.store
        .create(&Message::new(alice, bob, "hi".into()))
        .await
        .unwrap();
    h.store
        .create(&Message::new(bob, alice, "yo".into()))
        .await
        .unwrap();

    let (status, body) = send(&h.app, get("/api/v0/messages/bob", Some(ALICE_TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    let bodies: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, ["hi", "yo"]);
    assert_eq!(body[0]["senderId"], json!(alice.as_uuid()));

    // Same conversation from the other side.
    let (status, body) = send(&h.app, get("/api/v0/messages/alice", Some(BOB_TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_history_is_capped_to_latest() {
    let mut config = Config::test_defaults();
    config.relay.history_limit = 2;
    let h = harness_with(config).await;
    let (alice, bob) = participant_ids(&h).await;

    for body in ["a", "b", "c"] {
        h.store
            .create(&Message::new(alice, bob, body.into()))
            .await
            .unwrap();
    }

    let (status, body) = send(&h.app, get("/api/v0/messages/bob", Some(ALICE_TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    let bodies: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, ["b", "c"]);
}

#[tokio::test]
async fn test_history_requires_token() {
    let h = harness().await;
    let (status, body) = send(&h.app, get("/api/v0/messages/bob", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_history_unknown_counterpart() {
    let h = harness().await;
    let (status, _) = send(&h.app, get("/api/v0/messages/mallory", Some(ALICE_TOKEN))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_users_with_search() {
    let h = harness().await;

    let (status, body) = send(&h.app, get("/api/v0/users", None)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["alice", "bob"]);

    let (status, body) = send(&h.app, get("/api/v0/users?search=AL", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["username"], "alice");
}

#[tokio::test]
async fn test_search_wildcards_match_literally() {
    let h = harness().await;

    let (status, body) = send(&h.app, get("/api/v0/users?search=_", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (_, body) = send(&h.app, get("/api/v0/users?search=%25", None)).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_user() {
    let h = harness().await;

    let (status, body) = send(
        &h.app,
        post_json(
            "/api/v0/users",
            json!({"username": "carol", "email": "carol@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "carol");
    assert!(body["id"].is_string());

    assert!(h.state.directory.get_by_handle("carol").await.is_ok());
}

#[tokio::test]
async fn test_create_user_rejects_blank_fields() {
    let h = harness().await;
    let (status, body) = send(
        &h.app,
        post_json("/api/v0/users", json!({"username": " ", "email": "x@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_create_user_rejects_duplicate() {
    let h = harness().await;
    let (status, _) = send(
        &h.app,
        post_json(
            "/api/v0/users",
            json!({"username": "alice", "email": "other@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
