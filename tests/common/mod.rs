// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use shelfwise::config::Config;
use shelfwise::db::{MemoryDb, Seed};
use shelfwise::routes::create_router;
use shelfwise::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Seeded admin user.
#[allow(dead_code)]
pub const ADMIN_ID: u64 = 1;
/// Seeded regular user.
#[allow(dead_code)]
pub const READER_ID: u64 = 2;
/// Seeded suspended user.
#[allow(dead_code)]
pub const SUSPENDED_ID: u64 = 3;

/// Create a test app backed by the built-in catalog.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = MemoryDb::from_seed(Seed::builtin().expect("built-in catalog must load"));
    let state = Arc::new(AppState::new(config, db));

    (create_router(state.clone()), state)
}

/// Build a request, optionally acting as `user_id` and sending a JSON body.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, user_id: Option<u64>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user_id {
        builder = builder.header("x-user-id", id.to_string());
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and decode the JSON response body (`Value::Null` when empty).
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[allow(dead_code)]
pub async fn get(app: &Router, uri: &str, user_id: Option<u64>) -> (StatusCode, Value) {
    send(app, request("GET", uri, user_id, None)).await
}

#[allow(dead_code)]
pub async fn post(app: &Router, uri: &str, user_id: Option<u64>, body: Value) -> (StatusCode, Value) {
    send(app, request("POST", uri, user_id, Some(body))).await
}

#[allow(dead_code)]
pub async fn put(app: &Router, uri: &str, user_id: Option<u64>, body: Value) -> (StatusCode, Value) {
    send(app, request("PUT", uri, user_id, Some(body))).await
}

#[allow(dead_code)]
pub async fn delete(app: &Router, uri: &str, user_id: Option<u64>) -> (StatusCode, Value) {
    send(app, request("DELETE", uri, user_id, None)).await
}

/// Register a fresh user and return their id.
#[allow(dead_code)]
pub async fn register(app: &Router, email: &str) -> u64 {
    let (status, body) = post(
        app,
        "/api/user",
        None,
        serde_json::json!({ "name": "Test Reader", "email": email }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["id"].as_u64().unwrap()
}

/// Check out `content` with CBE and confirm it with a correctly signed callback.
/// Returns the payment reference.
#[allow(dead_code)]
pub async fn purchase(app: &Router, state: &AppState, user_id: u64, content: Value) -> String {
    let (status, payment) = post(
        app,
        "/api/payments",
        Some(user_id),
        serde_json::json!({ "content": content, "method": "cbe" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "checkout failed: {payment}");

    let reference = payment["reference"].as_str().unwrap().to_string();
    let amount = payment["amount"].as_u64().unwrap() as u32;
    let signature = state
        .payment_service
        .sign(&reference, "TX-TEST", amount)
        .unwrap();

    let (status, body) = post(
        app,
        "/api/payments/verify",
        None,
        serde_json::json!({
            "reference": reference,
            "transaction_id": "TX-TEST",
            "signature": signature,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "verify failed: {body}");
    reference
}
