//! Black-box tests of the HTTP API over the in-memory ledger.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use smallbank_gateway::config::AuthConfig;
use smallbank_gateway::{build_router, AppState};
use smallbank_ledger::storage::MemoryAdapter;
use smallbank_ledger::{LedgerEngine, LockConfig};

fn test_app() -> Router {
    let engine = LedgerEngine::new(Arc::new(MemoryAdapter::new()), LockConfig::default());
    build_router(AppState::new(Arc::new(engine), &AuthConfig::default()))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": "admin", "password": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn event(app: &Router, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/event", Some(token), Some(body)).await
}

async fn balance(app: &Router, token: &str, account: &str) -> (StatusCode, Value) {
    let uri = format!("/api/balance?account_id={account}");
    send(app, Method::GET, &uri, Some(token), None).await
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "storage": "memory"}));
}

#[tokio::test]
async fn requests_without_valid_token_are_rejected() {
    let app = test_app();

    let (status, body) = balance(&app, "not-a-jwt", "acc1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/event",
        None,
        Some(json!({"type": "deposit", "destination": "acc1", "amount": 100})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // nothing reached the ledger
    let token = login(&app).await;
    let (status, _) = balance(&app, &token, "acc1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, metrics) = send(&app, Method::GET, "/metrics", None, None).await;
    assert_eq!(metrics["auth_failures"], 2);
    assert_eq!(metrics["deposits"], 0);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": "admin", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deposit_withdraw_transfer_flow() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) = event(
        &app,
        &token,
        json!({"type": "deposit", "destination": "acc1", "amount": 100}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["destination"]["id"], "acc1");
    assert_eq!(body["destination"]["balance"].as_f64(), Some(100.0));
    assert!(body.get("origin").is_none());

    let (status, body) = event(
        &app,
        &token,
        json!({"type": "withdraw", "origin": "acc1", "amount": 150}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_FUNDS");

    let (status, body) = event(
        &app,
        &token,
        json!({"type": "transfer", "origin": "acc1", "destination": "acc2", "amount": 40}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["origin"]["balance"].as_f64(), Some(60.0));
    assert_eq!(body["destination"]["id"], "acc2");
    assert_eq!(body["destination"]["balance"].as_f64(), Some(40.0));

    let (status, body) = balance(&app, &token, "acc1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"].as_f64(), Some(60.0));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/transactions?account_id=acc2",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["type"], "transfer");
    assert_eq!(transactions[0]["account_id"], "acc1");
    assert_eq!(transactions[0]["destination_account_id"], "acc2");
    assert_eq!(transactions[0]["amount"].as_f64(), Some(40.0));

    let (_, metrics) = send(&app, Method::GET, "/metrics", None, None).await;
    assert_eq!(metrics["deposits"], 1);
    assert_eq!(metrics["transfers"], 1);
    assert_eq!(metrics["rejected"], 1);
}

#[tokio::test]
async fn numeric_ids_match_string_ids() {
    let app = test_app();
    let token = login(&app).await;

    let (status, _) = event(
        &app,
        &token,
        json!({"type": "deposit", "destination": 100, "amount": "12.5"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = balance(&app, &token, "100").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"].as_f64(), Some(12.5));
}

#[tokio::test]
async fn invalid_events_are_bad_requests() {
    let app = test_app();
    let token = login(&app).await;

    for body in [
        json!({"type": "deposit", "destination": "acc1", "amount": 0}),
        json!({"type": "deposit", "destination": "acc1", "amount": -5}),
        json!({"type": "deposit", "destination": "acc1", "amount": 1.001}),
        json!({"type": "deposit", "destination": "", "amount": 1}),
        json!({"type": "deposit", "amount": 1}),
        json!({"type": "refund", "destination": "acc1", "amount": 1}),
        json!({"type": "transfer", "origin": "acc1", "destination": "acc1", "amount": 1}),
    ] {
        let (status, response) = event(&app, &token, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body} gave {response}");
    }

    let (status, _) = balance(&app, &token, "acc1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/api/balance", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn withdraw_from_unknown_account() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) = event(
        &app,
        &token,
        json!({"type": "withdraw", "origin": "ghost", "amount": 10}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Account not found", "code": "ACCOUNT_NOT_FOUND"}));
}

#[tokio::test]
async fn reset_clears_accounts() {
    let app = test_app();
    let token = login(&app).await;
    event(
        &app,
        &token,
        json!({"type": "deposit", "destination": "acc1", "amount": 100}),
    )
    .await;

    let (status, body) = send(&app, Method::POST, "/api/reset", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = balance(&app, &token, "acc1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn account_endpoints() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/account",
        Some(&token),
        Some(json!({"id": "acc9", "initial_balance": 25})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["balance"].as_f64(), Some(25.0));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/account?account_id=acc9",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "acc9");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/account?account_id=nobody",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/transactions?account_id=acc9",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"], json!([]));
}
