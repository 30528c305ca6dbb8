//! HTTP API integration tests.
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`.
//!
//! Run with: `cargo test --test http_api_test`

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use boxoffice::catalog::InMemoryCatalog;
use boxoffice::{AppState, Config, EventDefinition, build_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, AppState) {
    let catalog = InMemoryCatalog::with_definitions([
        EventDefinition::new("Open Air", 2, 2),
        EventDefinition::new("Headliner", 2, 2).gated(true).with_max_active(1),
    ]);
    let state = AppState::new(Config::default(), Arc::new(catalog));
    (build_router(state.clone()), state)
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn login(app: &Router, buyer: &str) -> String {
    let (status, body) = call(app, "POST", "/api/auth/session", None, Some(json!({"buyerId": buyer}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = app();
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_list_and_fetch_events() {
    let (app, _) = app();

    let (status, body) = call(&app, "POST", "/api/events", None, Some(json!({"name": "Gala", "rows": 3}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rows"], 3);
    assert_eq!(body["cols"], 15);
    assert_eq!(body["available"], 45);

    let (status, body) = call(&app, "POST", "/api/events", None, Some(json!({"name": "Gala"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_EXISTS");

    let (status, body) = call(&app, "POST", "/api/events", None, Some(json!({"name": "Void", "rows": 0}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_DEFINITION");

    let (status, body) = call(
        &app,
        "POST",
        "/api/events",
        None,
        Some(json!({"name": "Stadium", "rows": u32::MAX, "cols": u32::MAX})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_DEFINITION");

    let (status, body) = call(&app, "GET", "/api/events", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = call(&app, "GET", "/api/events/Gala", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seats"].as_array().unwrap().len(), 3);
    assert_eq!(body["queueLength"], 0);

    let (status, body) = call(&app, "GET", "/api/events/Nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn trading_requires_a_valid_token() {
    let (app, _) = app();
    let seat = json!({"row": 0, "col": 0});

    let (status, _) = call(&app, "POST", "/api/events/Open%20Air/hold", None, Some(seat.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "POST", "/api/events/Open%20Air/hold", Some("forged"), Some(seat)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn hold_purchase_and_conflict_over_http() {
    let (app, state) = app();
    let u1 = login(&app, "u1").await;
    let u2 = login(&app, "u2").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/events/Open%20Air/hold",
        Some(&u1),
        Some(json!({"seats": [{"row": 0, "col": 0}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiresInMs"], 120_000);
    assert_eq!(body["seats"][0]["row"], 0);

    let (status, body) = call(&app, "POST", "/api/events/Open%20Air/purchase", Some(&u1), Some(json!({"row": 0, "col": 0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticketCount"], 1);

    let (status, body) = call(&app, "POST", "/api/events/Open%20Air/hold", Some(&u2), Some(json!({"row": 0, "col": 0}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SEAT_UNAVAILABLE");
    assert_eq!(body["details"], json!({"row": 0, "col": 0}));

    let (status, body) = call(&app, "POST", "/api/events/Open%20Air/hold", Some(&u2), Some(json!({"row": 5, "col": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_SEAT");

    // Ledger writes run in the background.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    let (status, body) = call(&app, "GET", "/api/me/tickets", Some(&u1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let event = state.registry.get(&"Open Air".into()).await.unwrap();
    assert_eq!(event.summary().await.sold, 1);
}

#[tokio::test]
async fn unhold_is_idempotent() {
    let (app, _) = app();
    let u1 = login(&app, "u1").await;

    call(&app, "POST", "/api/events/Open%20Air/hold", Some(&u1), Some(json!({"row": 1, "col": 1}))).await;
    for _ in 0..2 {
        let (status, _) = call(&app, "POST", "/api/events/Open%20Air/unhold", Some(&u1), Some(json!({"row": 1, "col": 1}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (_, body) = call(&app, "GET", "/api/events/Open%20Air", None, None).await;
    assert_eq!(body["seats"][1][1], "available");
}

#[tokio::test]
async fn gated_queue_over_http() {
    let (app, _) = app();
    let a = login(&app, "a").await;
    let b = login(&app, "b").await;

    let (status, body) = call(&app, "POST", "/api/queue/Headliner/join", Some(&a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"admitted": true, "position": 0, "activeCount": 1, "queueLength": 0}));

    let (_, body) = call(&app, "POST", "/api/queue/Headliner/join", Some(&b), None).await;
    assert_eq!(body["admitted"], false);
    assert_eq!(body["position"], 1);

    let (status, body) = call(&app, "POST", "/api/events/Headliner/hold", Some(&b), Some(json!({"row": 0, "col": 0}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_ADMITTED");

    let (status, _) = call(&app, "POST", "/api/queue/Headliner/leave", Some(&a), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = call(&app, "GET", "/api/queue/Headliner/status", Some(&b), None).await;
    assert_eq!(body["admitted"], true);
}

#[tokio::test]
async fn ended_sessions_are_rejected() {
    let (app, _) = app();
    let token = login(&app, "ada").await;

    let (status, _) = call(&app, "DELETE", "/api/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "GET", "/api/me/tickets", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "POST", "/api/auth/session", None, Some(json!({"buyerId": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
