//! Payment API tests
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use voicelive_assistant::{AssistantConfig, routes, state::AppState};

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn post_payment(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/payment")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = routes::create_app(AppState::new(AssistantConfig::default()));
    let (status, body) = send(app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "OK"}));
}

#[tokio::test]
async fn test_submit_payment_normalizes_phone() {
    let state = AppState::new(AssistantConfig::default());
    let app = routes::create_app(state.clone());

    let (status, body) = send(
        app,
        post_payment(json!({
            "policy_number": "POL-1001",
            "phone_number": "+91 70452 89568",
            "amount_due": 1250.5,
            "payment_date": "2025-01-15"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Payment recorded successfully");
    assert!(body["customer_id"].as_str().is_some_and(|id| !id.is_empty()));

    let records = state.payments.list();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].phone_number, "+91-7045289568");
    assert_eq!(records[0].policy_number, "POL-1001");
    assert_eq!(records[0].payment_status, "completed");
    assert_eq!(body["customer_id"], records[0].customer_id.as_str());
}

#[tokio::test]
async fn test_invalid_phone_is_rejected() {
    let state = AppState::new(AssistantConfig::default());
    let app = routes::create_app(state.clone());

    let (status, body) = send(
        app,
        post_payment(json!({"policy_number": "POL-1", "phone_number": "123", "amount_due": 10})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "error": "Invalid phone number format"})
    );
    assert!(state.payments.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = routes::create_app(AppState::new(AssistantConfig::default()));

    let request = Request::builder()
        .method("POST")
        .uri("/api/payment")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_list_payments_newest_first() {
    let state = AppState::new(AssistantConfig::default());

    for (policy, phone) in [("POL-1", "7045289568"), ("POL-2", "917045289569")] {
        let app = routes::create_app(state.clone());
        let (status, _) = send(
            app,
            post_payment(json!({
                "policy_number": policy,
                "phone_number": phone,
                "amount_due": 99.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let app = routes::create_app(state);
    let (status, body) = send(app, get("/api/payments")).await;
    assert_eq!(status, StatusCode::OK);

    let payments = body["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0]["policy_number"], "POL-2");
    assert_eq!(payments[0]["phone_number"], "+91-7045289569");
    assert_eq!(payments[0]["id"], 2);
    assert_eq!(payments[1]["policy_number"], "POL-1");
}

#[tokio::test]
async fn test_lookup_payments_by_phone() {
    let state = AppState::new(AssistantConfig::default());

    for (policy, phone) in [
        ("POL-1", "7045289568"),
        ("POL-2", "9876543210"),
        ("POL-3", "(704) 528-9568"),
    ] {
        let app = routes::create_app(state.clone());
        let (status, _) = send(
            app,
            post_payment(json!({"policy_number": policy, "phone_number": phone})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let app = routes::create_app(state.clone());
    let (status, body) = send(app, get("/api/payments/lookup?phone_number=917045289568")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], true);
    assert_eq!(
        body["message"],
        "Found 2 payment record(s) for phone number +91-7045289568"
    );
    let details = body["payment_details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["policy_number"], "POL-3");
    assert_eq!(details[1]["policy_number"], "POL-1");

    let app = routes::create_app(state);
    let (status, body) = send(app, get("/api/payments/lookup?phone_number=1111111111")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "found": false,
            "payment_details": [],
            "message": "No payment records found for phone number +91-1111111111"
        })
    );
}

#[tokio::test]
async fn test_lookup_rejects_invalid_phone() {
    let app = routes::create_app(AppState::new(AssistantConfig::default()));
    let (status, body) = send(app, get("/api/payments/lookup?phone_number=123")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["found"], false);
    assert_eq!(body["message"], "Invalid phone number format: 123");

    let app = routes::create_app(AppState::new(AssistantConfig::default()));
    let (status, _) = send(app, get("/api/payments/lookup")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
