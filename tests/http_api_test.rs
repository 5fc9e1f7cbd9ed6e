mod common;

use axum::{
    body,
    http::{Method, StatusCode},
};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{technician, TestApp};

async fn body_json(response: axum::response::Response<axum::body::Body>) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not json")
}

#[tokio::test]
async fn health_endpoint_needs_no_identity() {
    let app = TestApp::new().await;

    let response = app.request_anonymous(Method::GET, "/api/v1/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["checks"]["database"], "healthy");
}

#[tokio::test]
async fn mutations_without_identity_headers_are_unauthorized() {
    let app = TestApp::new().await;

    let response = app.request_anonymous(Method::POST, "/api/v1/job-cards").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn job_card_create_and_fetch_over_http() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);

    let response = app
        .request(
            Method::POST,
            "/api/v1/job-cards",
            &tech,
            Some(json!({ "ticket_id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["status"], "pending");
    assert_eq!(created["dealer_id"], json!(dealer));

    let job_id = created["id"].as_str().unwrap().to_string();
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/job-cards/{}", job_id),
            &tech,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Another dealer's staff is locked out with 403.
    let outsider = technician(Uuid::new_v4());
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/job-cards/{}", job_id),
            &outsider,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Illegal lifecycle jumps map to 409.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/job-cards/{}/submit-qc", job_id),
            &tech,
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let conflict = body_json(response).await;
    assert_eq!(conflict["error"], "Conflict");
    assert!(conflict["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid transition"));
}

#[tokio::test]
async fn inventory_listing_is_paginated_and_dealer_scoped() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);

    app.seed_product(dealer, "HTTP-A", 3, dec!(10.00)).await;
    app.seed_product(dealer, "HTTP-B", 9, dec!(20.00)).await;
    app.seed_product(Uuid::new_v4(), "HTTP-FOREIGN", 5, dec!(5.00))
        .await;

    let response = app
        .request(Method::GET, "/api/v1/inventory?page=1&per_page=10", &tech, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn bad_reference_type_on_stock_adjust_is_a_400() {
    let app = TestApp::new().await;
    let dealer = Uuid::new_v4();
    let tech = technician(dealer);
    let product = app.seed_product(dealer, "HTTP-ADJ", 5, dec!(10.00)).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/inventory/{}/adjust", product.id),
            &tech,
            Some(json!({
                "delta": -1,
                "reference_type": "teleport",
                "reference_id": Uuid::new_v4(),
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/inventory/{}/adjust", product.id),
            &tech,
            Some(json!({
                "delta": -1,
                "reference_type": "sale",
                "reference_id": Uuid::new_v4(),
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let movement = body_json(response).await;
    assert_eq!(movement["quantity_after"], 4);
}
