mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use api_lib::adapters::SandboxPaymentAdapter;
use common::{build_test_app, build_test_app_with, test_config};

#[tokio::test]
async fn operator_routes_are_absent_without_a_token() {
    let mut config = test_config();
    config.admin_token = None;
    let app = build_test_app_with(config, Arc::new(SandboxPaymentAdapter::new())).await;

    let (status, _) = app.admin("GET", "/admin/reviews/pending", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_or_missing_token_is_unauthorized() {
    let app = build_test_app().await;

    let (status, _) = app.call("GET", "/admin/reviews/pending", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call_with_headers(
            "GET",
            "/admin/reviews/pending",
            None,
            &[("x-admin-token", "guess")],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn approving_a_pending_review_makes_it_public() {
    let app = build_test_app().await;

    let (status, pending) = app.admin("GET", "/admin/reviews/pending", None).await;
    assert_eq!(status, StatusCode::OK);
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    let review_id = pending[0]["review"]["id"].as_str().unwrap().to_string();

    let (status, review) = app
        .admin(
            "POST",
            &format!("/admin/catalog/aria/reviews/{}/decision", review_id),
            Some(json!({ "decision": "approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["status"], "approved");

    let (_, item) = app.json("GET", "/catalog/aria", None).await;
    assert_eq!(item["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(item["average_rating"], 2.5);

    let (_, pending) = app.admin("GET", "/admin/reviews/pending", None).await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deciding_an_unknown_review_is_not_found() {
    let app = build_test_app().await;

    let (status, _) = app
        .admin(
            "POST",
            "/admin/catalog/aria/reviews/review-missing/decision",
            Some(json!({ "decision": "rejected" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hidden_trusted_review_never_reaches_the_storefront() {
    let app = build_test_app().await;

    let (status, review) = app
        .admin(
            "POST",
            "/admin/catalog/bea/reviews",
            Some(json!({ "author": "Staff", "rating": 5, "comment": "Lead", "hide_from_public": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["status"], "approved");

    let (_, item) = app.json("GET", "/catalog/bea", None).await;
    assert!(item["reviews"].as_array().unwrap().is_empty());
    assert_eq!(item["average_rating"], 0.0);
}
