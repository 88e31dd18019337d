//! services/api/src/web/admin.rs
//!
//! Trusted-operator endpoints: the review moderation queue and operator-authored
//! reviews. Mounted only when an admin token is configured.

use crate::error::{session_error, HandlerError};
use crate::web::state::AppState;
use aura_core::{ModerationDecision, TrustedReview};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct DecisionRequest {
    /// `approved` or `rejected`.
    #[schema(value_type = String)]
    pub decision: ModerationDecision,
}

#[derive(Deserialize, ToSchema)]
pub struct TrustedReviewRequest {
    pub author: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    /// Lead comments are stored approved but never shown publicly.
    #[serde(default)]
    pub hide_from_public: bool,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[utoipa::path(
    get,
    path = "/admin/reviews/pending",
    params(("x-admin-token" = String, Header, description = "Operator token")),
    responses(
        (status = 200, description = "Pending reviews across the catalog, newest first"),
        (status = 401, description = "Missing or wrong operator token")
    )
)]
pub async fn list_pending_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pending = state.session.lock().await.pending_reviews();
    Json(pending)
}

#[utoipa::path(
    post,
    path = "/admin/catalog/{item_id}/reviews/{review_id}/decision",
    params(
        ("item_id" = String, Path, description = "Catalog item id"),
        ("review_id" = String, Path, description = "Review id"),
        ("x-admin-token" = String, Header, description = "Operator token")
    ),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "The review after the decision"),
        (status = 404, description = "No such review under that item")
    )
)]
pub async fn decide_review_handler(
    State(state): State<Arc<AppState>>,
    Path((item_id, review_id)): Path<(String, String)>,
    Json(req): Json<DecisionRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let review = state
        .session
        .lock()
        .await
        .decide_review(&item_id, &review_id, req.decision)
        .await
        .map_err(session_error)?;
    Ok(Json(review))
}

#[utoipa::path(
    post,
    path = "/admin/catalog/{item_id}/reviews",
    params(
        ("item_id" = String, Path, description = "Catalog item id"),
        ("x-admin-token" = String, Header, description = "Operator token")
    ),
    request_body = TrustedReviewRequest,
    responses(
        (status = 201, description = "Review stored as approved"),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "Unknown item")
    )
)]
pub async fn add_review_handler(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
    Json(req): Json<TrustedReviewRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if req.author.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "author is required".to_string()));
    }
    let trusted = TrustedReview {
        author: req.author.trim().to_string(),
        rating: req.rating,
        comment: req.comment,
        hide_from_public: req.hide_from_public,
        avatar: req.avatar,
    };
    let review = state
        .session
        .lock()
        .await
        .add_trusted_review(&item_id, trusted)
        .await
        .map_err(session_error)?;
    Ok((StatusCode::CREATED, Json(review)))
}
