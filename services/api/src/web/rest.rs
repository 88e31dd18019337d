//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the storefront REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{session_error, HandlerError};
use crate::web::{admin, auth, state::AppState, verification_task::verification_process};
use aura_core::domain::{CardDetails, CatalogItem, CustomerDetails, Notification, VerificationDetails};
use aura_core::{moderation, AgeRange, CatalogSort, SessionError, SessionFacade};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::social_callback_handler,
        list_catalog_handler,
        get_catalog_item_handler,
        get_profile_handler,
        update_profile_handler,
        update_avatar_handler,
        submit_verification_handler,
        list_notifications_handler,
        mark_read_handler,
        mark_all_read_handler,
        list_toasts_handler,
        dismiss_toast_handler,
        list_favorites_handler,
        toggle_favorite_handler,
        get_cart_handler,
        put_cart_handler,
        clear_cart_handler,
        checkout_handler,
        list_purchases_handler,
        get_active_call_handler,
        set_active_call_handler,
        clear_active_call_handler,
        submit_feedback_handler,
        admin::list_pending_handler,
        admin::decide_review_handler,
        admin::add_review_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            UpdateProfileRequest,
            AvatarRequest,
            CartRequest,
            CheckoutRequest,
            ActiveCallRequest,
            FeedbackRequest,
            FavoriteResponse,
            admin::DecisionRequest,
            admin::TrustedReviewRequest,
        )
    ),
    tags(
        (name = "Aura Storefront API", description = "Session, catalog and call endpoints for the storefront.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A catalog item as shoppers see it: only public reviews, plus derived fields.
#[derive(Serialize)]
pub struct CatalogItemView {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub average_rating: f64,
    pub is_favorite: bool,
}

impl CatalogItemView {
    fn build(session: &SessionFacade, item: &CatalogItem) -> Self {
        Self {
            item: moderation::public_snapshot(item),
            average_rating: moderation::public_average(item),
            is_favorite: session.is_favorite(&item.id),
        }
    }
}

#[derive(Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct FavoriteResponse {
    pub item_id: String,
    pub is_favorite: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AvatarRequest {
    pub url: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CartRequest {
    pub item_id: String,
    pub offering_id: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[schema(value_type = Object)]
    pub customer: CustomerDetails,
    #[schema(value_type = Object)]
    pub card: CardDetails,
}

#[derive(Deserialize, ToSchema)]
pub struct ActiveCallRequest {
    /// Purchase timestamp in epoch milliseconds.
    pub purchased_at: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// Storefront browsing controls for `GET /catalog`.
#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// Age bracket: `18-24`, `25-29` or `30-99`.
    #[param(value_type = Option<String>)]
    pub age: Option<AgeRange>,
    /// `status` (default), `rating`, `price_asc` or `price_desc`.
    #[param(value_type = Option<String>)]
    pub sort: Option<CatalogSort>,
}

/// Purchases are addressed by their timestamp in epoch milliseconds.
fn purchase_key(millis: i64) -> Result<DateTime<Utc>, HandlerError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| session_error(SessionError::PurchaseNotFound(millis)))
}

//=========================================================================================
// Catalog
//=========================================================================================

/// List the catalog with public reviews and ratings, online items first.
#[utoipa::path(
    get,
    path = "/catalog",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Catalog items in storefront order"),
        (status = 400, description = "Unknown age bracket or sort key")
    )
)]
pub async fn list_catalog_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let session = state.session.lock().await;
    let items: Vec<CatalogItemView> = session
        .catalog()
        .browse(query.age, query.sort.unwrap_or_default())
        .into_iter()
        .map(|item| CatalogItemView::build(&session, item))
        .collect();
    Json(items)
}

#[utoipa::path(
    get,
    path = "/catalog/{id}",
    params(("id" = String, Path, description = "Catalog item id")),
    responses(
        (status = 200, description = "The catalog item"),
        (status = 404, description = "Unknown item")
    )
)]
pub async fn get_catalog_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = state.session.lock().await;
    let item = session
        .catalog()
        .item(&id)
        .ok_or_else(|| session_error(SessionError::ItemNotFound(id.clone())))?;
    Ok(Json(CatalogItemView::build(&session, item)))
}

//=========================================================================================
// Profile
//=========================================================================================

#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The signed-in profile"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn get_profile_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HandlerError> {
    let session = state.session.lock().await;
    let profile = session
        .profile()
        .ok_or_else(|| session_error(SessionError::NotAuthenticated))?;
    Ok(Json(profile.clone()))
}

#[utoipa::path(
    patch,
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile details saved"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if req.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".to_string()));
    }
    let mut session = state.session.lock().await;
    let profile = session
        .update_profile(req.name.trim().to_string(), req.bio)
        .await
        .map_err(session_error)?;
    Ok(Json(profile.clone()))
}

#[utoipa::path(
    put,
    path = "/profile/avatar",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Profile picture updated"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn update_avatar_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AvatarRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut session = state.session.lock().await;
    let profile = session.update_avatar(req.url).await.map_err(session_error)?;
    Ok(Json(profile.clone()))
}

/// Submit identity documents. The review completes on its own after a delay.
#[utoipa::path(
    post,
    path = "/profile/verification",
    request_body(content = Object),
    responses(
        (status = 202, description = "Verification pending"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn submit_verification_handler(
    State(state): State<Arc<AppState>>,
    Json(details): Json<VerificationDetails>,
) -> Result<impl IntoResponse, HandlerError> {
    let profile = {
        let mut session = state.session.lock().await;
        session
            .submit_verification(details)
            .await
            .map_err(session_error)?
            .clone()
    };
    info!("Verification submitted; review scheduled");
    tokio::spawn(verification_process(state.clone(), profile.email.clone()));
    Ok((StatusCode::ACCEPTED, Json(profile)))
}

//=========================================================================================
// Notifications and Toasts
//=========================================================================================

#[utoipa::path(
    get,
    path = "/notifications",
    responses((status = 200, description = "The notification log, oldest first, with the unread count"))
)]
pub async fn list_notifications_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.lock().await;
    Json(NotificationsResponse {
        notifications: session.notifications().to_vec(),
        unread_count: session.unread_count(),
    })
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses((status = 204, description = "Marked read; unknown ids are ignored"))
)]
pub async fn mark_read_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    state.session.lock().await.mark_read(&id).await;
    state.toasts.notify_changed();
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    post,
    path = "/notifications/read-all",
    responses((status = 204, description = "Every notification marked read"))
)]
pub async fn mark_all_read_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.session.lock().await.mark_all_read().await;
    state.toasts.notify_changed();
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/toasts",
    responses((status = 200, description = "Unread notifications that have not been dismissed"))
)]
pub async fn list_toasts_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.lock().await;
    let toasts: Vec<Notification> = session.active_toasts().into_iter().cloned().collect();
    Json(toasts)
}

#[utoipa::path(
    post,
    path = "/toasts/{id}/dismiss",
    params(("id" = String, Path, description = "Notification id")),
    responses((status = 204, description = "Toast hidden; the notification stays unread"))
)]
pub async fn dismiss_toast_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    state.session.lock().await.dismiss_toast(&id);
    state.toasts.cancel(&id).await;
    state.toasts.notify_changed();
    StatusCode::NO_CONTENT
}

//=========================================================================================
// Favorites
//=========================================================================================

#[utoipa::path(
    get,
    path = "/favorites",
    responses((status = 200, description = "Favorite catalog items, in catalog order"))
)]
pub async fn list_favorites_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.lock().await;
    let items: Vec<CatalogItemView> = session
        .favorite_items()
        .into_iter()
        .map(|item| CatalogItemView::build(&session, item))
        .collect();
    Json(items)
}

#[utoipa::path(
    post,
    path = "/favorites/{id}/toggle",
    params(("id" = String, Path, description = "Catalog item id")),
    responses(
        (status = 200, description = "Membership after the toggle", body = FavoriteResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn toggle_favorite_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let is_favorite = state
        .session
        .lock()
        .await
        .toggle_favorite(&id)
        .await
        .map_err(session_error)?;
    Ok(Json(FavoriteResponse {
        item_id: id,
        is_favorite,
    }))
}

//=========================================================================================
// Cart, Checkout and Purchases
//=========================================================================================

#[utoipa::path(
    get,
    path = "/cart",
    responses((status = 200, description = "The pending selection, or null"))
)]
pub async fn get_cart_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cart = state.session.lock().await.cart().cloned();
    Json(cart)
}

#[utoipa::path(
    put,
    path = "/cart",
    request_body = CartRequest,
    responses(
        (status = 200, description = "Selection stored, replacing any previous one"),
        (status = 400, description = "The offering is not sold by that item"),
        (status = 404, description = "Unknown item")
    )
)]
pub async fn put_cart_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CartRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let selection = state
        .session
        .lock()
        .await
        .add_to_cart(&req.item_id, req.offering_id)
        .await
        .map_err(session_error)?;
    Ok(Json(selection))
}

#[utoipa::path(
    delete,
    path = "/cart",
    responses((status = 204, description = "Selection cleared"))
)]
pub async fn clear_cart_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.session.lock().await.clear_cart();
    StatusCode::NO_CONTENT
}

/// Charge the pending selection and start the call.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Paid; the purchase is now the active call"),
        (status = 400, description = "Nothing in the bag"),
        (status = 402, description = "The payment was refused; the body carries the reason")
    )
)]
pub async fn checkout_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let purchase = state
        .session
        .lock()
        .await
        .checkout(req.customer, req.card)
        .await
        .map_err(session_error)?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

#[utoipa::path(
    get,
    path = "/purchases",
    responses((status = 200, description = "Purchase history, oldest first"))
)]
pub async fn list_purchases_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let purchases = state.session.lock().await.purchase_history().to_vec();
    Json(purchases)
}

#[utoipa::path(
    post,
    path = "/purchases/{purchased_at}/feedback",
    params(("purchased_at" = i64, Path, description = "Purchase timestamp in epoch milliseconds")),
    request_body = FeedbackRequest,
    responses(
        (status = 201, description = "Feedback queued for moderation"),
        (status = 400, description = "Neither rating nor comment given"),
        (status = 404, description = "No such purchase")
    )
)]
pub async fn submit_feedback_handler(
    State(state): State<Arc<AppState>>,
    Path(purchased_at): Path<i64>,
    Json(req): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let at = purchase_key(purchased_at)?;
    let review = state
        .session
        .lock()
        .await
        .submit_feedback(at, req.rating, &req.comment)
        .await
        .map_err(session_error)?;
    Ok((StatusCode::CREATED, Json(review)))
}

//=========================================================================================
// Active Call
//=========================================================================================

#[utoipa::path(
    get,
    path = "/calls/active",
    responses(
        (status = 200, description = "The active call and its state right now"),
        (status = 404, description = "No active call")
    )
)]
pub async fn get_active_call_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let view = state
        .session
        .lock()
        .await
        .active_call_view()
        .ok_or((StatusCode::NOT_FOUND, "No active call.".to_string()))?;
    Ok(Json(view))
}

/// Rejoin a call from the purchase history.
#[utoipa::path(
    put,
    path = "/calls/active",
    request_body = ActiveCallRequest,
    responses(
        (status = 200, description = "The call is active again"),
        (status = 404, description = "No such purchase")
    )
)]
pub async fn set_active_call_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActiveCallRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let at = purchase_key(req.purchased_at)?;
    let mut session = state.session.lock().await;
    session.set_active_call(at).await.map_err(session_error)?;
    let view = session
        .active_call_view()
        .ok_or((StatusCode::NOT_FOUND, "No active call.".to_string()))?;
    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/calls/active",
    responses((status = 204, description = "Active call dismissed; history unchanged"))
)]
pub async fn clear_active_call_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.session.lock().await.clear_active_call().await;
    StatusCode::NO_CONTENT
}
