//! services/api/src/web/auth.rs
//!
//! Identity endpoints: registration, login against the stored profile, logout,
//! and the relay that receives the social-login result.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use aura_core::{Identity, Profile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::{session_error, HandlerError};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
}

/// What the social-login provider relays back: either an identity or an error.
#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct SocialCallbackParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub pic: Option<String>,
    pub error: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl From<&Profile> for AuthResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            avatar: profile.avatar.clone(),
        }
    }
}

impl SocialCallbackParams {
    /// The relayed identity, or the reason the relay failed.
    pub fn into_identity(self) -> Result<Identity, String> {
        if let Some(error) = self.error.filter(|e| !e.trim().is_empty()) {
            return Err(error);
        }
        let name = self.name.filter(|n| !n.trim().is_empty());
        let email = self.email.filter(|e| !e.trim().is_empty());
        match (name, email) {
            (Some(name), Some(email)) => Ok(Identity {
                name,
                email,
                avatar: self.pic.filter(|p| !p.is_empty()),
            }),
            _ => Err("Social login did not return a name and email.".to_string()),
        }
    }
}

fn require_field(value: &str, field: &str) -> Result<(), HandlerError> {
    if value.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, format!("{} is required", field)));
    }
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a fresh profile, replacing the stored one
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Profile created", body = AuthResponse),
        (status = 400, description = "Missing name or email")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    require_field(&req.name, "name")?;
    require_field(&req.email, "email")?;

    let identity = Identity {
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        avatar: req.avatar.filter(|a| !a.is_empty()),
    };
    let mut session = state.session.lock().await;
    let profile = session.register(identity).await.map_err(session_error)?;
    info!("Profile registered");
    Ok((StatusCode::CREATED, Json(AuthResponse::from(profile))))
}

/// POST /auth/login - Sign in the stored profile
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "No stored profile with that email")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut session = state.session.lock().await;
    if !session.login(req.email.trim()).await {
        return Err((
            StatusCode::UNAUTHORIZED,
            "No account found for that email.".to_string(),
        ));
    }
    let profile = session
        .profile()
        .ok_or((StatusCode::UNAUTHORIZED, "Login failed.".to_string()))?;
    Ok(Json(AuthResponse::from(profile)))
}

/// POST /auth/logout - End the session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logout successful")
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.session.lock().await.logout().await;
    state.toasts.cancel_all().await;
    state.toasts.notify_changed();
    StatusCode::NO_CONTENT
}

/// GET /auth/social/callback - Receive the social-login relay
#[utoipa::path(
    get,
    path = "/auth/social/callback",
    params(SocialCallbackParams),
    responses(
        (status = 200, description = "Signed in with the relayed identity", body = AuthResponse),
        (status = 400, description = "The relay reported a failure")
    )
)]
pub async fn social_callback_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SocialCallbackParams>,
) -> Result<impl IntoResponse, HandlerError> {
    let identity = params.into_identity().map_err(|reason| {
        warn!("Social login failed: {}", reason);
        (StatusCode::BAD_REQUEST, reason)
    })?;

    let mut session = state.session.lock().await;
    let profile = session.social_login(identity).await.map_err(session_error)?;
    Ok(Json(AuthResponse::from(profile)))
}
