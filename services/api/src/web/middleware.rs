//! services/api/src/web/middleware.rs
//!
//! Middleware for protecting routes and for scheduling toast timers.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// The header trusted operators authenticate with.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Middleware that rejects the request with 401 Unauthorized unless a profile
/// is signed in to the session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let signed_in = state.session.lock().await.is_authenticated();
    if !signed_in {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

/// Middleware for the trusted-operator routes: the `x-admin-token` header must
/// match the configured token. Without a configured token nothing matches.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(StatusCode::NOT_FOUND);
    };
    let presented = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if presented != expected {
        warn!("Rejected operator request with a wrong token");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

/// Runs after every request: any toast a handler produced gets its dismissal timer.
pub async fn schedule_toasts(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    state.toasts.schedule_visible().await;
    response
}
