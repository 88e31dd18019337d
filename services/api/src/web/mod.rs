pub mod admin;
pub mod auth;
pub mod call_task;
pub mod catalog_task;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod toast_task;
pub mod verification_task;
pub mod ws_handler;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::web::state::AppState;

// Re-export the main WebSocket handler to make it easily accessible
// to the binary that will build the web server router.
pub use middleware::{require_admin, require_auth, schedule_toasts};
pub use ws_handler::ws_handler;

/// Builds every storefront route. The operator routes are only mounted when an
/// admin token is configured.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no profile required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/social/callback", get(auth::social_callback_handler))
        .route("/catalog", get(rest::list_catalog_handler))
        .route("/catalog/{id}", get(rest::get_catalog_item_handler));

    // Protected routes (a signed-in profile is required)
    let protected_routes = Router::new()
        .route(
            "/profile",
            get(rest::get_profile_handler).patch(rest::update_profile_handler),
        )
        .route("/profile/avatar", put(rest::update_avatar_handler))
        .route("/profile/verification", post(rest::submit_verification_handler))
        .route("/notifications", get(rest::list_notifications_handler))
        .route("/notifications/read-all", post(rest::mark_all_read_handler))
        .route("/notifications/{id}/read", post(rest::mark_read_handler))
        .route("/toasts", get(rest::list_toasts_handler))
        .route("/toasts/{id}/dismiss", post(rest::dismiss_toast_handler))
        .route("/favorites", get(rest::list_favorites_handler))
        .route("/favorites/{id}/toggle", post(rest::toggle_favorite_handler))
        .route(
            "/cart",
            get(rest::get_cart_handler)
                .put(rest::put_cart_handler)
                .delete(rest::clear_cart_handler),
        )
        .route("/checkout", post(rest::checkout_handler))
        .route("/purchases", get(rest::list_purchases_handler))
        .route(
            "/purchases/{purchased_at}/feedback",
            post(rest::submit_feedback_handler),
        )
        .route(
            "/calls/active",
            get(rest::get_active_call_handler)
                .put(rest::set_active_call_handler)
                .delete(rest::clear_active_call_handler),
        )
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let mut api_router = Router::new().merge(public_routes).merge(protected_routes);

    if app_state.config.admin_token.is_some() {
        let admin_routes = Router::new()
            .route("/admin/reviews/pending", get(admin::list_pending_handler))
            .route(
                "/admin/catalog/{item_id}/reviews/{review_id}/decision",
                post(admin::decide_review_handler),
            )
            .route("/admin/catalog/{item_id}/reviews", post(admin::add_review_handler))
            .layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                require_admin,
            ));
        api_router = api_router.merge(admin_routes);
    }

    api_router
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            schedule_toasts,
        ))
        .with_state(app_state)
}

/// Starts the loops that live as long as the process: the catalog status
/// simulator, and toast timers for anything restored from the durable slot.
pub fn spawn_background_tasks(app_state: Arc<AppState>) -> Vec<JoinHandle<()>> {
    let timers = &app_state.config.timers;
    let simulator = tokio::spawn(catalog_task::status_process(
        app_state.session.clone(),
        StdRng::from_entropy(),
        timers.status_flip_interval,
        timers.status_flip_probability,
        app_state.shutdown.child_token(),
    ));

    let restored_toasts = {
        let app_state = app_state.clone();
        tokio::spawn(async move { app_state.toasts.schedule_visible().await })
    };

    vec![simulator, restored_toasts]
}
