//! services/api/src/web/verification_task.rs
//!
//! Simulated identity review: completes a pending verification after a delay.

use crate::web::state::AppState;
use std::sync::Arc;
use tracing::info;

/// Waits out the review delay, then completes the verification for `email`
/// unless the profile changed or logged out in the meantime.
pub async fn verification_process(app_state: Arc<AppState>, email: String) {
    let token = app_state.shutdown.child_token();
    tokio::select! {
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(app_state.config.timers.verification_delay) => {}
    }

    let completed = app_state.session.lock().await.complete_verification(&email).await;
    if completed {
        info!("Verification completed");
        app_state.toasts.schedule_visible().await;
    } else {
        info!("Verification no longer pending; nothing to complete");
    }
}
