//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::toast_task::ToastScheduler;
use aura_core::SessionFacade;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// The single storefront session. Handlers lock it for the whole of one
/// facade call, so each action's slot write lands before the next action reads.
pub type SharedSession = Arc<Mutex<SessionFacade>>;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub config: Arc<Config>,
    pub toasts: ToastScheduler,
    /// Cancelled on shutdown; every background loop runs on a child of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(session: SessionFacade, config: Arc<Config>) -> Arc<Self> {
        let session = Arc::new(Mutex::new(session));
        let shutdown = CancellationToken::new();
        let toasts = ToastScheduler::new(
            session.clone(),
            config.timers.toast_lifetime(),
            shutdown.child_token(),
        );
        Arc::new(Self {
            session,
            config,
            toasts,
            shutdown,
        })
    }
}
