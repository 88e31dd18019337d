//! services/api/src/web/toast_task.rs
//!
//! Auto-dismissal of toasts. Every visible toast gets its own timer; when it
//! fires the toast is dismissed (hidden), never marked read. Timers are
//! independent: cancelling one leaves the others running.

use crate::web::state::SharedSession;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Clone)]
pub struct ToastScheduler {
    session: SharedSession,
    lifetime: Duration,
    timers: Arc<Mutex<HashMap<String, CancellationToken>>>,
    shutdown: CancellationToken,
    changes: Arc<watch::Sender<u64>>,
}

impl ToastScheduler {
    pub fn new(session: SharedSession, lifetime: Duration, shutdown: CancellationToken) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            session,
            lifetime,
            timers: Arc::new(Mutex::new(HashMap::new())),
            shutdown,
            changes: Arc::new(changes),
        }
    }

    /// Bumped whenever the visible stack may have changed.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn notify_changed(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }

    /// Starts a timer for every visible toast that does not have one yet.
    pub async fn schedule_visible(&self) {
        let visible: Vec<String> = {
            let session = self.session.lock().await;
            session.active_toasts().iter().map(|t| t.id.clone()).collect()
        };

        let mut timers = self.timers.lock().await;
        let mut started = 0;
        for id in visible {
            if timers.contains_key(&id) {
                continue;
            }
            let token = self.shutdown.child_token();
            timers.insert(id.clone(), token.clone());
            tokio::spawn(self.clone().run_timer(id, token));
            started += 1;
        }
        drop(timers);

        if started > 0 {
            debug!("Scheduled {} toast timers", started);
            self.notify_changed();
        }
    }

    /// Stops the timer for one toast, e.g. after the user dismissed it by hand.
    pub async fn cancel(&self, id: &str) {
        if let Some(token) = self.timers.lock().await.remove(id) {
            token.cancel();
        }
    }

    pub async fn cancel_all(&self) {
        let mut timers = self.timers.lock().await;
        for (_, token) in timers.drain() {
            token.cancel();
        }
    }

    pub async fn pending_timers(&self) -> usize {
        self.timers.lock().await.len()
    }

    async fn run_timer(self, id: String, token: CancellationToken) {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("Toast timer {} cancelled", id);
                return;
            }
            _ = tokio::time::sleep(self.lifetime) => {}
        }

        self.session.lock().await.dismiss_toast(&id);
        self.timers.lock().await.remove(&id);
        debug!("Toast {} auto-dismissed", id);
        self.notify_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FileCatalogAdapter, InMemorySlot, SandboxPaymentAdapter};
    use aura_core::{Identity, NotificationCategory, ProfileStore, SessionFacade, SystemClock};

    async fn signed_in_session() -> SharedSession {
        let mut facade = SessionFacade::start(
            ProfileStore::new(Arc::new(InMemorySlot::new())),
            &FileCatalogAdapter::new("does-not-exist.json"),
            Arc::new(SandboxPaymentAdapter::new()),
            Arc::new(SystemClock),
        )
        .await
        .unwrap();
        facade
            .social_login(Identity {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                avatar: None,
            })
            .await
            .unwrap();
        Arc::new(Mutex::new(facade))
    }

    async fn push(session: &SharedSession, message: &str) -> String {
        session
            .lock()
            .await
            .notify(message, NotificationCategory::Info)
            .await
            .unwrap()
            .id
    }

    async fn visible(session: &SharedSession) -> Vec<String> {
        let session = session.lock().await;
        let ids = session.active_toasts().iter().map(|t| t.id.clone()).collect();
        ids
    }

    #[tokio::test]
    async fn expired_toast_is_dismissed_not_read() {
        let session = signed_in_session().await;
        let scheduler = ToastScheduler::new(session.clone(), Duration::from_millis(20), CancellationToken::new());
        let id = push(&session, "hello").await;

        scheduler.schedule_visible().await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(visible(&session).await.is_empty());
        let session = session.lock().await;
        assert_eq!(session.unread_count(), 1);
        assert!(session.notifications().iter().any(|n| n.id == id && !n.read));
    }

    #[tokio::test]
    async fn cancelling_one_timer_leaves_siblings_running() {
        let session = signed_in_session().await;
        let scheduler = ToastScheduler::new(session.clone(), Duration::from_millis(50), CancellationToken::new());
        let kept = push(&session, "kept").await;
        let expiring = push(&session, "expiring").await;

        scheduler.schedule_visible().await;
        assert_eq!(scheduler.pending_timers().await, 2);
        scheduler.cancel(&kept).await;
        assert_eq!(scheduler.pending_timers().await, 1);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(visible(&session).await, vec![kept]);
        assert!(!visible(&session).await.contains(&expiring));
    }

    #[tokio::test]
    async fn scheduling_twice_starts_one_timer_per_toast() {
        let session = signed_in_session().await;
        let scheduler = ToastScheduler::new(session.clone(), Duration::from_secs(60), CancellationToken::new());
        push(&session, "once").await;

        scheduler.schedule_visible().await;
        scheduler.schedule_visible().await;

        assert_eq!(scheduler.pending_timers().await, 1);
        scheduler.cancel_all().await;
        assert_eq!(scheduler.pending_timers().await, 0);
    }
}
