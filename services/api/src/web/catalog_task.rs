//! services/api/src/web/catalog_task.rs
//!
//! The catalog status simulator: a low-frequency loop that flips each item
//! online/offline at random. It only ever touches catalog records.

use crate::web::state::SharedSession;
use aura_core::ItemId;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One simulator tick.
pub async fn flip_once(session: &SharedSession, rng: &mut StdRng, probability: f64) -> Vec<ItemId> {
    let flipped = session.lock().await.flip_catalog_statuses(rng, probability);
    if !flipped.is_empty() {
        debug!("Catalog status flipped for {:?}", flipped);
    }
    flipped
}

pub async fn status_process(
    session: SharedSession,
    mut rng: StdRng,
    period: Duration,
    probability: f64,
    cancellation_token: CancellationToken,
) {
    info!("Catalog status simulator started.");
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the first flip happens one period in.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Catalog status simulator stopped.");
                return;
            }
            _ = interval.tick() => {
                flip_once(&session, &mut rng, probability).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FileCatalogAdapter, InMemorySlot, SandboxPaymentAdapter};
    use aura_core::{ItemStatus, ProfileStore, SessionFacade, SystemClock};
    use rand::SeedableRng;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const TWO_ITEMS: &str = r#"[
      { "id": "1", "name": "Aria", "status": "Online" },
      { "id": "2", "name": "Bea", "status": "Offline" }
    ]"#;

    async fn session_with_catalog(dir: &tempfile::TempDir) -> SharedSession {
        let path = dir.path().join("db.json");
        tokio::fs::write(&path, TWO_ITEMS).await.unwrap();
        let facade = SessionFacade::start(
            ProfileStore::new(Arc::new(InMemorySlot::new())),
            &FileCatalogAdapter::new(path),
            Arc::new(SandboxPaymentAdapter::new()),
            Arc::new(SystemClock),
        )
        .await
        .unwrap();
        Arc::new(Mutex::new(facade))
    }

    #[tokio::test]
    async fn certain_tick_flips_every_item() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with_catalog(&dir).await;
        let mut rng = StdRng::seed_from_u64(3);

        let flipped = flip_once(&session, &mut rng, 1.0).await;

        assert_eq!(flipped, vec!["1".to_string(), "2".to_string()]);
        let session = session.lock().await;
        let statuses: Vec<ItemStatus> = session.catalog().items().iter().map(|i| i.status).collect();
        assert_eq!(statuses, vec![ItemStatus::Offline, ItemStatus::Online]);
    }

    #[tokio::test]
    async fn simulator_stops_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with_catalog(&dir).await;
        let token = CancellationToken::new();
        let handle = tokio::spawn(status_process(
            session,
            StdRng::seed_from_u64(3),
            Duration::from_millis(5),
            0.5,
            token.clone(),
        ));

        token.cancel();

        assert!(handle.await.is_ok());
    }
}
