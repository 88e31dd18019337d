//! services/api/src/web/call_task.rs
//!
//! The asynchronous "worker" behind the waiting-room countdown. One runs per
//! watched purchase on a WebSocket connection and is stopped through its
//! `CancellationToken` when the client watches another call or disconnects.

use crate::web::{
    protocol::ServerMessage,
    state::SharedSession,
    ws_handler::{send_message, WsSender},
};
use aura_core::CallState;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// What the client was last told about the watched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Published {
    Seconds(i64),
    Completed,
}

/// Suppresses ticks that would not change the rendered countdown.
#[derive(Debug, Default)]
pub struct CountdownTracker {
    last: Option<Published>,
}

impl CountdownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state to publish, or `None` when the display would not change.
    pub fn observe(&mut self, state: CallState) -> Option<CallState> {
        let current = match state {
            // Rounded up, so "0:01" stays on screen until the call is over.
            CallState::Active { remaining_ms } => Published::Seconds((remaining_ms + 999).div_euclid(1000)),
            CallState::Completed => Published::Completed,
        };
        if self.last == Some(current) {
            return None;
        }
        self.last = Some(current);
        Some(state)
    }
}

/// Publishes the countdown for `purchased_at` every `tick` until the call
/// completes, the purchase disappears (logout) or the token is cancelled.
pub async fn call_process(
    session: SharedSession,
    ws_sender: WsSender,
    purchased_at: DateTime<Utc>,
    tick: Duration,
    cancellation_token: CancellationToken,
) {
    info!("Countdown started for purchase {}", purchased_at.timestamp_millis());
    let key = purchased_at.timestamp_millis();
    let mut tracker = CountdownTracker::new();
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                debug!("Countdown for {} cancelled", key);
                return;
            }
            _ = interval.tick() => {}
        }

        let state = session.lock().await.call_state(purchased_at);
        let Some(state) = state else {
            let message = ServerMessage::Error {
                message: format!("No purchase was made at {}.", key),
            };
            send_message(&ws_sender, &message).await;
            return;
        };

        let Some(publish) = tracker.observe(state) else {
            continue;
        };
        let message = match publish {
            CallState::Active { remaining_ms } => ServerMessage::CallTick {
                purchased_at: key,
                remaining_ms,
            },
            CallState::Completed => ServerMessage::CallCompleted { purchased_at: key },
        };
        if !send_message(&ws_sender, &message).await {
            debug!("Client went away; stopping countdown for {}", key);
            return;
        }
        if publish.is_completed() {
            info!("Call {} completed", key);
            return;
        }
    }
}
