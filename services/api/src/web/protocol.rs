//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the storefront client and the
//! API server: the waiting-room countdown and the live toast stack.

use aura_core::domain::Notification;
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts (or restarts) the countdown for a purchase, identified by its
    /// timestamp in epoch milliseconds. Without a timestamp the active call is watched.
    WatchCall {
        #[serde(default)]
        purchased_at: Option<i64>,
    },

    /// Hides a toast without marking the notification read.
    DismissToast { id: String },

    /// Acknowledges a notification.
    MarkRead { id: String },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The watched call's remaining time. Sent when the whole-second value changes.
    CallTick { purchased_at: i64, remaining_ms: i64 },

    /// The watched call ran out. No further ticks follow for it.
    CallCompleted { purchased_at: i64 },

    /// `watch_call` without a timestamp while no call is active.
    NoActiveCall,

    /// The current toast stack, oldest first.
    Toasts { toasts: Vec<Notification> },

    /// Reports an error to the client, which should display an error message.
    Error { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!("Failed to serialize server message: {}", e);
                None
            }
        }
    }
}
