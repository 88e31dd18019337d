//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! It pushes the toast stack whenever it changes and runs at most one call
//! countdown at a time, delegating the countdown itself to `call_task`.

use crate::web::{
    call_task::call_process,
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};
use aura_core::Notification;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::DateTime;
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The sending half of a connection, shared with the tasks that publish on it.
pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Sends one message. Returns `false` once the client is gone.
pub async fn send_message(ws_sender: &WsSender, message: &ServerMessage) -> bool {
    let Some(json) = message.to_json() else {
        return true;
    };
    ws_sender.lock().await.send(Message::Text(json.into())).await.is_ok()
}

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn current_toasts(app_state: &AppState) -> ServerMessage {
    let session = app_state.session.lock().await;
    let toasts: Vec<Notification> = session.active_toasts().into_iter().cloned().collect();
    ServerMessage::Toasts { toasts }
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));
    let connection_token = app_state.shutdown.child_token();

    // --- 1. Toast Stream ---
    // Sends the current stack now and again every time the scheduler reports a change.
    let toast_task = {
        let app_state = app_state.clone();
        let ws_sender = ws_sender.clone();
        let token = connection_token.clone();
        let mut changes = app_state.toasts.subscribe();
        tokio::spawn(async move {
            loop {
                if !send_message(&ws_sender, &current_toasts(&app_state).await).await {
                    return;
                }
                tokio::select! {
                    _ = token.cancelled() => return,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }
        })
    };

    // --- 2. Main Message Loop ---
    let mut countdown: Option<CancellationToken> = None;
    loop {
        let msg = tokio::select! {
            _ = connection_token.cancelled() => break,
            msg = receiver.next() => msg,
        };
        match msg {
            Some(Ok(Message::Text(text))) => {
                handle_text_message(text.as_str(), &app_state, &ws_sender, &connection_token, &mut countdown)
                    .await;
            }
            Some(Ok(Message::Close(_))) => {
                info!("Client sent close message.");
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
            None => {
                info!("Client disconnected.");
                break;
            }
        }
    }

    // --- 3. Cleanup ---
    connection_token.cancel();
    toast_task.abort();
    info!("WebSocket connection closed.");
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(
    text: &str,
    app_state: &Arc<AppState>,
    ws_sender: &WsSender,
    connection_token: &CancellationToken,
    countdown: &mut Option<CancellationToken>,
) {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            let message = ServerMessage::Error {
                message: "Unrecognized message.".to_string(),
            };
            send_message(ws_sender, &message).await;
            return;
        }
    };

    match client_msg {
        ClientMessage::WatchCall { purchased_at } => {
            if let Some(previous) = countdown.take() {
                previous.cancel();
            }

            let target = match purchased_at {
                Some(millis) => DateTime::from_timestamp_millis(millis),
                None => app_state
                    .session
                    .lock()
                    .await
                    .active_call()
                    .map(|call| call.purchased_at),
            };
            let Some(target) = target else {
                let message = match purchased_at {
                    Some(millis) => ServerMessage::Error {
                        message: format!("No purchase was made at {}.", millis),
                    },
                    None => ServerMessage::NoActiveCall,
                };
                send_message(ws_sender, &message).await;
                return;
            };

            let token = connection_token.child_token();
            *countdown = Some(token.clone());
            tokio::spawn(call_process(
                app_state.session.clone(),
                ws_sender.clone(),
                target,
                app_state.config.timers.call_tick,
                token,
            ));
        }
        ClientMessage::DismissToast { id } => {
            app_state.session.lock().await.dismiss_toast(&id);
            app_state.toasts.cancel(&id).await;
            app_state.toasts.notify_changed();
        }
        ClientMessage::MarkRead { id } => {
            app_state.session.lock().await.mark_read(&id).await;
            app_state.toasts.notify_changed();
        }
    }
}
