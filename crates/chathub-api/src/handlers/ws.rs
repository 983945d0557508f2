//! WebSocket upgrade handler and per-connection socket tasks.

use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use chathub_core::types::UserId;
use chathub_realtime::hub::Registration;
use chathub_realtime::message::{HubEvent, InboundMessage};
use chathub_realtime::relay::Sender;

use crate::extractors::AuthUser;
use crate::state::AppState;

/// Sent back when an inbound frame is not a chat message.
pub const MALFORMED: &str = "Malformed message";

/// GET /ws?token={jwt}
pub async fn ws_upgrade(
    State(state): State<AppState>,
    auth: AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = auth.user_id();
    ws.on_upgrade(move |socket| handle_ws_connection(state, user_id, socket))
}

/// Runs one connection: a writer task draining the hub's outbound queue and
/// a read loop feeding the relay. Either side ending closes both.
async fn handle_ws_connection(state: AppState, user_id: UserId, socket: WebSocket) {
    let Registration {
        conn_id,
        mut outbound,
        cancel,
    } = match state.realtime.hub.register(user_id).await {
        Ok(registration) => registration,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Could not register connection");
            return;
        }
    };

    info!(conn_id = %conn_id, user_id = %user_id, "WebSocket connection established");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let write_timeout = Duration::from_secs(state.config.realtime.write_timeout_seconds);

    let writer_cancel = cancel.clone();
    let writer = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                _ = writer_cancel.cancelled() => break,
                frame = outbound.recv() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };

            let text = match frame.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Failed to encode frame");
                    continue;
                }
            };

            match tokio::time::timeout(write_timeout, ws_tx.send(Message::Text(text.into()))).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(conn_id = %conn_id, error = %e, "Socket write failed");
                    break;
                }
                Err(_) => {
                    warn!(conn_id = %conn_id, "Socket write timed out");
                    break;
                }
            }
        }
        // Wakes the read loop when the writer stops first.
        writer_cancel.cancel();
        if let Err(e) = ws_tx.close().await {
            debug!(conn_id = %conn_id, error = %e, "Socket close failed");
        }
    });

    let sender = Sender { conn_id, user_id };
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = ws_rx.next() => next,
        };

        match next {
            Some(Ok(Message::Text(text))) => handle_text(&state, sender, text.as_str()).await,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                debug!(conn_id = %conn_id, error = %e, "Socket read failed");
                break;
            }
        }
    }

    cancel.cancel();
    if let Err(e) = writer.await {
        warn!(conn_id = %conn_id, error = %e, "Writer task failed");
    }

    match state.realtime.hub.unregister_connection(conn_id).await {
        Ok(true) => {}
        Ok(false) => debug!(conn_id = %conn_id, "Connection already superseded"),
        Err(e) => warn!(conn_id = %conn_id, error = %e, "Failed to unregister connection"),
    }

    info!(conn_id = %conn_id, user_id = %user_id, "WebSocket connection closed");
}

async fn handle_text(state: &AppState, sender: Sender, text: &str) {
    let inbound: InboundMessage = match serde_json::from_str(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            debug!(conn_id = %sender.conn_id, error = %e, "Malformed inbound frame");
            if let Err(e) = state
                .realtime
                .hub
                .send_to_connection(sender.conn_id, HubEvent::error(MALFORMED))
                .await
            {
                warn!(conn_id = %sender.conn_id, error = %e, "Failed to report malformed frame");
            }
            return;
        }
    };

    if let Err(e) = state.realtime.relay.relay(sender, inbound).await {
        warn!(conn_id = %sender.conn_id, error = %e, "Relay failed");
    }
}
