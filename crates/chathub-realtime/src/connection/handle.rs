//! Individual WebSocket connection handle.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use chathub_core::types::{ConnectionId, UserId};

use crate::message::types::OutboundMessage;

/// Outcome of a single non-blocking write to a connection's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the writer task.
    Queued,
    /// The queue was full; the frame was dropped for this peer.
    Full,
    /// The writer task is gone.
    Closed,
}

impl Delivery {
    /// Whether the frame was queued.
    pub fn is_queued(self) -> bool {
        self == Self::Queued
    }
}

/// A handle to a single registered connection.
///
/// Owned by the hub actor. The socket side holds the matching receiver and
/// cancellation token.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Hub-assigned connection ID.
    pub id: ConnectionId,
    /// User who owns this connection.
    pub user_id: UserId,
    /// Sender side of the bounded outbound queue.
    sender: mpsc::Sender<OutboundMessage>,
    /// Cancelled on eviction.
    cancel: CancellationToken,
    /// When the connection was registered.
    pub connected_at: DateTime<Utc>,
}

impl ConnectionHandle {
    /// Create a new connection handle.
    pub fn new(
        id: ConnectionId,
        user_id: UserId,
        sender: mpsc::Sender<OutboundMessage>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            user_id,
            sender,
            cancel,
            connected_at: Utc::now(),
        }
    }

    /// Queue an outbound message without waiting.
    pub fn send(&self, msg: OutboundMessage) -> Delivery {
        match self.sender.try_send(msg) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    conn_id = %self.id,
                    user_id = %self.user_id,
                    "Send buffer full, dropping message"
                );
                Delivery::Full
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    conn_id = %self.id,
                    user_id = %self.user_id,
                    "Send to closed connection ignored"
                );
                Delivery::Closed
            }
        }
    }

    /// Signal the socket task to stop.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether the connection has been told to stop.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::types::HubEvent;

    fn handle(capacity: usize) -> (ConnectionHandle, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            ConnectionHandle::new(ConnectionId(1), UserId::new(), tx, CancellationToken::new()),
            rx,
        )
    }

    #[test]
    fn test_full_queue_drops() {
        let (conn, _rx) = handle(1);
        assert_eq!(conn.send(HubEvent::error("a").into()), Delivery::Queued);
        assert_eq!(conn.send(HubEvent::error("b").into()), Delivery::Full);
    }

    #[test]
    fn test_closed_queue_reported() {
        let (conn, rx) = handle(4);
        drop(rx);
        assert_eq!(conn.send(HubEvent::error("a").into()), Delivery::Closed);
        assert!(conn.is_closed());
    }

    #[test]
    fn test_close_cancels_token() {
        let (tx, _rx) = mpsc::channel(1);
        let token = CancellationToken::new();
        let conn = ConnectionHandle::new(ConnectionId(2), UserId::new(), tx, token.clone());
        conn.close();
        assert!(token.is_cancelled());
    }
}
