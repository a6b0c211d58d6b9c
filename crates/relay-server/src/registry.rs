/// Maps live sessions to their outbound delivery channel.
///
/// The room store addresses peers by `SessionId` only (`spec.md` §3,
/// "Ownership") — this is the one piece of real I/O state the connection
/// actor publishes here so the dispatcher can reach it without the store
/// ever touching a socket.
use std::collections::HashMap;
use std::sync::Arc;

use relay_core::{ServerEvent, SessionId};
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

/// Events whose loss is tolerable under backpressure, in priority order
/// (dropped first): typing indicators, then file-transfer progress markers
/// (`spec.md` §4.2).
fn is_droppable(event: &ServerEvent) -> bool {
    matches!(
        event,
        ServerEvent::TypingStarted { .. }
            | ServerEvent::TypingStopped
            | ServerEvent::FileSendingStarted { .. }
            | ServerEvent::FileSendingEnded { .. }
    )
}

/// Outcome of attempting to deliver one event to one session.
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Session isn't registered (already gone); nothing to do.
    NotConnected,
    /// A droppable event was silently dropped under backpressure.
    Dropped,
    /// A non-droppable event hit a full queue — the session is unhealthy and
    /// must be scheduled for `LEAVE` (`spec.md` §5).
    Unhealthy,
}

#[derive(Clone)]
pub struct OutboundRegistry {
    channels: Arc<Mutex<HashMap<SessionId, mpsc::Sender<String>>>>,
}

impl OutboundRegistry {
    pub fn new() -> Self {
        Self { channels: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub async fn register(&self, session_id: SessionId, sender: mpsc::Sender<String>) {
        self.channels.lock().await.insert(session_id, sender);
    }

    pub async fn unregister(&self, session_id: SessionId) {
        self.channels.lock().await.remove(&session_id);
    }

    pub async fn send(&self, session_id: SessionId, event: &ServerEvent) -> Delivery {
        let sender = {
            let channels = self.channels.lock().await;
            match channels.get(&session_id) {
                Some(s) => s.clone(),
                None => return Delivery::NotConnected,
            }
        };
        match sender.try_send(event.encode()) {
            Ok(()) => Delivery::Sent,
            Err(mpsc::error::TrySendError::Full(_)) if is_droppable(event) => {
                warn!(event = event.name(), "outbound queue full, dropping droppable event");
                Delivery::Dropped
            }
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Unhealthy,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Unhealthy,
        }
    }
}

impl Default for OutboundRegistry {
    fn default() -> Self {
        Self::new()
    }
}
