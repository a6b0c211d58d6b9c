use std::time::Instant;

use crate::types::{RoomId, SessionId, UserId};

/// Lifecycle state of a `UserSession`. See `spec.md` §3 and §4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unjoined,
    Waiting,
    Joined,
    Closed,
}

/// Server-side representation of one connected client channel.
///
/// `outbound` is intentionally not modeled here — the store addresses
/// sessions by `SessionId` only and the connection-actor supervisor owns the
/// actual write handle, per `spec.md` §3 ("Ownership").
#[derive(Debug, Clone)]
pub struct UserSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub username: String,
    pub room_type: crate::types::RoomKind,
    pub state: SessionState,
    pub joined_room: Option<RoomId>,
    /// When this session was registered. Observability only — never read by
    /// store logic (`spec.md` §3 data model).
    pub connected_at: Instant,
}

impl UserSession {
    pub fn new(session_id: SessionId, user_id: UserId, username: String, room_type: crate::types::RoomKind) -> Self {
        Self {
            session_id,
            user_id,
            username,
            room_type,
            state: SessionState::Unjoined,
            joined_room: None,
            connected_at: Instant::now(),
        }
    }
}
