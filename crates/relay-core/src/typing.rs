/// Per-room typing indicator tracking.
///
/// Pure state machine: record starts/stops, and sweep expired entries on a
/// timer tick. `spec.md` §4.6 specifies a 5s soft expiry — a `typing_start`
/// with no matching `typing_stop` silently lapses rather than staying lit
/// forever if a client crashes mid-type.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::{RoomId, SessionId, TYPING_EXPIRY_SECS};

#[derive(Default)]
pub struct TypingTracker {
    /// room → (session → last `typing_start` time).
    typing: HashMap<RoomId, HashMap<SessionId, Instant>>,
    expiry: Duration,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self {
            typing: HashMap::new(),
            expiry: Duration::from_secs(TYPING_EXPIRY_SECS),
        }
    }

    pub fn with_expiry(expiry: Duration) -> Self {
        Self { typing: HashMap::new(), expiry }
    }

    /// Record a `typing_start`. Returns `true` if this is a fresh start (the
    /// caller should broadcast `typing_started`); `false` if the sender was
    /// already marked typing (idempotent, per `spec.md` §8).
    pub fn start(&mut self, room: RoomId, session: SessionId) -> bool {
        let entry = self.typing.entry(room).or_default();
        let fresh = !entry.contains_key(&session);
        entry.insert(session, Instant::now());
        fresh
    }

    /// Record a `typing_stop`. Returns `true` if the sender had been marked
    /// typing (the caller should broadcast `typing_stopped`).
    pub fn stop(&mut self, room: RoomId, session: SessionId) -> bool {
        match self.typing.get_mut(&room) {
            Some(entry) => {
                let was_typing = entry.remove(&session).is_some();
                if entry.is_empty() {
                    self.typing.remove(&room);
                }
                was_typing
            }
            None => false,
        }
    }

    /// Drop a session from every room's typing set (on `LEAVE`).
    pub fn remove_session(&mut self, session: SessionId) {
        self.typing.retain(|_, entry| {
            entry.remove(&session);
            !entry.is_empty()
        });
    }

    /// Drop a room's typing state entirely (on room destruction).
    pub fn remove_room(&mut self, room: RoomId) {
        self.typing.remove(&room);
    }

    /// Sweep sessions whose `typing_start` has aged past the expiry window.
    /// Returns the `(room, session)` pairs that lapsed, so the caller can
    /// emit a synthetic `typing_stop` to their peers.
    pub fn sweep_expired(&mut self) -> Vec<(RoomId, SessionId)> {
        let expiry = self.expiry;
        let mut lapsed = Vec::new();
        self.typing.retain(|room, entry| {
            entry.retain(|session, started| {
                if started.elapsed() >= expiry {
                    lapsed.push((*room, *session));
                    false
                } else {
                    true
                }
            });
            !entry.is_empty()
        });
        lapsed
    }

    pub fn is_typing(&self, room: RoomId, session: SessionId) -> bool {
        self.typing.get(&room).is_some_and(|entry| entry.contains_key(&session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (RoomId, SessionId) {
        (RoomId::new(), SessionId::new())
    }

    #[test]
    fn start_then_stop_leaves_set_unchanged() {
        let mut t = TypingTracker::new();
        let (room, session) = ids();
        assert!(t.start(room, session));
        assert!(t.is_typing(room, session));
        assert!(t.stop(room, session));
        assert!(!t.is_typing(room, session));
    }

    #[test]
    fn repeated_start_is_idempotent() {
        let mut t = TypingTracker::new();
        let (room, session) = ids();
        assert!(t.start(room, session));
        assert!(!t.start(room, session), "second start should not be fresh");
    }

    #[test]
    fn expiry_sweeps_after_window() {
        let mut t = TypingTracker::with_expiry(Duration::from_millis(10));
        let (room, session) = ids();
        t.start(room, session);
        std::thread::sleep(Duration::from_millis(20));
        let lapsed = t.sweep_expired();
        assert_eq!(lapsed, vec![(room, session)]);
        assert!(!t.is_typing(room, session));
    }

    #[test]
    fn remove_session_clears_all_rooms() {
        let mut t = TypingTracker::new();
        let (room_a, session) = ids();
        let (room_b, _) = ids();
        t.start(room_a, session);
        t.start(room_b, session);
        t.remove_session(session);
        assert!(!t.is_typing(room_a, session));
        assert!(!t.is_typing(room_b, session));
    }
}
