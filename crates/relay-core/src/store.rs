/// The room store — single source of truth for rooms, the waiting pool, the
/// code index, and the session table (`spec.md` §3, §4.3).
///
/// Pure decision engine in the style of `group::manager::GroupManager`: every
/// command is a plain method that mutates internal state and returns
/// `Vec<StoreAction>` describing what to deliver to whom. No I/O happens
/// here — the connection-actor supervisor executes the actions against each
/// session's outbound handle. This is what lets a single `RoomStore`
/// serialize all room mutation without ever touching a socket.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::frame::{Envelope, ServerEvent};
use crate::matchmaker::{generate_group_code, WaitingPool};
use crate::room::{CoupleRoom, GroupRoom, Room};
use crate::session::{SessionState, UserSession};
use crate::typing::TypingTracker;
use crate::types::{GroupCode, RoomId, RoomKind, SessionId, UserId, DEFAULT_MATCH_TIMEOUT_SECS, TYPING_EXPIRY_SECS};

/// One piece of outbound work the caller must execute: deliver `event` to
/// the session `to`. Actions from a single command are always returned in
/// the order they must be delivered (`spec.md` §4.3 "Ordering").
#[derive(Debug, Clone)]
pub struct StoreAction {
    pub to: SessionId,
    pub event: ServerEvent,
}

impl StoreAction {
    fn new(to: SessionId, event: ServerEvent) -> Self {
        Self { to, event }
    }
}

/// The kind of WebRTC signaling frame being routed (`spec.md` §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    EndCall,
}

/// The method a `join_chat` is requesting (`spec.md` §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMethod {
    Create,
    Join,
}

pub struct RoomStoreConfig {
    pub match_timeout: Duration,
    /// `spec.md` §9 "Couple mode" — implementers may disable the legacy
    /// couple path behind a configuration flag.
    pub couple_enabled: bool,
    /// `spec.md` §4.6 soft-expiry window for a dangling `typing_start`.
    pub typing_expiry: Duration,
}

impl Default for RoomStoreConfig {
    fn default() -> Self {
        Self {
            match_timeout: Duration::from_secs(DEFAULT_MATCH_TIMEOUT_SECS),
            couple_enabled: true,
            typing_expiry: Duration::from_secs(TYPING_EXPIRY_SECS),
        }
    }
}

pub struct RoomStore {
    config: RoomStoreConfig,
    sessions: HashMap<SessionId, UserSession>,
    rooms: HashMap<RoomId, Room>,
    code_index: HashMap<String, RoomId>,
    waiting_pool: WaitingPool,
    typing: TypingTracker,
}

impl RoomStore {
    pub fn new(config: RoomStoreConfig) -> Self {
        let typing = TypingTracker::with_expiry(config.typing_expiry);
        Self {
            config,
            sessions: HashMap::new(),
            rooms: HashMap::new(),
            code_index: HashMap::new(),
            waiting_pool: WaitingPool::new(),
            typing,
        }
    }

    // ── Queries (for tests and observability) ───────────────────────────

    pub fn session(&self, id: SessionId) -> Option<&UserSession> {
        self.sessions.get(&id)
    }

    pub fn room_of(&self, session: SessionId) -> Option<&Room> {
        self.sessions.get(&session)?.joined_room.and_then(|rid| self.rooms.get(&rid))
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting_pool.len()
    }

    // ── Session lifecycle ────────────────────────────────────────────────

    /// Register a session in `UNJOINED` state from the profile carried by its
    /// first `join_chat` frame. The connection actor assigns `session_id` at
    /// channel open; the session record itself is created here, the first
    /// time the actor has a profile to put in it.
    pub fn register(&mut self, session_id: SessionId, user_id: UserId, username: String, room_type: RoomKind) {
        self.sessions.insert(session_id, UserSession::new(session_id, user_id, username, room_type));
    }

    // ── JOIN ─────────────────────────────────────────────────────────────

    pub fn join(
        &mut self,
        session_id: SessionId,
        method: Option<JoinMethod>,
        code: Option<String>,
    ) -> Vec<StoreAction> {
        let Some(session) = self.sessions.get(&session_id) else {
            return vec![];
        };
        match session.room_type {
            RoomKind::Group => self.join_group(session_id, method, code),
            RoomKind::Couple => self.join_couple(session_id),
        }
    }

    fn join_group(
        &mut self,
        session_id: SessionId,
        method: Option<JoinMethod>,
        code: Option<String>,
    ) -> Vec<StoreAction> {
        match method {
            Some(JoinMethod::Create) | None => self.create_group(session_id),
            Some(JoinMethod::Join) => {
                let Some(raw_code) = code else {
                    return vec![StoreAction::new(session_id, ServerEvent::GroupNotFound)];
                };
                self.attach_group(session_id, &raw_code)
            }
        }
    }

    fn create_group(&mut self, session_id: SessionId) -> Vec<StoreAction> {
        let room_id = RoomId::new();
        let code = generate_group_code(|c| self.code_index.contains_key(c));
        let room = GroupRoom { id: room_id, code: code.clone(), members: vec![session_id], last_activity_at: Instant::now() };
        self.code_index.insert(code.as_str().to_string(), room_id);
        self.rooms.insert(room_id, Room::Group(room));

        let Some(session) = self.sessions.get_mut(&session_id) else { return vec![] };
        session.state = SessionState::Joined;
        session.joined_room = Some(room_id);
        let username = session.username.clone();

        vec![
            StoreAction::new(session_id, ServerEvent::ChatStarted { group_code: Some(code.to_string()) }),
            StoreAction::new(
                session_id,
                ServerEvent::GroupMembersUpdate { usernames: vec![username] },
            ),
        ]
    }

    fn attach_group(&mut self, session_id: SessionId, raw_code: &str) -> Vec<StoreAction> {
        let normalized = GroupCode::normalize(raw_code);
        let Some(&room_id) = self.code_index.get(&normalized) else {
            return vec![StoreAction::new(session_id, ServerEvent::GroupNotFound)];
        };
        let Some(Room::Group(room)) = self.rooms.get_mut(&room_id) else {
            return vec![StoreAction::new(session_id, ServerEvent::GroupNotFound)];
        };

        room.members.push(session_id);
        room.last_activity_at = Instant::now();
        let code = room.code.to_string();
        let prior_members: Vec<SessionId> = room.members.iter().copied().filter(|m| *m != session_id).collect();

        let Some(session) = self.sessions.get_mut(&session_id) else { return vec![] };
        session.state = SessionState::Joined;
        session.joined_room = Some(room_id);
        let joiner_username = session.username.clone();

        let all_usernames = self.group_usernames(room_id);

        let mut actions = Vec::new();
        for peer in prior_members {
            actions.push(StoreAction::new(
                peer,
                ServerEvent::UserJoinedGroup { username: joiner_username.clone() },
            ));
        }
        actions.push(StoreAction::new(session_id, ServerEvent::ChatStarted { group_code: Some(code) }));
        for member in self.room_members(room_id) {
            actions.push(StoreAction::new(
                member,
                ServerEvent::GroupMembersUpdate { usernames: all_usernames.clone() },
            ));
        }
        actions
    }

    fn join_couple(&mut self, session_id: SessionId) -> Vec<StoreAction> {
        if !self.config.couple_enabled {
            return vec![StoreAction::new(session_id, ServerEvent::NoMatchFound)];
        }
        match self.waiting_pool.enqueue_or_match(session_id) {
            Some(peer) => {
                let room_id = RoomId::new();
                self.rooms.insert(
                    room_id,
                    Room::Couple(CoupleRoom { id: room_id, members: [peer, session_id], last_activity_at: Instant::now() }),
                );
                for member in [peer, session_id] {
                    if let Some(s) = self.sessions.get_mut(&member) {
                        s.state = SessionState::Joined;
                        s.joined_room = Some(room_id);
                    }
                }
                vec![
                    StoreAction::new(peer, ServerEvent::ChatStarted { group_code: None }),
                    StoreAction::new(session_id, ServerEvent::ChatStarted { group_code: None }),
                ]
            }
            None => {
                if let Some(s) = self.sessions.get_mut(&session_id) {
                    s.state = SessionState::Waiting;
                }
                vec![StoreAction::new(session_id, ServerEvent::WaitingForMatch)]
            }
        }
    }

    /// Timer tick: waiters past `match_timeout` return to `UNJOINED` with
    /// `no_match_found` (`spec.md` §4.3).
    pub fn sweep_waiting_pool(&mut self) -> Vec<StoreAction> {
        let expired = self.waiting_pool.timed_out(self.config.match_timeout);
        expired
            .into_iter()
            .map(|session_id| {
                if let Some(s) = self.sessions.get_mut(&session_id) {
                    s.state = SessionState::Unjoined;
                }
                StoreAction::new(session_id, ServerEvent::NoMatchFound)
            })
            .collect()
    }

    // ── SEND ─────────────────────────────────────────────────────────────

    pub fn send_message(&mut self, session_id: SessionId, envelope: Envelope, reply_to_id: Option<i64>) -> Vec<StoreAction> {
        let Some(room) = self.room_of(session_id) else { return vec![] };
        let room_id = room.id();
        let Some(sender) = self.sessions.get(&session_id) else { return vec![] };
        let sender_user_id = sender.user_id.clone();
        let actions = room
            .other_members(session_id)
            .into_iter()
            .map(|peer| {
                StoreAction::new(
                    peer,
                    ServerEvent::ReceiveMessage {
                        sender: sender_user_id.clone(),
                        message: envelope.clone(),
                        reply_to: reply_to_id,
                    },
                )
            })
            .collect();
        self.touch_room(room_id);
        actions
    }

    // ── TYPING ───────────────────────────────────────────────────────────

    pub fn typing_start(&mut self, session_id: SessionId) -> Vec<StoreAction> {
        let Some(room) = self.room_of(session_id) else { return vec![] };
        let room_id = room.id();
        let peers = room.other_members(session_id);
        if !self.typing.start(room_id, session_id) {
            return vec![];
        }
        let Some(sender) = self.sessions.get(&session_id) else { return vec![] };
        let sender_user_id = sender.user_id.clone();
        let actions = peers
            .into_iter()
            .map(|peer| StoreAction::new(peer, ServerEvent::TypingStarted { sender: sender_user_id.clone() }))
            .collect();
        self.touch_room(room_id);
        actions
    }

    pub fn typing_stop(&mut self, session_id: SessionId) -> Vec<StoreAction> {
        let Some(room) = self.room_of(session_id) else { return vec![] };
        let room_id = room.id();
        let peers = room.other_members(session_id);
        if !self.typing.stop(room_id, session_id) {
            return vec![];
        }
        let actions = peers.into_iter().map(|peer| StoreAction::new(peer, ServerEvent::TypingStopped)).collect();
        self.touch_room(room_id);
        actions
    }

    /// Timer tick: emit synthetic `typing_stop` for sessions whose typing
    /// state lapsed (`spec.md` §4.6).
    pub fn sweep_typing(&mut self) -> Vec<StoreAction> {
        let lapsed = self.typing.sweep_expired();
        let mut actions = Vec::new();
        for (room_id, session_id) in lapsed {
            let Some(room) = self.rooms.get(&room_id) else { continue };
            for peer in room.other_members(session_id) {
                actions.push(StoreAction::new(peer, ServerEvent::TypingStopped));
            }
        }
        actions
    }

    // ── DELETE / FILE MARKERS ────────────────────────────────────────────

    pub fn delete_message(&mut self, session_id: SessionId, message_id: String) -> Vec<StoreAction> {
        let Some(room) = self.room_of(session_id) else { return vec![] };
        let room_id = room.id();
        let actions = room
            .other_members(session_id)
            .into_iter()
            .map(|peer| StoreAction::new(peer, ServerEvent::MessageDeleted { message_id: message_id.clone() }))
            .collect();
        self.touch_room(room_id);
        actions
    }

    pub fn file_sending_start(&mut self, session_id: SessionId, file_id: String) -> Vec<StoreAction> {
        self.file_marker(session_id, file_id, true)
    }

    pub fn file_sending_end(&mut self, session_id: SessionId, file_id: String) -> Vec<StoreAction> {
        self.file_marker(session_id, file_id, false)
    }

    fn file_marker(&mut self, session_id: SessionId, file_id: String, starting: bool) -> Vec<StoreAction> {
        let Some(room) = self.room_of(session_id) else { return vec![] };
        let room_id = room.id();
        let Some(sender) = self.sessions.get(&session_id) else { return vec![] };
        let username = sender.username.clone();
        let actions = room
            .other_members(session_id)
            .into_iter()
            .map(|peer| {
                let event = if starting {
                    ServerEvent::FileSendingStarted { file_id: file_id.clone(), username: username.clone() }
                } else {
                    ServerEvent::FileSendingEnded { file_id: file_id.clone(), username: username.clone() }
                };
                StoreAction::new(peer, event)
            })
            .collect();
        self.touch_room(room_id);
        actions
    }

    // ── SIGNAL ───────────────────────────────────────────────────────────

    /// Route a WebRTC signaling frame. If `target_id` is present, unicast to
    /// the matching member of the sender's room; a `target_id` that is not a
    /// member is silently dropped (`spec.md` §9). Otherwise broadcast to all
    /// other members.
    pub fn signal(&mut self, session_id: SessionId, kind: SignalKind, target_id: Option<UserId>, payload: SignalPayload) -> Vec<StoreAction> {
        let Some(room) = self.room_of(session_id) else { return vec![] };
        let room_id = room.id();
        let Some(sender) = self.sessions.get(&session_id) else { return vec![] };
        let sender_user_id = sender.user_id.clone();

        let recipients: Vec<SessionId> = match target_id {
            Some(target) => {
                let members = room.other_members(session_id);
                members
                    .into_iter()
                    .filter(|m| self.sessions.get(m).map(|s| s.user_id == target).unwrap_or(false))
                    .collect()
            }
            None => room.other_members(session_id),
        };

        let actions = recipients
            .into_iter()
            .filter_map(|peer| {
                let event = match (kind, &payload) {
                    (SignalKind::Offer, SignalPayload::Sdp(sdp)) => {
                        ServerEvent::WebrtcOffer { sender_id: sender_user_id.clone(), offer: sdp.clone() }
                    }
                    (SignalKind::Answer, SignalPayload::Sdp(sdp)) => {
                        ServerEvent::WebrtcAnswer { sender_id: sender_user_id.clone(), answer: sdp.clone() }
                    }
                    (SignalKind::IceCandidate, SignalPayload::Candidate(c)) => {
                        ServerEvent::WebrtcIceCandidate { sender_id: sender_user_id.clone(), candidate: c.clone() }
                    }
                    (SignalKind::EndCall, SignalPayload::None) => {
                        ServerEvent::WebrtcEndCall { sender_id: sender_user_id.clone() }
                    }
                    _ => {
                        warn!("signal kind/payload mismatch, dropping");
                        return None;
                    }
                };
                Some(StoreAction::new(peer, event))
            })
            .collect();
        self.touch_room(room_id);
        actions
    }

    // ── LEAVE ────────────────────────────────────────────────────────────

    pub fn leave(&mut self, session_id: SessionId) -> Vec<StoreAction> {
        self.waiting_pool.remove(session_id);
        self.typing.remove_session(session_id);

        let actions = self.leave_inner(session_id);
        self.sessions.remove(&session_id);
        actions
    }

    fn leave_inner(&mut self, session_id: SessionId) -> Vec<StoreAction> {
        let Some(session) = self.sessions.get_mut(&session_id) else { return vec![] };
        let room_id = match session.joined_room.take() {
            Some(id) => id,
            None => {
                session.state = SessionState::Closed;
                return vec![];
            }
        };
        session.state = SessionState::Closed;
        let username = session.username.clone();

        let Some(room) = self.rooms.remove(&room_id) else { return vec![] };
        match room {
            Room::Couple(couple) => self.leave_couple(session_id, couple),
            Room::Group(group) => self.leave_group(session_id, group, username),
        }
    }

    fn leave_couple(&mut self, departing: SessionId, couple: CoupleRoom) -> Vec<StoreAction> {
        let remaining = couple.members.into_iter().find(|m| *m != departing);
        let Some(remaining) = remaining else { return vec![] };
        if let Some(s) = self.sessions.get_mut(&remaining) {
            s.state = SessionState::Unjoined;
            s.joined_room = None;
        }
        vec![StoreAction::new(remaining, ServerEvent::PartnerDisconnected)]
    }

    fn leave_group(&mut self, departing: SessionId, mut group: GroupRoom, username: String) -> Vec<StoreAction> {
        group.members.retain(|m| *m != departing);
        self.typing.remove_room(group.id);

        if group.members.is_empty() {
            self.code_index.remove(group.code.as_str());
            return vec![];
        }

        let remaining_usernames = group.usernames(|sid| {
            self.sessions.get(&sid).map(|s| s.username.as_str())
        });
        let remaining_members = group.members.clone();
        self.rooms.insert(group.id, Room::Group(group));

        let mut actions = Vec::new();
        for member in &remaining_members {
            actions.push(StoreAction::new(*member, ServerEvent::UserLeftGroup { username: username.clone() }));
        }
        for member in remaining_members {
            actions.push(StoreAction::new(
                member,
                ServerEvent::GroupMembersUpdate { usernames: remaining_usernames.clone() },
            ));
        }
        actions
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn touch_room(&mut self, room_id: RoomId) {
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.touch();
        }
    }

    fn room_members(&self, room_id: RoomId) -> Vec<SessionId> {
        self.rooms.get(&room_id).map(|r| r.members().to_vec()).unwrap_or_default()
    }

    fn group_usernames(&self, room_id: RoomId) -> Vec<String> {
        match self.rooms.get(&room_id) {
            Some(Room::Group(room)) => room.usernames(|sid| self.sessions.get(&sid).map(|s| s.username.as_str())),
            _ => vec![],
        }
    }
}

/// The payload carried by a signaling frame, narrowed to what the store
/// needs to reconstruct the outbound event (`spec.md` §4.7).
#[derive(Debug, Clone)]
pub enum SignalPayload {
    Sdp(crate::frame::SdpPayload),
    Candidate(serde_json::Value),
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RoomStore {
        RoomStore::new(RoomStoreConfig::default())
    }

    fn register_group(store: &mut RoomStore, user_id: &str, username: &str) -> SessionId {
        let sid = SessionId::new();
        store.register(sid, user_id.to_string(), username.to_string(), RoomKind::Group);
        sid
    }

    #[test]
    fn create_then_join_group_scenario() {
        let mut store = store();
        let ann = register_group(&mut store, "u-ann", "Ann");
        let actions = store.join(ann, Some(JoinMethod::Create), None);
        assert_eq!(actions.len(), 2);
        let code = match &actions[0].event {
            ServerEvent::ChatStarted { group_code } => group_code.clone().unwrap(),
            other => panic!("expected ChatStarted, got {other:?}"),
        };
        assert!(matches!(&actions[1].event, ServerEvent::GroupMembersUpdate { usernames } if usernames == &["Ann"]));

        let bob = register_group(&mut store, "u-bob", "Bob");
        let actions = store.join(bob, Some(JoinMethod::Join), Some(code));

        // Ann: user_joined_group then group_members_update.
        let ann_actions: Vec<_> = actions.iter().filter(|a| a.to == ann).collect();
        assert!(matches!(&ann_actions[0].event, ServerEvent::UserJoinedGroup { username } if username == "Bob"));
        assert!(matches!(&ann_actions[1].event, ServerEvent::GroupMembersUpdate { usernames } if usernames == &["Ann".to_string(), "Bob".to_string()]));

        // Bob: chat_started then group_members_update.
        let bob_actions: Vec<_> = actions.iter().filter(|a| a.to == bob).collect();
        assert!(matches!(&bob_actions[0].event, ServerEvent::ChatStarted { .. }));
        assert!(matches!(&bob_actions[1].event, ServerEvent::GroupMembersUpdate { .. }));
    }

    #[test]
    fn join_missing_code_is_not_found() {
        let mut store = store();
        let c = register_group(&mut store, "u-c", "Cara");
        let actions = store.join(c, Some(JoinMethod::Join), Some("ZZZZZZ".into()));
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0].event, ServerEvent::GroupNotFound));
    }

    #[test]
    fn wrong_length_code_is_not_found() {
        let mut store = store();
        let c = register_group(&mut store, "u-c", "Cara");
        for bad in ["ABCDE", "ABCDEFG"] {
            let actions = store.join(c, Some(JoinMethod::Join), Some(bad.into()));
            assert_eq!(actions.len(), 1);
            assert!(matches!(actions[0].event, ServerEvent::GroupNotFound));
        }
    }

    #[test]
    fn send_message_fanout_excludes_sender() {
        let mut store = store();
        let ann = register_group(&mut store, "u-ann", "Ann");
        store.join(ann, Some(JoinMethod::Create), None);
        let code = match store.room_of(ann).unwrap() {
            Room::Group(g) => g.code.to_string(),
            _ => unreachable!(),
        };
        let bob = register_group(&mut store, "u-bob", "Bob");
        store.join(bob, Some(JoinMethod::Join), Some(code));

        let envelope = Envelope { encrypted: "E1".into(), nonce: "N1".into() };
        let actions = store.send_message(bob, envelope, None);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].to, ann);
        match &actions[0].event {
            ServerEvent::ReceiveMessage { sender, message, .. } => {
                assert_eq!(sender, "u-bob");
                assert_eq!(message.encrypted, "E1");
            }
            other => panic!("expected ReceiveMessage, got {other:?}"),
        }
    }

    #[test]
    fn departure_in_group_emits_left_then_members_update() {
        let mut store = store();
        let ann = register_group(&mut store, "u-ann", "Ann");
        store.join(ann, Some(JoinMethod::Create), None);
        let code = match store.room_of(ann).unwrap() {
            Room::Group(g) => g.code.to_string(),
            _ => unreachable!(),
        };
        let bob = register_group(&mut store, "u-bob", "Bob");
        store.join(bob, Some(JoinMethod::Join), Some(code));

        let actions = store.leave(bob);
        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0].event, ServerEvent::UserLeftGroup { username } if username == "Bob"));
        assert!(matches!(&actions[1].event, ServerEvent::GroupMembersUpdate { usernames } if usernames == &["Ann".to_string()]));
    }

    #[test]
    fn last_departure_destroys_room_and_frees_code() {
        let mut store = store();
        let ann = register_group(&mut store, "u-ann", "Ann");
        let actions = store.join(ann, Some(JoinMethod::Create), None);
        let code = match &actions[0].event {
            ServerEvent::ChatStarted { group_code } => group_code.clone().unwrap(),
            _ => unreachable!(),
        };
        store.leave(ann);

        let cara = register_group(&mut store, "u-cara", "Cara");
        let actions = store.join(cara, Some(JoinMethod::Join), Some(code));
        assert!(matches!(actions[0].event, ServerEvent::GroupNotFound));
    }

    #[test]
    fn couple_waiting_then_matched() {
        let cfg = RoomStoreConfig::default();
        let mut store = RoomStore::new(cfg);
        let a = SessionId::new();
        store.register(a, "u-a".into(), "A".into(), RoomKind::Couple);
        let actions = store.join(a, None, None);
        assert!(matches!(actions[0].event, ServerEvent::WaitingForMatch));

        let b = SessionId::new();
        store.register(b, "u-b".into(), "B".into(), RoomKind::Couple);
        let actions = store.join(b, None, None);
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| matches!(a.event, ServerEvent::ChatStarted { .. })));
    }

    #[test]
    fn couple_departure_unjoins_remaining_member() {
        let mut store = RoomStore::new(RoomStoreConfig::default());
        let a = SessionId::new();
        let b = SessionId::new();
        store.register(a, "u-a".into(), "A".into(), RoomKind::Couple);
        store.register(b, "u-b".into(), "B".into(), RoomKind::Couple);
        store.join(a, None, None);
        store.join(b, None, None);

        let actions = store.leave(a);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].to, b);
        assert!(matches!(actions[0].event, ServerEvent::PartnerDisconnected));
        assert_eq!(store.session(b).unwrap().state, SessionState::Unjoined);
        assert!(store.room_of(b).is_none());
    }

    #[test]
    fn typing_start_then_stop_round_trips() {
        let mut store = store();
        let ann = register_group(&mut store, "u-ann", "Ann");
        store.join(ann, Some(JoinMethod::Create), None);
        let code = match store.room_of(ann).unwrap() {
            Room::Group(g) => g.code.to_string(),
            _ => unreachable!(),
        };
        let bob = register_group(&mut store, "u-bob", "Bob");
        store.join(bob, Some(JoinMethod::Join), Some(code));

        let actions = store.typing_start(ann);
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0].event, ServerEvent::TypingStarted { sender } if sender == "u-ann"));

        // Redundant start: no new broadcast.
        assert!(store.typing_start(ann).is_empty());

        let actions = store.typing_stop(ann);
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0].event, ServerEvent::TypingStopped));
    }

    #[test]
    fn signal_with_target_id_unicasts_only_to_match() {
        let mut store = store();
        let ann = register_group(&mut store, "u-ann", "Ann");
        store.join(ann, Some(JoinMethod::Create), None);
        let code = match store.room_of(ann).unwrap() {
            Room::Group(g) => g.code.to_string(),
            _ => unreachable!(),
        };
        let bob = register_group(&mut store, "u-bob", "Bob");
        store.join(bob, Some(JoinMethod::Join), Some(code.clone()));
        let cara = register_group(&mut store, "u-cara", "Cara");
        store.join(cara, Some(JoinMethod::Join), Some(code));

        let sdp = crate::frame::SdpPayload { sdp: "v=0".into(), sdp_type: "offer".into() };
        let actions = store.signal(ann, SignalKind::Offer, Some("u-bob".into()), SignalPayload::Sdp(sdp));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].to, bob);
    }

    #[test]
    fn signal_target_not_a_member_is_dropped() {
        let mut store = store();
        let ann = register_group(&mut store, "u-ann", "Ann");
        store.join(ann, Some(JoinMethod::Create), None);
        let sdp = crate::frame::SdpPayload { sdp: "v=0".into(), sdp_type: "offer".into() };
        let actions = store.signal(ann, SignalKind::Offer, Some("ghost".into()), SignalPayload::Sdp(sdp));
        assert!(actions.is_empty());
    }

    #[test]
    fn leave_removes_the_session_record() {
        let mut store = store();
        let ann = register_group(&mut store, "u-ann", "Ann");
        store.join(ann, Some(JoinMethod::Create), None);
        store.leave(ann);
        assert!(store.session(ann).is_none(), "a departed session must not linger in the table");
    }

    #[test]
    fn send_with_no_recipients_after_partner_disconnect_is_dropped() {
        let mut store = RoomStore::new(RoomStoreConfig::default());
        let a = SessionId::new();
        let b = SessionId::new();
        store.register(a, "u-a".into(), "A".into(), RoomKind::Couple);
        store.register(b, "u-b".into(), "B".into(), RoomKind::Couple);
        store.join(a, None, None);
        store.join(b, None, None);
        store.leave(b);

        let envelope = Envelope { encrypted: "E".into(), nonce: "N".into() };
        let actions = store.send_message(a, envelope, None);
        assert!(actions.is_empty(), "sender has no room left, send is dropped");
    }
}
