use std::time::Instant;

use crate::types::{GroupCode, RoomId, SessionId};

/// A couple room: exactly two members, terminal on any departure.
#[derive(Debug, Clone)]
pub struct CoupleRoom {
    pub id: RoomId,
    pub members: [SessionId; 2],
    /// Last time a command touched this room. Observability only — never
    /// read by store logic (`spec.md` §3 data model).
    pub last_activity_at: Instant,
}

/// A group room: identified by a public `GroupCode`, membership ordered by
/// join time for display (`group_members_update`).
#[derive(Debug, Clone)]
pub struct GroupRoom {
    pub id: RoomId,
    pub code: GroupCode,
    pub members: Vec<SessionId>,
    /// Last time a command touched this room. Observability only — never
    /// read by store logic (`spec.md` §3 data model).
    pub last_activity_at: Instant,
}

impl GroupRoom {
    pub fn usernames<'a>(&self, lookup: impl Fn(SessionId) -> Option<&'a str>) -> Vec<String> {
        self.members
            .iter()
            .filter_map(|id| lookup(*id).map(str::to_owned))
            .collect()
    }
}

/// A room is either a couple room or a group room. Both share the invariant
/// that a room with zero members is destroyed atomically with the last
/// departure (`spec.md` §3).
#[derive(Debug, Clone)]
pub enum Room {
    Couple(CoupleRoom),
    Group(GroupRoom),
}

impl Room {
    pub fn id(&self) -> RoomId {
        match self {
            Room::Couple(r) => r.id,
            Room::Group(r) => r.id,
        }
    }

    pub fn members(&self) -> &[SessionId] {
        match self {
            Room::Couple(r) => &r.members,
            Room::Group(r) => &r.members,
        }
    }

    pub fn other_members(&self, excluding: SessionId) -> Vec<SessionId> {
        self.members().iter().copied().filter(|m| *m != excluding).collect()
    }

    pub fn is_member(&self, session: SessionId) -> bool {
        self.members().contains(&session)
    }

    pub fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    pub fn touch(&mut self) {
        let now = Instant::now();
        match self {
            Room::Couple(r) => r.last_activity_at = now,
            Room::Group(r) => r.last_activity_at = now,
        }
    }
}
