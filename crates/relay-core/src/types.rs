use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-assigned, opaque identifier for a connected channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-supplied identity. Not trusted for authorization, only for
/// addressing `target_id` in signaling frames and echoing `sender` fields.
pub type UserId = String;

/// Room identifier, assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(Uuid);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 6-(or widened 8-)character alphanumeric public code for a group room.
/// Case-sensitive on the wire — see `spec.md` §4.4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupCode(String);

impl GroupCode {
    pub fn new(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize client input: strip non-alphanumerics, cap at the widened
    /// code length so both 6- and 8-char codes survive lookup unmangled.
    /// Mirrors the client-side normalization `spec.md` §4.4 and §8 describe.
    pub fn normalize(raw: &str) -> String {
        raw.chars().filter(|c| c.is_ascii_alphanumeric()).take(WIDENED_CODE_LENGTH).collect()
    }
}

impl fmt::Display for GroupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a session intends to join/create a couple or a group room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Couple,
    Group,
}

/// Alphabet code generation draws from — 62 symbols per `spec.md` §4.4.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub const DEFAULT_CODE_LENGTH: usize = 6;
pub const WIDENED_CODE_LENGTH: usize = 8;
pub const CODE_COLLISION_RETRIES: usize = 8;

pub const DEFAULT_MATCH_TIMEOUT_SECS: u64 = 60;
pub const TYPING_EXPIRY_SECS: u64 = 5;
pub const DEFAULT_KEEPALIVE_SECS: u64 = 30;
pub const DEFAULT_OUTBOUND_QUEUE_DEPTH: usize = 256;
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;
