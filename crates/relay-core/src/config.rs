/// Policy knobs shared by the store and the connection-actor supervisor.
///
/// Kept separate from `RoomStoreConfig` (which only holds what the store
/// itself consults) so `relay-server` can own one place to parse environment
/// variables and CLI flags into, then hand out the pieces each layer needs.
use std::time::Duration;

use crate::store::RoomStoreConfig;
use crate::types::{
    DEFAULT_KEEPALIVE_SECS, DEFAULT_MATCH_TIMEOUT_SECS, DEFAULT_OUTBOUND_QUEUE_DEPTH,
    TYPING_EXPIRY_SECS,
};

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// How long a couple-mode waiter sits in the pool before `no_match_found`.
    pub match_timeout: Duration,
    /// Soft-expiry window for a dangling `typing_start`.
    pub typing_expiry: Duration,
    /// Idle time before the connection actor sends a transport-level ping.
    pub keepalive_interval: Duration,
    /// Bound on each session's outbound delivery channel (`spec.md` §5).
    pub outbound_queue_depth: usize,
    /// Whether the legacy couple-matching path is reachable at all.
    pub couple_enabled: bool,
    /// Protocol violations tolerated in the sliding window before the
    /// connection is torn down (`spec.md` §7).
    pub max_protocol_errors: u32,
    pub protocol_error_window: Duration,
    /// `Origin` header values allowed to open a connection. Empty means any
    /// origin is accepted (`spec.md` §Configuration).
    pub allowed_origins: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            match_timeout: Duration::from_secs(DEFAULT_MATCH_TIMEOUT_SECS),
            typing_expiry: Duration::from_secs(TYPING_EXPIRY_SECS),
            keepalive_interval: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
            outbound_queue_depth: DEFAULT_OUTBOUND_QUEUE_DEPTH,
            couple_enabled: true,
            max_protocol_errors: 5,
            protocol_error_window: Duration::from_secs(60),
            allowed_origins: Vec::new(),
        }
    }
}

impl RelayConfig {
    pub fn room_store_config(&self) -> RoomStoreConfig {
        RoomStoreConfig {
            match_timeout: self.match_timeout,
            couple_enabled: self.couple_enabled,
            typing_expiry: self.typing_expiry,
        }
    }

    /// `true` when `origin` should be allowed to open a connection. An empty
    /// allow-list accepts everything, matching the default of not requiring
    /// the `Origin` header at all.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        match origin {
            Some(origin) => self.allowed_origins.iter().any(|o| o == origin),
            None => false,
        }
    }
}
