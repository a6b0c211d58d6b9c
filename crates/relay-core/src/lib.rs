//! Room store, event protocol, and matchmaking for the anonymous chat relay.
//!
//! This crate holds every piece of state and decision logic that does not
//! touch a socket: frame codec, session/room bookkeeping, the group-code
//! matchmaker, and the typing tracker, all driven through `RoomStore`.
//! `relay-server` owns the actual WebSocket I/O and calls into here.

pub mod config;
pub mod error;
pub mod frame;
pub mod matchmaker;
pub mod room;
pub mod session;
pub mod store;
pub mod typing;
pub mod types;

pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use frame::{ClientEvent, Envelope, ServerEvent};
pub use session::{SessionState, UserSession};
pub use store::{JoinMethod, RoomStore, RoomStoreConfig, SignalKind, SignalPayload, StoreAction};
pub use types::{GroupCode, RoomId, RoomKind, SessionId, UserId};
