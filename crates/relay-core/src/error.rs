/// Relay-level errors, grouped the way `spec.md` §7 names them.
///
/// `Protocol` and `State` are recoverable — the session stays open. `Transport`
/// and `ResourceExhaustion` always imply the session is being torn down.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("state error: {0}")]
    State(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),
}

impl RelayError {
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol(reason.into())
    }

    pub fn state(reason: impl Into<String>) -> Self {
        Self::State(reason.into())
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
