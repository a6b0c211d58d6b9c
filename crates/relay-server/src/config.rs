/// CLI + environment configuration, layered the way `tom-relay`'s server
/// feature expects one: `clap` derive struct with `env` fallbacks, all
/// variables under a `RELAY_` prefix.
use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use relay_core::RelayConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "relay-server", about = "Anonymous end-to-end-encrypted chat relay")]
pub struct Args {
    /// Address the WebSocket listener binds to.
    #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Address the `/healthz` HTTP listener binds to.
    #[arg(long, env = "RELAY_HEALTH_BIND", default_value = "0.0.0.0:8081")]
    pub health_bind: SocketAddr,

    /// Seconds a couple-mode waiter sits in the pool before `no_match_found`.
    #[arg(long, env = "RELAY_MATCH_TIMEOUT_SECS", default_value_t = 60)]
    pub match_timeout_secs: u64,

    /// Seconds a dangling `typing_start` survives before a synthetic stop.
    #[arg(long, env = "RELAY_TYPING_EXPIRY_SECS", default_value_t = 5)]
    pub typing_expiry_secs: u64,

    /// Idle seconds before the connection actor pings the channel.
    #[arg(long, env = "RELAY_KEEPALIVE_SECS", default_value_t = 30)]
    pub keepalive_secs: u64,

    /// Bound on each session's outbound delivery channel.
    #[arg(long, env = "RELAY_OUTBOUND_QUEUE_DEPTH", default_value_t = 256)]
    pub outbound_queue_depth: usize,

    /// Whether the legacy couple-matching path is reachable.
    #[arg(long, env = "RELAY_COUPLE_ENABLED", default_value_t = true)]
    pub couple_enabled: bool,

    /// Protocol violations tolerated within the window before disconnect.
    #[arg(long, env = "RELAY_MAX_PROTOCOL_ERRORS", default_value_t = 5)]
    pub max_protocol_errors: u32,

    /// Comma-separated list of allowed `Origin` header values. Empty means
    /// any origin is accepted.
    #[arg(long, env = "RELAY_ALLOWED_ORIGINS", value_delimiter = ',', default_value = "")]
    pub allowed_origins: Vec<String>,
}

impl Args {
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            match_timeout: Duration::from_secs(self.match_timeout_secs),
            typing_expiry: Duration::from_secs(self.typing_expiry_secs),
            keepalive_interval: Duration::from_secs(self.keepalive_secs),
            outbound_queue_depth: self.outbound_queue_depth,
            couple_enabled: self.couple_enabled,
            max_protocol_errors: self.max_protocol_errors,
            protocol_error_window: Duration::from_secs(60),
            allowed_origins: self.allowed_origins.iter().filter(|o| !o.is_empty()).cloned().collect(),
        }
    }
}
