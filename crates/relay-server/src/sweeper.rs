/// Background ticks for the two timer-driven store transitions: typing
/// expiry (`spec.md` §4.6) and waiting-pool match timeout (`spec.md` §4.3).
/// Both run on the same short interval; each tick is its own store critical
/// section, same as a connection-originated command.
use std::sync::Arc;
use std::time::Duration;

use relay_core::{RoomStore, StoreAction};
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::debug;

use crate::registry::OutboundRegistry;

const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

pub async fn run(store: Arc<Mutex<RoomStore>>, registry: OutboundRegistry) {
    let mut ticker = interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let actions = {
            let mut store = store.lock().await;
            let mut actions = store.sweep_typing();
            actions.extend(store.sweep_waiting_pool());
            actions
        };
        if !actions.is_empty() {
            debug!(count = actions.len(), "sweep produced actions");
        }
        deliver(actions, &registry).await;
    }
}

async fn deliver(actions: Vec<StoreAction>, registry: &OutboundRegistry) {
    for action in actions {
        registry.send(action.to, &action.event).await;
    }
}
