use std::sync::Arc;

use clap::Parser;
use relay_core::RoomStore;
use relay_server::{
    config::Args,
    connection::ConnectionContext,
    registry::OutboundRegistry,
    {health, listener, sweeper},
};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let relay_config = args.relay_config();

    let store = Arc::new(Mutex::new(RoomStore::new(relay_config.room_store_config())));
    let registry = OutboundRegistry::new();
    let ctx = Arc::new(ConnectionContext { store: store.clone(), registry: registry.clone(), config: relay_config });

    tokio::spawn(sweeper::run(store, registry));
    tokio::spawn(health::serve(args.health_bind));

    listener::serve(&args, ctx).await
}
