/// The WebSocket accept loop: binds `config.bind` and spawns one
/// `connection::handle_connection` task per accepted TCP connection.
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::connection::{handle_connection, ConnectionContext};
use crate::config::Args;

pub async fn serve(args: &Args, ctx: Arc<ConnectionContext>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(args.bind).await?;
    info!(bind = %args.bind, "relay listening");
    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        let ctx = ctx.clone();
        tokio::spawn(async move {
            handle_connection(stream, peer_addr, ctx).await;
        });
    }
}
