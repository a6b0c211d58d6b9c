/// Minimal `/healthz` HTTP listener, served on its own port so it never
/// shares a connection with the WebSocket upgrade handshake.
use std::convert::Infallible;
use std::net::SocketAddr;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{info, warn};

async fn respond(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let healthy = req.uri().path() == "/healthz";
    let body = if healthy { Bytes::from_static(b"ok") } else { Bytes::new() };
    let mut response = Response::new(Full::new(body));
    if !healthy {
        *response.status_mut() = hyper::StatusCode::NOT_FOUND;
    }
    Ok(response)
}

pub async fn serve(bind: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!(%bind, "health listener up");
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new().serve_connection(io, service_fn(respond)).await {
                warn!(error = %e, "health connection error");
            }
        });
    }
}
