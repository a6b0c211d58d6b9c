/// The connection actor: one task per client channel.
///
/// Owns the WebSocket stream and the outbound receiver. Reads inbound frames
/// sequentially, applies each to the room store while holding its lock (so
/// the store's "serializable per room" guarantee, `spec.md` §4.3, holds: no
/// other command on this session's room interleaves mid-dispatch), and
/// relays the resulting actions. Exits on read/write error, close, or a
/// protocol-violation trip, always issuing `LEAVE` on the way out
/// (`spec.md` §4.2).
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use relay_core::{
    ClientEvent, JoinMethod, RelayConfig, RoomKind, RoomStore, SessionId, SignalKind,
    SignalPayload, StoreAction,
};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::time::interval;
use tokio_websockets::{Message, ServerBuilder};
use tracing::{info, warn};

use crate::registry::{Delivery, OutboundRegistry};
use crate::violations::ViolationTracker;

pub struct ConnectionContext {
    pub store: Arc<Mutex<RoomStore>>,
    pub registry: OutboundRegistry,
    pub config: RelayConfig,
}

pub async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, ctx: Arc<ConnectionContext>) {
    let (request, mut ws) = match ServerBuilder::new().accept(stream).await {
        Ok(v) => v,
        Err(e) => {
            warn!(%peer_addr, error = %e, "websocket handshake failed");
            return;
        }
    };

    let origin = request.headers().get(hyper::header::ORIGIN).and_then(|v| v.to_str().ok());
    if !ctx.config.origin_allowed(origin) {
        warn!(%peer_addr, origin, "rejected connection from disallowed origin");
        let _ = ws.send(Message::close(None, "")).await;
        return;
    }

    let session_id = SessionId::new();
    info!(%peer_addr, %session_id, "connection accepted");

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(ctx.config.outbound_queue_depth);
    ctx.registry.register(session_id, outbound_tx).await;

    let (mut sink, mut stream) = ws.split();
    let mut violations = ViolationTracker::new(ctx.config.max_protocol_errors, ctx.config.protocol_error_window);
    let mut keepalive = interval(ctx.config.keepalive_interval);
    keepalive.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(text) => {
                        if sink.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(msg)) if msg.is_text() => {
                        let Some(text) = msg.as_text() else { continue };
                        if !handle_frame(text, session_id, &ctx).await && violations.record() {
                            warn!(%session_id, "too many protocol violations, closing");
                            break;
                        }
                    }
                    Some(Ok(msg)) if msg.is_close() => break,
                    Some(Ok(_)) => continue, // ping/pong/binary: no payload to act on
                    Some(Err(e)) => {
                        warn!(%session_id, error = %e, "read error");
                        break;
                    }
                    None => break,
                }
            }
            _ = keepalive.tick() => {
                if sink.send(Message::ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    let actions = ctx.store.lock().await.leave(session_id);
    dispatch(actions, &ctx).await;
    ctx.registry.unregister(session_id).await;
    info!(%peer_addr, %session_id, "connection closed");
}

/// Decode one inbound frame and apply it to the store. Returns `false` for a
/// decode failure (counted as a protocol violation); `true` otherwise,
/// including for accepted state errors that the store replies to directly.
async fn handle_frame(text: &str, session_id: SessionId, ctx: &ConnectionContext) -> bool {
    let event = match ClientEvent::decode(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(%session_id, error = %e, "protocol violation");
            return false;
        }
    };

    let actions = {
        let mut store = ctx.store.lock().await;
        apply(&mut store, session_id, event)
    };
    dispatch(actions, ctx).await;
    true
}

fn apply(store: &mut RoomStore, session_id: SessionId, event: ClientEvent) -> Vec<StoreAction> {
    match event {
        ClientEvent::JoinChat(p) => {
            let room_type = if p.room_type == "couple" { RoomKind::Couple } else { RoomKind::Group };
            store.register(session_id, p.user_id, p.username, room_type);
            let method = p.group_join_method.as_deref().map(|m| match m {
                "join" => JoinMethod::Join,
                _ => JoinMethod::Create,
            });
            store.join(session_id, method, p.group_code)
        }
        ClientEvent::SendMessage(p) => store.send_message(session_id, p.message, p.reply_to_id),
        ClientEvent::TypingStart(_) => store.typing_start(session_id),
        ClientEvent::TypingStop(_) => store.typing_stop(session_id),
        ClientEvent::DeleteMessage(p) => store.delete_message(session_id, p.message_id),
        ClientEvent::FileSendingStart(p) => store.file_sending_start(session_id, p.file_id),
        ClientEvent::FileSendingEnd(p) => store.file_sending_end(session_id, p.file_id),
        ClientEvent::WebrtcOffer(p) => {
            store.signal(session_id, SignalKind::Offer, p.target_id, SignalPayload::Sdp(p.offer))
        }
        ClientEvent::WebrtcAnswer(p) => {
            store.signal(session_id, SignalKind::Answer, p.target_id, SignalPayload::Sdp(p.answer))
        }
        ClientEvent::WebrtcIceCandidate(p) => {
            store.signal(session_id, SignalKind::IceCandidate, p.target_id, SignalPayload::Candidate(p.candidate))
        }
        ClientEvent::WebrtcEndCall(p) => {
            store.signal(session_id, SignalKind::EndCall, p.target_id, SignalPayload::None)
        }
        ClientEvent::DisconnectChat => store.leave(session_id),
    }
}

/// Deliver a batch of actions in order, escalating full-queue non-droppable
/// failures into a follow-up `LEAVE` for the unhealthy recipient
/// (`spec.md` §4.5, §5).
async fn dispatch(actions: Vec<StoreAction>, ctx: &ConnectionContext) {
    for action in actions {
        match ctx.registry.send(action.to, &action.event).await {
            Delivery::Sent | Delivery::NotConnected | Delivery::Dropped => {}
            Delivery::Unhealthy => {
                warn!(session_id = %action.to, "outbound queue saturated, scheduling leave");
                let follow_up = ctx.store.lock().await.leave(action.to);
                // Deliberately not recursive: a LEAVE never produces actions
                // addressed back to an already-unhealthy session.
                Box::pin(dispatch(follow_up, ctx)).await;
            }
        }
    }
}
