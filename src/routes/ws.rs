//! WebSocket handlers — position ingest and periodic broadcast.
//!
//! DESIGN
//! ======
//! Two independent roles share nothing but the `Registry`:
//! - `/wsecho`: one ingest loop per connection. Each decoded position is
//!   echoed back to the sender, then stored under the connection's ID.
//! - `/wstime`: one emitter per subscriber. Every tick it snapshots the
//!   registry and pushes `{players, cursors}`.
//!
//! Inbound frames are classified by `classify_inbound` and outbound
//! broadcasts are built by `broadcast_message`, so the transport loop stays
//! thin and the message handling is testable without a socket. The loops
//! only see the `Channel` trait (receive + send), which `WebSocket` implements.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → allocate `ConnectionId`
//! 2. Ingest: take an `EntryLease`, loop receive → decode → echo → upsert
//! 3. Any receive, decode, or send failure (or a clean close) ends the loop
//! 4. Drop the lease (entry removed) → send Close → log exit reason
//!
//! Every failure is terminal for its own connection only. Nothing retries.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::message::{self, Broadcast, DecodeError, EncodeError, Position};
use crate::registry::{ConnectionId, EntryLease, Registry};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

/// Why a connection's loop stopped.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionExit {
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("receive failed: {0}")]
    Receive(axum::Error),
    #[error("malformed message: {0}")]
    Decode(#[from] DecodeError),
    #[error("send failed: {0}")]
    Send(axum::Error),
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),
}

/// The two transport primitives the loops need. Implemented by axum's
/// `WebSocket`; tests substitute a scripted transport.
pub(crate) trait Channel: Send {
    fn recv(&mut self) -> impl Future<Output = Option<Result<Message, axum::Error>>> + Send;
    fn send(&mut self, msg: Message) -> impl Future<Output = Result<(), axum::Error>> + Send;
}

impl Channel for WebSocket {
    fn recv(&mut self) -> impl Future<Output = Option<Result<Message, axum::Error>>> + Send {
        WebSocket::recv(self)
    }

    fn send(&mut self, msg: Message) -> impl Future<Output = Result<(), axum::Error>> + Send {
        WebSocket::send(self, msg)
    }
}

/// What one inbound websocket frame means to the ingest loop.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Report(Position),
    Closed,
    /// Ping/pong; axum answers pings on its own.
    Control,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_echo(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |mut socket| async move {
        run_ingest(&mut socket, &state, peer).await;
    })
}

pub async fn handle_broadcast(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |mut socket| async move {
        run_emitter(&mut socket, &state, peer).await;
    })
}

// =============================================================================
// INGEST
// =============================================================================

/// Drive one ingest connection to completion and return why it ended.
async fn run_ingest<C: Channel>(socket: &mut C, state: &AppState, peer: SocketAddr) -> ConnectionExit {
    let conn_id = state.next_connection_id();
    let lease = state.registry.lease(conn_id);
    info!(%conn_id, %peer, "wsecho: client connected");

    let exit = ingest_loop(socket, &lease).await;

    // Entry goes away before the transport does.
    drop(lease);
    close_socket(socket, conn_id).await;
    log_exit("wsecho", conn_id, &exit);
    exit
}

async fn ingest_loop<C: Channel>(socket: &mut C, lease: &EntryLease) -> ConnectionExit {
    let conn_id = lease.id();
    loop {
        let msg = match socket.recv().await {
            None => return ConnectionExit::PeerClosed,
            Some(Err(e)) => return ConnectionExit::Receive(e),
            Some(Ok(msg)) => msg,
        };

        let position = match classify_inbound(msg) {
            Ok(Inbound::Report(position)) => position,
            Ok(Inbound::Closed) => return ConnectionExit::PeerClosed,
            Ok(Inbound::Control) => continue,
            Err(e) => return e.into(),
        };
        debug!(%conn_id, x = position.x, y = position.y, "wsecho: recv position");

        let echo = match message::encode(&position) {
            Ok(text) => Message::Text(text.into()),
            Err(e) => return e.into(),
        };
        if let Err(e) = socket.send(echo).await {
            return ConnectionExit::Send(e);
        }

        lease.set(position);
    }
}

/// Interpret one inbound frame. Text and binary payloads both carry JSON.
fn classify_inbound(msg: Message) -> Result<Inbound, DecodeError> {
    match msg {
        Message::Text(text) => Ok(Inbound::Report(message::decode_position(text.as_str().as_bytes())?)),
        Message::Binary(bytes) => Ok(Inbound::Report(message::decode_position(&bytes)?)),
        Message::Close(_) => Ok(Inbound::Closed),
        _ => Ok(Inbound::Control),
    }
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Push broadcasts to one subscriber until a send or receive fails.
async fn run_emitter<C: Channel>(socket: &mut C, state: &AppState, peer: SocketAddr) -> ConnectionExit {
    let conn_id = state.next_connection_id();
    info!(%conn_id, %peer, "wstime: subscriber connected");

    let exit = emit_loop(socket, state).await;

    close_socket(socket, conn_id).await;
    log_exit("wstime", conn_id, &exit);
    exit
}

async fn emit_loop<C: Channel>(socket: &mut C, state: &AppState) -> ConnectionExit {
    let mut ticker = tokio::time::interval(state.broadcast_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let msg = match broadcast_message(&state.registry) {
                    Ok(msg) => msg,
                    Err(e) => return e.into(),
                };
                if let Err(e) = socket.send(msg).await {
                    return ConnectionExit::Send(e);
                }
            }
            inbound = socket.recv() => match inbound {
                None | Some(Ok(Message::Close(_))) => return ConnectionExit::PeerClosed,
                Some(Err(e)) => return ConnectionExit::Receive(e),
                // Subscribers have nothing to say; drop whatever they send.
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Snapshot the registry and encode it as one broadcast frame.
fn broadcast_message(registry: &Registry) -> Result<Message, EncodeError> {
    let broadcast = Broadcast::from(registry.snapshot());
    Ok(Message::Text(message::encode(&broadcast)?.into()))
}

// =============================================================================
// HELPERS
// =============================================================================

/// Best-effort close. The connection is gone either way.
async fn close_socket<C: Channel>(socket: &mut C, conn_id: ConnectionId) {
    if let Err(e) = socket.send(Message::Close(None)).await {
        debug!(%conn_id, error = %e, "ws: close failed");
    }
}

fn log_exit(role: &'static str, conn_id: ConnectionId, exit: &ConnectionExit) {
    match exit {
        ConnectionExit::PeerClosed => info!(%conn_id, role, "ws: client disconnected"),
        other => warn!(%conn_id, role, reason = %other, "ws: connection dropped"),
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
