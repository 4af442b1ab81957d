//! Shared harness: boots the real router on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use cursorboard::message::{Broadcast, Position};
use cursorboard::registry::Registry;
use cursorboard::state::AppState;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const WAIT: Duration = Duration::from_secs(2);

pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Registry,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let registry = Registry::new();
        let state = AppState::new(registry.clone(), Duration::from_millis(10));
        let static_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("web/static");

        tokio::spawn(async move {
            let _ = cursorboard::serve(listener, state, &static_dir).await;
        });

        Self { addr, registry }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn connect(&self, path: &str) -> Ws {
        let url = format!("ws://{}{path}", self.addr);
        let (ws, _) = timeout(WAIT, connect_async(url))
            .await
            .expect("ws connect timed out")
            .expect("ws connect failed");
        ws
    }

    /// Poll the registry until `check` holds or the deadline passes.
    pub async fn wait_for_registry(&self, what: &str, check: impl Fn(&Registry) -> bool) {
        let deadline = Instant::now() + WAIT;
        while !check(&self.registry) {
            assert!(Instant::now() < deadline, "timed out waiting for registry: {what}");
            sleep(Duration::from_millis(5)).await;
        }
    }
}

pub async fn send_position(ws: &mut Ws, x: i64, y: i64) {
    let text = serde_json::to_string(&Position { x, y }).expect("encode position");
    ws.send(Message::text(text)).await.expect("send position");
}

pub async fn send_raw(ws: &mut Ws, text: &str) {
    ws.send(Message::text(text.to_string())).await.expect("send raw text");
}

/// Next text frame, skipping control frames.
pub async fn recv_text(ws: &mut Ws) -> String {
    loop {
        let msg = timeout(WAIT, ws.next())
            .await
            .expect("receive timed out")
            .expect("stream ended")
            .expect("receive failed");
        match msg {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Ping(_) | Message::Pong(_) => {}
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

pub async fn recv_position(ws: &mut Ws) -> Position {
    serde_json::from_str(&recv_text(ws).await).expect("echo should be a position")
}

/// Read broadcasts until one satisfies `check`.
pub async fn recv_broadcast_matching(ws: &mut Ws, check: impl Fn(&Broadcast) -> bool) -> Broadcast {
    let deadline = Instant::now() + WAIT;
    loop {
        let broadcast: Broadcast = serde_json::from_str(&recv_text(ws).await).expect("broadcast should decode");
        if check(&broadcast) {
            return broadcast;
        }
        assert!(Instant::now() < deadline, "no matching broadcast, last: {broadcast:?}");
    }
}

/// True once the server has ended the connection (close frame, EOF, or error).
pub async fn server_closed(ws: &mut Ws) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        match timeout(WAIT, ws.next()).await {
            Ok(None | Some(Err(_) | Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(_))) => {}
            Err(_) => return false,
        }
    }
    false
}
