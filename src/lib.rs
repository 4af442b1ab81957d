//! Real-time pointer position sharing over websockets.
//!
//! Clients report `{x, y}` on `/wsecho` and subscribe to periodic
//! `{players, cursors}` pushes on `/wstime`. The only shared state is the
//! [`registry::Registry`], injected through [`state::AppState`].

pub mod config;
pub mod message;
pub mod registry;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::registry::Registry;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: std::io::Error },
    #[error("server failed: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bind the configured address and serve until the process is stopped.
///
/// # Errors
///
/// Returns [`ServeError::Bind`] if the listener cannot be opened and
/// [`ServeError::Serve`] if the accept loop fails.
pub async fn run(config: Config) -> Result<(), ServeError> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;

    let state = AppState::new(Registry::new(), config.broadcast_interval());
    info!(%addr, interval_ms = config.broadcast_interval_ms, "cursorboard listening");
    serve(listener, state, &config.static_dir).await?;
    Ok(())
}

/// Serve the application on an already-bound listener.
///
/// # Errors
///
/// Returns an I/O error if the accept loop fails.
pub async fn serve(listener: TcpListener, state: AppState, static_dir: &Path) -> std::io::Result<()> {
    let app = routes::app(state, static_dir);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await
}
