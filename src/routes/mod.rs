//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the two websocket endpoints, a health check, and the static front
//! end under a single Axum router. `/wsecho` carries position reports in and
//! echoes them back; `/wstime` pushes the periodic broadcast.

pub mod ws;

use std::path::Path;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router. Static files are served from
/// `static_dir` for any path not matched by an endpoint.
pub fn app(state: AppState, static_dir: &Path) -> Router {
    let static_files = ServeDir::new(static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/wsecho", get(ws::handle_echo))
        .route("/wstime", get(ws::handle_broadcast))
        .route("/healthz", get(healthz))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
