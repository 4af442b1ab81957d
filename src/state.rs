//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It owns the position registry and hands out connection IDs. Nothing here
//! is process-global, so tests can run isolated instances side by side.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::registry::{ConnectionId, Registry};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    /// Time between pushes on each broadcast connection.
    pub broadcast_interval: Duration,
    next_connection: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(registry: Registry, broadcast_interval: Duration) -> Self {
        Self { registry, broadcast_interval, next_connection: Arc::new(AtomicU64::new(1)) }
    }

    /// Allocate an ID that no other connection in this process will get.
    #[must_use]
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_connection.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
