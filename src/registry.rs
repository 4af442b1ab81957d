//! Position registry — live pointer position per connection.
//!
//! DESIGN
//! ======
//! A single `RwLock<HashMap<ConnectionId, Position>>` shared behind an `Arc`.
//! Positions are `Copy`, so every write replaces a whole value and a reader
//! can never observe half of an update. Snapshots copy the map under the read
//! lock and release it immediately; the lock is never held across an await.
//!
//! TRADE-OFFS
//! ==========
//! A snapshot holds the read lock for the whole copy, so a writer can wait
//! O(n) entry copies rather than one. That is what makes the snapshot a
//! single instant across every key; per-key shards would bound writer
//! latency to one entry but could mix states from different moments.
//!
//! LIFECYCLE
//! =========
//! Ingest handlers do not call `remove` themselves. They hold an
//! `EntryLease`, and dropping the lease removes the entry. The task that owns
//! the lease is the only one that ever writes or removes that key, and the
//! removal runs on every exit path (error, close, panic, abort).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::message::{Broadcast, Position};

// =============================================================================
// CONNECTION ID
// =============================================================================

/// Opaque handle for one live connection. Never leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Shared map of connection to last reported position. Cloning shares the map.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<HashMap<ConnectionId, Position>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the position for `id`.
    pub fn upsert(&self, id: ConnectionId, position: Position) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(id, position);
    }

    /// Remove the entry for `id`. Returns `false` if there was none.
    pub fn remove(&self, id: ConnectionId) -> bool {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(&id).is_some()
    }

    /// Copy every entry as of a single instant.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Snapshot { entries: map.iter().map(|(id, pos)| (*id, *pos)).collect() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bind `id` to this registry for the lifetime of the returned lease.
    /// No entry is created until the first [`EntryLease::set`].
    #[must_use]
    pub fn lease(&self, id: ConnectionId) -> EntryLease {
        EntryLease { registry: self.clone(), id }
    }
}

// =============================================================================
// ENTRY LEASE
// =============================================================================

/// Ownership of one registry key. Dropping the lease removes the entry.
pub struct EntryLease {
    registry: Registry,
    id: ConnectionId,
}

impl EntryLease {
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn set(&self, position: Position) {
        self.registry.upsert(self.id, position);
    }
}

impl Drop for EntryLease {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Point-in-time copy of the registry. Order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: Vec<(ConnectionId, Position)>,
}

impl Snapshot {
    #[must_use]
    pub fn players(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn cursors(&self) -> Vec<Position> {
        self.entries.iter().map(|(_, pos)| *pos).collect()
    }

    #[must_use]
    pub fn entries(&self) -> &[(ConnectionId, Position)] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<Position> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, pos)| *pos)
    }
}

impl From<Snapshot> for Broadcast {
    fn from(snapshot: Snapshot) -> Self {
        let cursors: Vec<Position> = snapshot.entries.into_iter().map(|(_, pos)| pos).collect();
        Self { players: cursors.len(), cursors }
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
