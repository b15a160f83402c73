//! # Session Module
//!
//! Backend selection for an engine run.
//!
//! ## Storage Backends
//!
//! Session supports two storage backends:
//! - `InMemory`: Uses in-memory `Graph` (fast, volatile unless explicitly saved)
//! - `Persistent`: Uses `RedbGraph` for disk-backed ACID storage
//!
//! Everything above the session talks to `dyn GraphBackend` and never
//! needs to know which one is active.

use crate::backend::GraphBackend;
use crate::graph::{Graph, SerializableGraph};
use crate::storage::RedbGraph;
use crate::types::BelGraphError;
use std::path::Path;

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory graph (fast, volatile).
    InMemory(Graph),
    /// Disk-backed graph using redb (ACID, persistent).
    Persistent(RedbGraph),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(Graph::new())
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbGraph (database handle) cannot be safely cloned.

/// A Session owns the graph backend of one run.
#[derive(Debug, Default)]
pub struct Session {
    backend: StorageBackend,
}

impl Session {
    /// Create a new empty session with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with an existing in-memory graph.
    #[must_use]
    pub fn with_graph(graph: Graph) -> Self {
        Self {
            backend: StorageBackend::InMemory(graph),
        }
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    /// All changes are automatically persisted to disk.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, BelGraphError> {
        let redb = RedbGraph::open(path)?;
        Ok(Self {
            backend: StorageBackend::Persistent(redb),
        })
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// The active backend behind the adapter trait.
    #[must_use]
    pub fn store(&self) -> &dyn GraphBackend {
        match &self.backend {
            StorageBackend::InMemory(g) => g,
            StorageBackend::Persistent(r) => r,
        }
    }

    /// The active backend behind the adapter trait, mutably.
    pub fn store_mut(&mut self) -> &mut dyn GraphBackend {
        match &mut self.backend {
            StorageBackend::InMemory(g) => g,
            StorageBackend::Persistent(r) => r,
        }
    }

    /// Compact the persistent database file.
    ///
    /// Returns `false` when nothing was reclaimed; in-memory sessions
    /// never have anything to reclaim.
    pub fn compact(&mut self) -> Result<bool, BelGraphError> {
        match &mut self.backend {
            StorageBackend::InMemory(_) => Ok(false),
            StorageBackend::Persistent(r) => r.compact(),
        }
    }

    /// Capture the full graph as a serializable snapshot.
    ///
    /// Works for both backends; the persistent one is read in full.
    pub fn snapshot(&self) -> Result<SerializableGraph, BelGraphError> {
        SerializableGraph::snapshot(self.store())
    }
}

// =============================================================================
// TESTS
// =============================================================================
