//! # Identity Caches
//!
//! In-memory maps from content identity to stored id, warmed once per
//! import run so overlapping documents do not re-query the backend for
//! every term and statement.
//!
//! The caches are an optimization only: a cold cache falls back to the
//! backend's own merge semantics and yields the same graph.

use crate::backend::GraphBackend;
use crate::types::{BelGraphError, EdgeId, EdgeIdentity, FunctionClass, NodeId, RelationKey};
use std::collections::BTreeMap;

/// `(class, canonical string) -> NodeId`
#[derive(Debug, Clone, Default)]
pub struct NodeCache {
    entries: BTreeMap<(FunctionClass, String), NodeId>,
}

impl NodeCache {
    #[must_use]
    pub fn has(&self, class: FunctionClass, bel: &str) -> Option<NodeId> {
        // BTreeMap<(_, String), _> cannot be queried with a borrowed tuple
        self.entries.get(&(class, bel.to_string())).copied()
    }

    pub fn put(&mut self, class: FunctionClass, bel: &str, id: NodeId) {
        self.entries.insert((class, bel.to_string()), id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `RelationKey -> EdgeId` for statement edges.
#[derive(Debug, Clone, Default)]
pub struct EdgeCache {
    entries: BTreeMap<RelationKey, EdgeId>,
}

impl EdgeCache {
    #[must_use]
    pub fn has(&self, key: &RelationKey) -> Option<EdgeId> {
        self.entries.get(key).copied()
    }

    pub fn put(&mut self, key: RelationKey, id: EdgeId) {
        self.entries.insert(key, id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Both caches of an import run.
#[derive(Debug, Clone, Default)]
pub struct IdentityCaches {
    pub nodes: NodeCache,
    pub edges: EdgeCache,
}

impl IdentityCaches {
    /// Empty caches; every lookup goes to the backend.
    #[must_use]
    pub fn cold() -> Self {
        Self::default()
    }

    /// Populate both caches from everything already stored.
    pub fn warm(backend: &dyn GraphBackend) -> Result<Self, BelGraphError> {
        let mut caches = Self::default();

        for node in backend.nodes()? {
            caches.nodes.put(node.class, &node.bel, node.id);
        }
        for edge in backend.edges()? {
            if let EdgeIdentity::Relation(key) = edge.identity() {
                caches.edges.put(key, edge.id);
            }
        }

        tracing::debug!(
            nodes = caches.nodes.len(),
            edges = caches.edges.len(),
            "identity caches warmed"
        );
        Ok(caches)
    }
}
