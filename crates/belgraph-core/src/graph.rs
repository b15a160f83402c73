//! # Graph Engine
//!
//! The in-memory graph backend.
//!
//! This module implements the `GraphBackend` trait.
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::backend::{GraphBackend, NodeUpdate};
use crate::query::{self, GraphQuery, QueryRow};
use crate::types::{
    BelGraphError, DocumentId, DocumentRecord, Edge, EdgeId, EdgeIdentity, EdgeKind,
    FunctionClass, Merged, Node, NodeDraft, NodeId, Provenance,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The in-memory graph.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
/// No `HashMap` allowed.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node storage: NodeId -> Node
    nodes: BTreeMap<NodeId, Node>,

    /// Edge storage: EdgeId -> Edge
    edges: BTreeMap<EdgeId, Edge>,

    /// Identity lookup: (class, canonical string) -> NodeId
    node_index: BTreeMap<(FunctionClass, String), NodeId>,

    /// Identity lookup: edge identity -> EdgeId
    edge_index: BTreeMap<EdgeIdentity, EdgeId>,

    /// Adjacency list: from_node -> outgoing edge ids
    outgoing: BTreeMap<NodeId, BTreeSet<EdgeId>>,

    /// Registered documents
    documents: BTreeMap<DocumentId, DocumentRecord>,

    /// Fingerprint -> DocumentId
    document_index: BTreeMap<String, DocumentId>,

    next_node_id: u64,
    next_edge_id: u64,
    next_document_id: u64,

    canonicalization_pending: bool,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the graph contains a node (internal, non-Result version).
    #[must_use]
    pub fn contains_node_internal(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Insert a node with its original id (used when restoring a snapshot).
    fn import_node(&mut self, node: Node) {
        if node.id.0 >= self.next_node_id {
            self.next_node_id = node.id.0.saturating_add(1);
        }
        self.node_index.insert((node.class, node.bel.clone()), node.id);
        self.nodes.insert(node.id, node);
    }

    /// Insert an edge with its original id; dangling edges are dropped.
    fn import_edge(&mut self, edge: Edge) {
        if !self.contains_node_internal(edge.from) || !self.contains_node_internal(edge.to) {
            return;
        }
        if edge.id.0 >= self.next_edge_id {
            self.next_edge_id = edge.id.0.saturating_add(1);
        }
        self.edge_index.insert(edge.identity(), edge.id);
        self.outgoing.entry(edge.from).or_default().insert(edge.id);
        self.edges.insert(edge.id, edge);
    }

    fn import_document(&mut self, id: DocumentId, record: DocumentRecord) {
        if id.0 >= self.next_document_id {
            self.next_document_id = id.0.saturating_add(1);
        }
        if let Some(fingerprint) = &record.fingerprint {
            self.document_index.insert(fingerprint.clone(), id);
        }
        self.documents.insert(id, record);
    }
}

impl GraphBackend for Graph {
    fn find_node(&self, draft: &NodeDraft) -> Result<Option<NodeId>, BelGraphError> {
        Ok(self
            .node_index
            .get(&(draft.class, draft.bel.clone()))
            .and_then(|id| self.nodes.get(id))
            .filter(|node| node.properties == draft.properties)
            .map(|node| node.id))
    }

    fn merge_node(&mut self, draft: NodeDraft) -> Result<Merged<NodeId>, BelGraphError> {
        let key = (draft.class, draft.bel.clone());
        if let Some(&node_id) = self.node_index.get(&key) {
            return Ok(Merged::existing(node_id));
        }

        let node_id = NodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);

        self.nodes.insert(node_id, draft.into_node(node_id));
        self.node_index.insert(key, node_id);

        Ok(Merged::created(node_id))
    }

    fn merge_edge(
        &mut self,
        from: NodeId,
        kind: EdgeKind,
        provenance: Option<Provenance>,
        to: NodeId,
    ) -> Result<Merged<EdgeId>, BelGraphError> {
        for endpoint in [from, to] {
            if !self.contains_node_internal(endpoint) {
                return Err(BelGraphError::NodeNotFound(endpoint));
            }
        }

        let identity = EdgeIdentity::of(from, &kind, provenance.as_ref(), to);
        if let Some(&edge_id) = self.edge_index.get(&identity) {
            return Ok(Merged::existing(edge_id));
        }

        let edge_id = EdgeId(self.next_edge_id);
        self.next_edge_id = self.next_edge_id.saturating_add(1);

        self.edges.insert(
            edge_id,
            Edge {
                id: edge_id,
                from,
                to,
                kind,
                provenance,
            },
        );
        self.edge_index.insert(identity, edge_id);
        self.outgoing.entry(from).or_default().insert(edge_id);

        Ok(Merged::created(edge_id))
    }

    fn raw_query(&self, query: &GraphQuery) -> Result<Vec<QueryRow>, BelGraphError> {
        Ok(query::evaluate(query, &self.nodes, &self.edges))
    }

    fn node(&self, id: NodeId) -> Result<Option<Node>, BelGraphError> {
        Ok(self.nodes.get(&id).cloned())
    }

    fn nodes(&self) -> Result<Vec<Node>, BelGraphError> {
        Ok(self.nodes.values().cloned().collect())
    }

    fn node_by_bel(
        &self,
        class: FunctionClass,
        bel: &str,
    ) -> Result<Option<NodeId>, BelGraphError> {
        Ok(self.node_index.get(&(class, bel.to_string())).copied())
    }

    fn update_node(&mut self, id: NodeId, update: NodeUpdate) -> Result<bool, BelGraphError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(BelGraphError::NodeNotFound(id))?;
        Ok(update.apply(node))
    }

    fn node_count(&self) -> Result<usize, BelGraphError> {
        Ok(self.nodes.len())
    }

    fn edge(&self, id: EdgeId) -> Result<Option<Edge>, BelGraphError> {
        Ok(self.edges.get(&id).cloned())
    }

    fn edges(&self) -> Result<Vec<Edge>, BelGraphError> {
        Ok(self.edges.values().cloned().collect())
    }

    fn find_edge(&self, identity: &EdgeIdentity) -> Result<Option<EdgeId>, BelGraphError> {
        Ok(self.edge_index.get(identity).copied())
    }

    fn outgoing(&self, id: NodeId) -> Result<Vec<Edge>, BelGraphError> {
        Ok(self
            .outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edges.get(edge_id).cloned())
            .collect())
    }

    fn add_edge_document(
        &mut self,
        edge: EdgeId,
        document: DocumentId,
    ) -> Result<bool, BelGraphError> {
        let stored = self
            .edges
            .get_mut(&edge)
            .ok_or(BelGraphError::EdgeNotFound(edge))?;
        Ok(stored
            .provenance
            .as_mut()
            .is_some_and(|provenance| provenance.documents.insert(document)))
    }

    fn edge_count(&self) -> Result<usize, BelGraphError> {
        Ok(self.edges.len())
    }

    fn register_document(
        &mut self,
        record: DocumentRecord,
    ) -> Result<Merged<DocumentId>, BelGraphError> {
        if let Some(id) = record
            .fingerprint
            .as_ref()
            .and_then(|fingerprint| self.document_index.get(fingerprint))
        {
            return Ok(Merged::existing(*id));
        }

        let id = DocumentId(self.next_document_id);
        self.import_document(id, record);
        Ok(Merged::created(id))
    }

    fn find_document(&self, fingerprint: &str) -> Result<Option<DocumentId>, BelGraphError> {
        Ok(self.document_index.get(fingerprint).copied())
    }

    fn documents(&self) -> Result<Vec<(DocumentId, DocumentRecord)>, BelGraphError> {
        Ok(self
            .documents
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect())
    }

    fn canonicalization_pending(&self) -> Result<bool, BelGraphError> {
        Ok(self.canonicalization_pending)
    }

    fn set_canonicalization_pending(&mut self, pending: bool) -> Result<(), BelGraphError> {
        self.canonicalization_pending = pending;
        Ok(())
    }
}

// =============================================================================
// SERIALIZATION SUPPORT
// =============================================================================

/// Serializable representation of a graph, used for JSON snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub documents: Vec<(DocumentId, DocumentRecord)>,
    #[serde(default)]
    pub canonicalization_pending: bool,
}

impl SerializableGraph {
    /// Capture the full content of any backend.
    pub fn snapshot(backend: &dyn GraphBackend) -> Result<Self, BelGraphError> {
        Ok(Self {
            nodes: backend.nodes()?,
            edges: backend.edges()?,
            documents: backend.documents()?,
            canonicalization_pending: backend.canonicalization_pending()?,
        })
    }
}

impl From<SerializableGraph> for Graph {
    fn from(sg: SerializableGraph) -> Self {
        let mut graph = Graph::new();

        for node in sg.nodes {
            graph.import_node(node);
        }
        for edge in sg.edges {
            graph.import_edge(edge);
        }
        for (id, record) in sg.documents {
            graph.import_document(id, record);
        }
        graph.canonicalization_pending = sg.canonicalization_pending;

        graph
    }
}

// =============================================================================
// TESTS
// =============================================================================
