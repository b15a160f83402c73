//! # Graph Backend Adapter
//!
//! The contract every graph store fulfils for the engine.
//!
//! The engine needs four primitives:
//! - `find_node`: existence lookup by full property match
//! - `merge_node`: idempotent create-or-find keyed by class and canonical string
//! - `merge_edge`: create an edge unless one with the same identity exists
//! - `raw_query`: typed bulk queries for the canonicalization pass
//!
//! Everything else on the trait supports caching, provenance bookkeeping,
//! document registration and reporting.
//!
//! All fallible operations return `Result<T, BelGraphError>` so the
//! in-memory and persistent backends are interchangeable.

use crate::query::{GraphQuery, QueryRow};
use crate::types::{
    BelGraphError, DocumentId, DocumentRecord, Edge, EdgeId, EdgeIdentity, EdgeKind,
    FunctionClass, Merged, Node, NodeDraft, NodeId, Provenance,
};
use std::collections::BTreeSet;

/// Mutable attributes of a stored node.
///
/// `None` leaves the attribute as is. Class, canonical string and
/// properties are identity and never change after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeUpdate {
    pub pure: Option<bool>,
    pub species: Option<u32>,
    pub involved_genes: Option<BTreeSet<String>>,
    pub involved_other: Option<BTreeSet<String>>,
}

impl NodeUpdate {
    #[must_use]
    pub fn pure() -> Self {
        Self {
            pure: Some(true),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn species(taxon: u32) -> Self {
        Self {
            species: Some(taxon),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn involved(genes: BTreeSet<String>, other: BTreeSet<String>) -> Self {
        Self {
            involved_genes: Some(genes),
            involved_other: Some(other),
            ..Self::default()
        }
    }

    /// Apply to a node; returns `true` if anything changed.
    pub fn apply(&self, node: &mut Node) -> bool {
        let mut changed = false;
        if let Some(pure) = self.pure
            && node.pure != pure
        {
            node.pure = pure;
            changed = true;
        }
        if let Some(taxon) = self.species
            && node.species != Some(taxon)
        {
            node.species = Some(taxon);
            changed = true;
        }
        changed |= replace(&mut node.involved_genes, self.involved_genes.as_ref());
        changed |= replace(&mut node.involved_other, self.involved_other.as_ref());
        changed
    }
}

fn replace(slot: &mut Option<BTreeSet<String>>, value: Option<&BTreeSet<String>>) -> bool {
    match value {
        Some(value) if slot.as_ref() != Some(value) => {
            *slot = Some(value.clone());
            true
        }
        _ => false,
    }
}

/// The Graph Backend Adapter.
pub trait GraphBackend {
    // -------------------------------------------------------------------------
    // Primitives
    // -------------------------------------------------------------------------

    /// Find a node whose class, canonical string and properties all match the draft.
    fn find_node(&self, draft: &NodeDraft) -> Result<Option<NodeId>, BelGraphError>;

    /// Create the node unless one with the same class and canonical string exists.
    fn merge_node(&mut self, draft: NodeDraft) -> Result<Merged<NodeId>, BelGraphError>;

    /// Create the edge unless one with the same identity exists.
    ///
    /// An existing edge is returned untouched; the incoming provenance
    /// does not overwrite it. Both endpoints must exist.
    fn merge_edge(
        &mut self,
        from: NodeId,
        kind: EdgeKind,
        provenance: Option<Provenance>,
        to: NodeId,
    ) -> Result<Merged<EdgeId>, BelGraphError>;

    /// Answer a typed bulk query.
    fn raw_query(&self, query: &GraphQuery) -> Result<Vec<QueryRow>, BelGraphError>;

    // -------------------------------------------------------------------------
    // Nodes
    // -------------------------------------------------------------------------

    fn node(&self, id: NodeId) -> Result<Option<Node>, BelGraphError>;

    /// All nodes in id order.
    fn nodes(&self) -> Result<Vec<Node>, BelGraphError>;

    /// Id of the node with the given class and canonical string.
    fn node_by_bel(&self, class: FunctionClass, bel: &str)
    -> Result<Option<NodeId>, BelGraphError>;

    /// Update the mutable attributes of a node; returns `true` if it changed.
    fn update_node(&mut self, id: NodeId, update: NodeUpdate) -> Result<bool, BelGraphError>;

    fn node_count(&self) -> Result<usize, BelGraphError>;

    // -------------------------------------------------------------------------
    // Edges
    // -------------------------------------------------------------------------

    fn edge(&self, id: EdgeId) -> Result<Option<Edge>, BelGraphError>;

    /// All edges in id order.
    fn edges(&self) -> Result<Vec<Edge>, BelGraphError>;

    fn find_edge(&self, identity: &EdgeIdentity) -> Result<Option<EdgeId>, BelGraphError>;

    /// Outgoing edges of a node in id order.
    fn outgoing(&self, id: NodeId) -> Result<Vec<Edge>, BelGraphError>;

    /// Add a document reference to a statement edge.
    ///
    /// Returns `true` if the reference was new. Edges without provenance
    /// are left untouched.
    fn add_edge_document(
        &mut self,
        edge: EdgeId,
        document: DocumentId,
    ) -> Result<bool, BelGraphError>;

    fn edge_count(&self) -> Result<usize, BelGraphError>;

    // -------------------------------------------------------------------------
    // Documents
    // -------------------------------------------------------------------------

    /// Register a document; a record with an already known fingerprint
    /// returns the existing id.
    fn register_document(
        &mut self,
        record: DocumentRecord,
    ) -> Result<Merged<DocumentId>, BelGraphError>;

    fn find_document(&self, fingerprint: &str) -> Result<Option<DocumentId>, BelGraphError>;

    /// All registered documents in id order.
    fn documents(&self) -> Result<Vec<(DocumentId, DocumentRecord)>, BelGraphError>;

    // -------------------------------------------------------------------------
    // Maintenance state
    // -------------------------------------------------------------------------

    /// `true` while documents were reduced after the last completed canonicalization.
    fn canonicalization_pending(&self) -> Result<bool, BelGraphError>;

    fn set_canonicalization_pending(&mut self, pending: bool) -> Result<(), BelGraphError>;

    // -------------------------------------------------------------------------
    // Provided
    // -------------------------------------------------------------------------

    /// Shortcut for an edge without provenance.
    fn find_plain_edge(
        &self,
        from: NodeId,
        kind: EdgeKind,
        to: NodeId,
    ) -> Result<Option<EdgeId>, BelGraphError> {
        self.find_edge(&EdgeIdentity::of(from, &kind, None, to))
    }
}
