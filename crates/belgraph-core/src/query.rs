//! # Query Module
//!
//! Typed bulk queries used by the canonicalization pass.
//!
//! - Queries are values, never strings assembled from user data
//! - Every backend answers them through [`evaluate`] so results agree
//! - Rows come back in node-id order

use crate::types::{Edge, EdgeId, EdgeKind, FunctionClass, Node, NodeId, RelationType};
use std::collections::{BTreeMap, BTreeSet};

/// Bulk query operations supported by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphQuery {
    /// All nodes of the given classes.
    NodesOfClass(Vec<FunctionClass>),

    /// Moleculable nodes without an outgoing fragment/variant/pmod/gmod/location edge.
    PureCandidates,

    /// Moleculable nodes together with each of their outgoing modifier edges.
    ModifiedNodes,

    /// Pure `target` nodes lacking an incoming `relation` edge from any `source` node.
    MissingIncoming {
        target: FunctionClass,
        source: FunctionClass,
        relation: RelationType,
    },

    /// Nodes that are an endpoint of at least one relation edge.
    RelationParticipants,

    /// Nodes whose involved genes or involved others were never computed.
    InvolvedUnset,
}

/// One result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRow {
    Node(Node),
    Modified { node: Node, edge: Edge },
}

impl GraphQuery {
    /// Nodes of the central-dogma protein level lacking their RNA.
    #[must_use]
    pub const fn proteins_without_rna() -> Self {
        Self::MissingIncoming {
            target: FunctionClass::Protein,
            source: FunctionClass::Rna,
            relation: RelationType::TranslatedTo,
        }
    }

    /// Nodes of the central-dogma RNA level lacking their gene.
    #[must_use]
    pub const fn rnas_without_gene() -> Self {
        Self::MissingIncoming {
            target: FunctionClass::Rna,
            source: FunctionClass::Gene,
            relation: RelationType::TranscribedTo,
        }
    }
}

/// Answer a query over a full view of the graph.
pub(crate) fn evaluate(
    query: &GraphQuery,
    nodes: &BTreeMap<NodeId, Node>,
    edges: &BTreeMap<EdgeId, Edge>,
) -> Vec<QueryRow> {
    match query {
        GraphQuery::NodesOfClass(classes) => nodes
            .values()
            .filter(|n| classes.contains(&n.class))
            .cloned()
            .map(QueryRow::Node)
            .collect(),

        GraphQuery::PureCandidates => {
            let modified: BTreeSet<NodeId> = edges
                .values()
                .filter(|e| e.kind.is_modifier())
                .map(|e| e.from)
                .collect();
            nodes
                .values()
                .filter(|n| n.class.is_moleculable() && !modified.contains(&n.id))
                .cloned()
                .map(QueryRow::Node)
                .collect()
        }

        GraphQuery::ModifiedNodes => {
            let mut rows: Vec<QueryRow> = edges
                .values()
                .filter(|e| e.kind.is_modifier())
                .filter_map(|e| {
                    nodes
                        .get(&e.from)
                        .filter(|n| n.class.is_moleculable())
                        .map(|n| QueryRow::Modified {
                            node: n.clone(),
                            edge: e.clone(),
                        })
                })
                .collect();
            rows.sort_by_key(|row| match row {
                QueryRow::Modified { node, edge } => (node.id, edge.id),
                QueryRow::Node(node) => (node.id, EdgeId(0)),
            });
            rows
        }

        GraphQuery::MissingIncoming {
            target,
            source,
            relation,
        } => {
            let kind = EdgeKind::Relation(*relation);
            let covered: BTreeSet<NodeId> = edges
                .values()
                .filter(|e| e.kind == kind)
                .filter(|e| nodes.get(&e.from).is_some_and(|n| n.class == *source))
                .map(|e| e.to)
                .collect();
            nodes
                .values()
                .filter(|n| n.class == *target && n.pure && !covered.contains(&n.id))
                .cloned()
                .map(QueryRow::Node)
                .collect()
        }

        GraphQuery::RelationParticipants => {
            let ids: BTreeSet<NodeId> = edges
                .values()
                .filter(|e| matches!(e.kind, EdgeKind::Relation(_)))
                .flat_map(|e| [e.from, e.to])
                .collect();
            ids.into_iter()
                .filter_map(|id| nodes.get(&id).cloned())
                .map(QueryRow::Node)
                .collect()
        }

        GraphQuery::InvolvedUnset => nodes
            .values()
            .filter(|n| n.involved_genes.is_none() || n.involved_other.is_none())
            .cloned()
            .map(QueryRow::Node)
            .collect(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
