//! # Core Type Definitions
//!
//! This module contains the core types shared by every part of the engine:
//! - Graph identifiers (`NodeId`, `EdgeId`, `DocumentId`)
//! - The BEL vocabulary (`FunctionClass`, `RelationType`, `EdgeKind`)
//! - Stored records (`Node`, `Edge`, `DocumentRecord`)
//! - Statement provenance (`Citation`, `Annotation`, `Provenance`)
//! - Error types (`BelGraphError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` where they take part in identity keys
//! - Use `BTreeMap`/`BTreeSet` so serialized forms have a stable order

mod vocabulary;

pub use vocabulary::{EdgeKind, FunctionClass, PureLink, RelationType};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

// =============================================================================
// GRAPH IDENTIFIERS
// =============================================================================

/// Unique identifier for a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Unique identifier for an edge in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

/// Identifier of a registered source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

// =============================================================================
// NODE
// =============================================================================

/// One materialized BEL term.
///
/// `bel` is the canonical string of the term and, together with `class`,
/// the content identity of the node. `properties` holds the flattened
/// literal and field parameters of the term (namespace, name, amino acid...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub class: FunctionClass,
    pub bel: String,
    pub properties: BTreeMap<String, String>,
    /// Only meaningful for moleculable classes; set by canonicalization.
    pub pure: bool,
    /// NCBI taxonomy id, set by the species update.
    pub species: Option<u32>,
    /// Names of the proteins, RNAs and genes the term is built from.
    /// `None` until the involved update has visited the node.
    #[serde(default)]
    pub involved_genes: Option<BTreeSet<String>>,
    /// Names of the other named constituents (abundances, complexes...).
    #[serde(default)]
    pub involved_other: Option<BTreeSet<String>>,
}

impl Node {
    /// Namespace of the term, if it carries one.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.properties.get("namespace").map(String::as_str)
    }

    /// Name of the term, if it carries one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").map(String::as_str)
    }
}

/// A node that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDraft {
    pub class: FunctionClass,
    pub bel: String,
    pub properties: BTreeMap<String, String>,
    pub pure: bool,
}

impl NodeDraft {
    /// Build the draft of a pure `short(NS:"name")` node of the given class.
    #[must_use]
    pub fn pure(class: FunctionClass, namespace: &str, name: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert("namespace".to_string(), namespace.to_string());
        properties.insert("name".to_string(), name.to_string());
        Self {
            class,
            bel: format!("{}({}:\"{}\")", class.short(), namespace, name),
            properties,
            pure: true,
        }
    }

    /// Materialize the draft under an assigned id.
    #[must_use]
    pub fn into_node(self, id: NodeId) -> Node {
        Node {
            id,
            class: self.class,
            bel: self.bel,
            properties: self.properties,
            pure: self.pure,
            species: None,
            involved_genes: None,
            involved_other: None,
        }
    }
}

/// Result of a create-if-absent operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merged<T> {
    pub id: T,
    /// `true` when the record did not exist before the call.
    pub created: bool,
}

impl<T> Merged<T> {
    #[must_use]
    pub const fn created(id: T) -> Self {
        Self { id, created: true }
    }

    #[must_use]
    pub const fn existing(id: T) -> Self {
        Self { id, created: false }
    }
}

// =============================================================================
// PROVENANCE
// =============================================================================

/// Annotation context: keyword -> set of values.
pub type Annotation = BTreeMap<String, BTreeSet<String>>;

/// Citation of a statement group.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Citation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub title: String,
    pub pub_date: String,
    pub authors: Vec<String>,
    pub comment: String,
}

impl Citation {
    /// PubMed id of the citation, or 0 when it is not a numeric PubMed reference.
    #[must_use]
    pub fn pmid(&self) -> u64 {
        if !self.kind.eq_ignore_ascii_case("pubmed") {
            return 0;
        }
        if self.reference.is_empty() || !self.reference.bytes().all(|b| b.is_ascii_digit()) {
            return 0;
        }
        self.reference.parse().unwrap_or(0)
    }
}

/// Provenance attached to a relation edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub citation: Citation,
    pub pmid: u64,
    pub evidence: String,
    pub annotation: Annotation,
    /// Documents that asserted this edge.
    pub documents: BTreeSet<DocumentId>,
}

// =============================================================================
// EDGE
// =============================================================================

/// A directed, typed edge.
///
/// Structural, pure-link and central-dogma edges carry no provenance.
/// Statement edges always do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub provenance: Option<Provenance>,
}

impl Edge {
    /// The content identity of this edge.
    #[must_use]
    pub fn identity(&self) -> EdgeIdentity {
        EdgeIdentity::of(self.from, &self.kind, self.provenance.as_ref(), self.to)
    }
}

/// Identity of a statement edge: the provenance-sensitive key under which
/// re-imports of the same fact collapse onto one edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationKey {
    pub from: NodeId,
    pub to: NodeId,
    pub relation: RelationType,
    pub citation_type: String,
    pub citation_ref: String,
    pub evidence: String,
    pub annotation: Annotation,
}

impl RelationKey {
    #[must_use]
    pub fn new(from: NodeId, relation: RelationType, provenance: &Provenance, to: NodeId) -> Self {
        Self {
            from,
            to,
            relation,
            citation_type: provenance.citation.kind.clone(),
            citation_ref: provenance.citation.reference.clone(),
            evidence: provenance.evidence.clone(),
            annotation: provenance.annotation.clone(),
        }
    }
}

/// Content identity of any edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeIdentity {
    /// At most one edge of a kind between two nodes.
    Plain {
        from: NodeId,
        kind: EdgeKind,
        to: NodeId,
    },
    /// Statement edge keyed by its provenance.
    Relation(RelationKey),
}

impl EdgeIdentity {
    #[must_use]
    pub fn of(from: NodeId, kind: &EdgeKind, provenance: Option<&Provenance>, to: NodeId) -> Self {
        match (kind, provenance) {
            (EdgeKind::Relation(relation), Some(provenance)) => {
                Self::Relation(RelationKey::new(from, *relation, provenance, to))
            }
            _ => Self::Plain {
                from,
                kind: *kind,
                to,
            },
        }
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// Header information of an imported BEL document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub name: String,
    pub version: String,
    pub description: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub path: String,
    /// BLAKE3 hex digest of the raw file, when fingerprinting is enabled.
    pub fingerprint: Option<String>,
    pub size: u64,
    /// Namespace keywords declared in the definitions section.
    pub namespaces: Vec<String>,
    /// Annotation keywords declared in the definitions section.
    pub annotations: Vec<String>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while compiling BEL documents into a graph.
///
/// - No silent failures
/// - Use `Result<T, BelGraphError>` for fallible operations
/// - Statement-level errors are collected, never fatal for a document
#[derive(Debug, Clone, Error)]
pub enum BelGraphError {
    /// A statement record lacks its subject, relation or object.
    #[error("Malformed statement: {0}")]
    MalformedStatement(String),

    /// The function header names a kind outside the BEL vocabulary.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// The relation is outside the BEL vocabulary.
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    /// The term tree has an unexpected shape.
    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    /// The document does not follow the `[document, definitions, statements]` layout.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The requested node was not found in the graph.
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// The requested edge was not found in the graph.
    #[error("Edge not found: {0:?}")]
    EdgeNotFound(EdgeId),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================
