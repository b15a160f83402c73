//! # belgraph-core
//!
//! Graph compiler for BEL (Biological Expression Language) documents.
//!
//! Parsed BEL statements go in; a deduplicated property graph comes out:
//! one node per distinct term, `has__<child>` edges for term structure,
//! one relation edge per distinct statement and provenance.
//!
//! ## Pipeline
//!
//! ```text
//! *.bel.json ──► document ──► reducer ──► materializer ──► GraphBackend
//!                               │              │               ▲
//!                               └── cache ─────┘               │
//!                                                   canonicalize ┘
//! ```
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network dependencies (pure Rust)
//! - Deterministic: `BTreeMap` only, sorted file order, sequential reduction
//! - Every storage engine sits behind [`GraphBackend`]; the engine never
//!   builds query strings

// =============================================================================
// MODULES
// =============================================================================

pub mod backend;
pub mod cache;
pub mod canonicalize;
pub mod config;
pub mod document;
pub mod graph;
pub mod importer;
pub mod materializer;
pub mod primitives;
pub mod query;
pub mod reducer;
pub mod session;
pub mod storage;
pub mod term;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Annotation, BelGraphError, Citation, DocumentId, DocumentRecord, Edge, EdgeId, EdgeIdentity,
    EdgeKind, FunctionClass, Merged, Node, NodeDraft, NodeId, Provenance, PureLink, RelationKey,
    RelationType,
};

// =============================================================================
// RE-EXPORTS: Backends
// =============================================================================

pub use backend::{GraphBackend, NodeUpdate};
pub use graph::{Graph, SerializableGraph};
pub use query::{GraphQuery, QueryRow};
pub use session::{Session, StorageBackend};
pub use storage::RedbGraph;

// =============================================================================
// RE-EXPORTS: Compiler
// =============================================================================

pub use cache::{EdgeCache, IdentityCaches, NodeCache};
pub use canonicalize::{CanonicalizationReport, Canonicalizer};
pub use config::{BelGraphConfig, StorageConfig, StorageKind};
pub use document::{BelDocument, DocumentHeader, Record, SetRecord, Statement};
pub use importer::{FileOutcome, FileReport, ImportOptions, ImportSummary, Importer};
pub use materializer::{Materialized, Materializer};
pub use reducer::{DocumentReport, ProvenanceContext, StatementError, StatementReducer};
pub use term::{Arg, Term};
