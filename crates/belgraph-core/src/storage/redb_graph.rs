//! # redb-backed Graph Storage
//!
//! A disk-backed graph backend using the redb embedded database.
//!
//! - ACID transactions, one per mutating call
//! - Crash safety (copy-on-write B-trees)
//! - Records serialized with postcard
//!
//! ## Tables
//!
//! | table            | key                        | value              |
//! |------------------|----------------------------|--------------------|
//! | `nodes`          | node id                    | `Node`             |
//! | `edges`          | edge id                    | `Edge`             |
//! | `node_index`     | (class name, canonical)    | node id            |
//! | `edge_index`     | encoded `EdgeIdentity`     | edge id            |
//! | `outgoing`       | (from node, edge id)       | to node            |
//! | `documents`      | document id                | `DocumentRecord`   |
//! | `document_index` | fingerprint                | document id        |
//! | `metadata`       | counter or flag name       | next id, flag 0/1  |

use crate::backend::{GraphBackend, NodeUpdate};
use crate::query::{self, GraphQuery, QueryRow};
use crate::types::{
    BelGraphError, DocumentId, DocumentRecord, Edge, EdgeId, EdgeIdentity, EdgeKind,
    FunctionClass, Merged, Node, NodeDraft, NodeId, Provenance,
};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

/// Table for nodes: NodeId(u64) -> serialized Node bytes
const NODES: TableDefinition<u64, &[u8]> = TableDefinition::new("nodes");

/// Table for edges: EdgeId(u64) -> serialized Edge bytes
const EDGES: TableDefinition<u64, &[u8]> = TableDefinition::new("edges");

/// Node identity index: (class name, canonical string) -> NodeId
const NODE_INDEX: TableDefinition<(&str, &str), u64> = TableDefinition::new("node_index");

/// Edge identity index: serialized EdgeIdentity -> EdgeId
const EDGE_INDEX: TableDefinition<&[u8], u64> = TableDefinition::new("edge_index");

/// Adjacency: (from_id, edge_id) -> to_id, for range queries per node.
const OUTGOING: TableDefinition<(u64, u64), u64> = TableDefinition::new("outgoing");

/// Table for documents: DocumentId(u64) -> serialized DocumentRecord bytes
const DOCUMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("documents");

/// Fingerprint -> DocumentId
const DOCUMENT_INDEX: TableDefinition<&str, u64> = TableDefinition::new("document_index");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const CANONICALIZATION_PENDING: &str = "canonicalization_pending";

fn storage_error(e: impl std::fmt::Display) -> BelGraphError {
    BelGraphError::StorageError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, BelGraphError> {
    postcard::to_allocvec(value).map_err(|e| BelGraphError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, BelGraphError> {
    postcard::from_bytes(bytes).map_err(|e| BelGraphError::DeserializationError(e.to_string()))
}

fn to_count(len: u64) -> usize {
    usize::try_from(len).unwrap_or(usize::MAX)
}

/// A disk-backed graph backend using redb.
///
/// Keeps the node identity index in memory so `merge_node` on a known
/// term never opens a transaction.
pub struct RedbGraph {
    /// The redb database handle.
    db: Database,
    /// In-memory copy of the `node_index` table.
    node_cache: BTreeMap<(FunctionClass, String), NodeId>,
    next_node_id: u64,
    next_edge_id: u64,
    next_document_id: u64,
}

impl std::fmt::Debug for RedbGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbGraph")
            .field("node_cache_size", &self.node_cache.len())
            .field("next_node_id", &self.next_node_id)
            .field("next_edge_id", &self.next_edge_id)
            .finish_non_exhaustive()
    }
}

impl RedbGraph {
    /// Open or create a graph database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BelGraphError> {
        let db = Database::create(path.as_ref()).map_err(storage_error)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_error)?;
            write_txn.open_table(NODES).map_err(storage_error)?;
            write_txn.open_table(EDGES).map_err(storage_error)?;
            write_txn.open_table(NODE_INDEX).map_err(storage_error)?;
            write_txn.open_table(EDGE_INDEX).map_err(storage_error)?;
            write_txn.open_table(OUTGOING).map_err(storage_error)?;
            write_txn.open_table(DOCUMENTS).map_err(storage_error)?;
            write_txn.open_table(DOCUMENT_INDEX).map_err(storage_error)?;
            write_txn.open_table(METADATA).map_err(storage_error)?;
            write_txn.commit().map_err(storage_error)?;
        }

        let read_txn = db.begin_read().map_err(storage_error)?;

        let (next_node_id, next_edge_id, next_document_id) = {
            let table = read_txn.open_table(METADATA).map_err(storage_error)?;
            let counter = |key: &str| -> Result<u64, BelGraphError> {
                Ok(table
                    .get(key)
                    .map_err(storage_error)?
                    .map(|v| v.value())
                    .unwrap_or(0))
            };
            (
                counter("next_node_id")?,
                counter("next_edge_id")?,
                counter("next_document_id")?,
            )
        };

        let node_cache = {
            let table = read_txn.open_table(NODE_INDEX).map_err(storage_error)?;
            let mut cache = BTreeMap::new();
            for entry in table.iter().map_err(storage_error)? {
                let (key, value) = entry.map_err(storage_error)?;
                let (class, bel) = key.value();
                let class = FunctionClass::from_name(class).ok_or_else(|| {
                    BelGraphError::DeserializationError(format!("unknown class in index: {class}"))
                })?;
                cache.insert((class, bel.to_string()), NodeId(value.value()));
            }
            cache
        };

        tracing::debug!(
            nodes = node_cache.len(),
            next_edge_id,
            "opened redb graph at {}",
            path.as_ref().display()
        );

        Ok(Self {
            db,
            node_cache,
            next_node_id,
            next_edge_id,
            next_document_id,
        })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<bool, BelGraphError> {
        self.db.compact().map_err(storage_error)
    }

    fn contains_node(&self, id: NodeId) -> Result<bool, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let table = read_txn.open_table(NODES).map_err(storage_error)?;
        Ok(table.get(id.0).map_err(storage_error)?.is_some())
    }

    /// Load every node and edge for bulk evaluation.
    fn load_all(&self) -> Result<(BTreeMap<NodeId, Node>, BTreeMap<EdgeId, Edge>), BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;

        let mut nodes = BTreeMap::new();
        let nodes_table = read_txn.open_table(NODES).map_err(storage_error)?;
        for entry in nodes_table.iter().map_err(storage_error)? {
            let (_, value) = entry.map_err(storage_error)?;
            let node: Node = decode(value.value())?;
            nodes.insert(node.id, node);
        }

        let mut edges = BTreeMap::new();
        let edges_table = read_txn.open_table(EDGES).map_err(storage_error)?;
        for entry in edges_table.iter().map_err(storage_error)? {
            let (_, value) = entry.map_err(storage_error)?;
            let edge: Edge = decode(value.value())?;
            edges.insert(edge.id, edge);
        }

        Ok((nodes, edges))
    }
}

// =============================================================================
// GRAPH BACKEND IMPLEMENTATION
// =============================================================================

impl GraphBackend for RedbGraph {
    fn find_node(&self, draft: &NodeDraft) -> Result<Option<NodeId>, BelGraphError> {
        let Some(&node_id) = self.node_cache.get(&(draft.class, draft.bel.clone())) else {
            return Ok(None);
        };
        Ok(self
            .node(node_id)?
            .filter(|node| node.properties == draft.properties)
            .map(|node| node.id))
    }

    fn merge_node(&mut self, draft: NodeDraft) -> Result<Merged<NodeId>, BelGraphError> {
        let key = (draft.class, draft.bel.clone());
        if let Some(&node_id) = self.node_cache.get(&key) {
            return Ok(Merged::existing(node_id));
        }

        let node_id = NodeId(self.next_node_id);
        let next_node_id = self.next_node_id.saturating_add(1);
        let node = draft.into_node(node_id);
        let node_bytes = encode(&node)?;

        let write_txn = self.db.begin_write().map_err(storage_error)?;
        {
            let mut nodes_table = write_txn.open_table(NODES).map_err(storage_error)?;
            nodes_table
                .insert(node_id.0, node_bytes.as_slice())
                .map_err(storage_error)?;

            let mut index_table = write_txn.open_table(NODE_INDEX).map_err(storage_error)?;
            index_table
                .insert((node.class.name(), node.bel.as_str()), node_id.0)
                .map_err(storage_error)?;

            let mut meta_table = write_txn.open_table(METADATA).map_err(storage_error)?;
            meta_table
                .insert("next_node_id", next_node_id)
                .map_err(storage_error)?;
        }
        write_txn.commit().map_err(storage_error)?;

        // Update in-memory state only after successful commit.
        self.next_node_id = next_node_id;
        self.node_cache.insert(key, node_id);

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
            if !self.contains_node(endpoint)? {
                return Err(BelGraphError::NodeNotFound(endpoint));
            }
        }

        let identity = encode(&EdgeIdentity::of(from, &kind, provenance.as_ref(), to))?;
        let edge_id = EdgeId(self.next_edge_id);
        let next_edge_id = self.next_edge_id.saturating_add(1);

        let write_txn = self.db.begin_write().map_err(storage_error)?;
        let existing = {
            let mut index_table = write_txn.open_table(EDGE_INDEX).map_err(storage_error)?;
            let existing = index_table
                .get(identity.as_slice())
                .map_err(storage_error)?
                .map(|v| v.value());
            if existing.is_none() {
                let edge = Edge {
                    id: edge_id,
                    from,
                    to,
                    kind,
                    provenance,
                };
                let edge_bytes = encode(&edge)?;

                let mut edges_table = write_txn.open_table(EDGES).map_err(storage_error)?;
                edges_table
                    .insert(edge_id.0, edge_bytes.as_slice())
                    .map_err(storage_error)?;
                index_table
                    .insert(identity.as_slice(), edge_id.0)
                    .map_err(storage_error)?;

                let mut outgoing_table = write_txn.open_table(OUTGOING).map_err(storage_error)?;
                outgoing_table
                    .insert((from.0, edge_id.0), to.0)
                    .map_err(storage_error)?;

                let mut meta_table = write_txn.open_table(METADATA).map_err(storage_error)?;
                meta_table
                    .insert("next_edge_id", next_edge_id)
                    .map_err(storage_error)?;
            }
            existing
        };

        if let Some(existing) = existing {
            write_txn.abort().map_err(storage_error)?;
            return Ok(Merged::existing(EdgeId(existing)));
        }
        write_txn.commit().map_err(storage_error)?;

        self.next_edge_id = next_edge_id;
        Ok(Merged::created(edge_id))
    }

    fn raw_query(&self, query: &GraphQuery) -> Result<Vec<QueryRow>, BelGraphError> {
        let (nodes, edges) = self.load_all()?;
        Ok(query::evaluate(query, &nodes, &edges))
    }

    fn node(&self, id: NodeId) -> Result<Option<Node>, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let nodes_table = read_txn.open_table(NODES).map_err(storage_error)?;
        match nodes_table.get(id.0).map_err(storage_error)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn nodes(&self) -> Result<Vec<Node>, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let nodes_table = read_txn.open_table(NODES).map_err(storage_error)?;

        let mut nodes = Vec::new();
        for entry in nodes_table.iter().map_err(storage_error)? {
            let (_, value) = entry.map_err(storage_error)?;
            nodes.push(decode(value.value())?);
        }
        Ok(nodes)
    }

    fn node_by_bel(
        &self,
        class: FunctionClass,
        bel: &str,
    ) -> Result<Option<NodeId>, BelGraphError> {
        Ok(self.node_cache.get(&(class, bel.to_string())).copied())
    }

    fn update_node(&mut self, id: NodeId, update: NodeUpdate) -> Result<bool, BelGraphError> {
        let write_txn = self.db.begin_write().map_err(storage_error)?;
        let changed = {
            let mut nodes_table = write_txn.open_table(NODES).map_err(storage_error)?;
            let bytes = nodes_table
                .get(id.0)
                .map_err(storage_error)?
                .map(|data| data.value().to_vec())
                .ok_or(BelGraphError::NodeNotFound(id))?;
            let mut node: Node = decode(&bytes)?;
            let changed = update.apply(&mut node);
            if changed {
                let node_bytes = encode(&node)?;
                nodes_table
                    .insert(id.0, node_bytes.as_slice())
                    .map_err(storage_error)?;
            }
            changed
        };
        write_txn.commit().map_err(storage_error)?;
        Ok(changed)
    }

    fn node_count(&self) -> Result<usize, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let nodes_table = read_txn.open_table(NODES).map_err(storage_error)?;
        Ok(to_count(nodes_table.len().map_err(storage_error)?))
    }

    fn edge(&self, id: EdgeId) -> Result<Option<Edge>, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let edges_table = read_txn.open_table(EDGES).map_err(storage_error)?;
        match edges_table.get(id.0).map_err(storage_error)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn edges(&self) -> Result<Vec<Edge>, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let edges_table = read_txn.open_table(EDGES).map_err(storage_error)?;

        let mut edges = Vec::new();
        for entry in edges_table.iter().map_err(storage_error)? {
            let (_, value) = entry.map_err(storage_error)?;
            edges.push(decode(value.value())?);
        }
        Ok(edges)
    }

    fn find_edge(&self, identity: &EdgeIdentity) -> Result<Option<EdgeId>, BelGraphError> {
        let key = encode(identity)?;
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let index_table = read_txn.open_table(EDGE_INDEX).map_err(storage_error)?;
        Ok(index_table
            .get(key.as_slice())
            .map_err(storage_error)?
            .map(|v| EdgeId(v.value())))
    }

    fn outgoing(&self, id: NodeId) -> Result<Vec<Edge>, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let outgoing_table = read_txn.open_table(OUTGOING).map_err(storage_error)?;
        let edges_table = read_txn.open_table(EDGES).map_err(storage_error)?;

        let mut edges = Vec::new();
        for entry in outgoing_table
            .range((id.0, 0u64)..=(id.0, u64::MAX))
            .map_err(storage_error)?
        {
            let (key, _) = entry.map_err(storage_error)?;
            let (_from_id, edge_id) = key.value();
            if let Some(data) = edges_table.get(edge_id).map_err(storage_error)? {
                edges.push(decode(data.value())?);
            }
        }
        Ok(edges)
    }

    fn add_edge_document(
        &mut self,
        edge: EdgeId,
        document: DocumentId,
    ) -> Result<bool, BelGraphError> {
        let write_txn = self.db.begin_write().map_err(storage_error)?;
        let added = {
            let mut edges_table = write_txn.open_table(EDGES).map_err(storage_error)?;
            let bytes = edges_table
                .get(edge.0)
                .map_err(storage_error)?
                .map(|data| data.value().to_vec())
                .ok_or(BelGraphError::EdgeNotFound(edge))?;
            let mut stored: Edge = decode(&bytes)?;
            let added = stored
                .provenance
                .as_mut()
                .is_some_and(|provenance| provenance.documents.insert(document));
            if added {
                let edge_bytes = encode(&stored)?;
                edges_table
                    .insert(edge.0, edge_bytes.as_slice())
                    .map_err(storage_error)?;
            }
            added
        };
        write_txn.commit().map_err(storage_error)?;
        Ok(added)
    }

    fn edge_count(&self) -> Result<usize, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let edges_table = read_txn.open_table(EDGES).map_err(storage_error)?;
        Ok(to_count(edges_table.len().map_err(storage_error)?))
    }

    fn register_document(
        &mut self,
        record: DocumentRecord,
    ) -> Result<Merged<DocumentId>, BelGraphError> {
        let document_id = DocumentId(self.next_document_id);
        let next_document_id = self.next_document_id.saturating_add(1);
        let record_bytes = encode(&record)?;

        let write_txn = self.db.begin_write().map_err(storage_error)?;
        let existing = {
            let mut index_table = write_txn.open_table(DOCUMENT_INDEX).map_err(storage_error)?;
            let existing = match record.fingerprint.as_deref() {
                Some(fingerprint) => index_table
                    .get(fingerprint)
                    .map_err(storage_error)?
                    .map(|v| v.value()),
                None => None,
            };
            if existing.is_none() {
                if let Some(fingerprint) = record.fingerprint.as_deref() {
                    index_table
                        .insert(fingerprint, document_id.0)
                        .map_err(storage_error)?;
                }

                let mut documents_table =
                    write_txn.open_table(DOCUMENTS).map_err(storage_error)?;
                documents_table
                    .insert(document_id.0, record_bytes.as_slice())
                    .map_err(storage_error)?;

                let mut meta_table = write_txn.open_table(METADATA).map_err(storage_error)?;
                meta_table
                    .insert("next_document_id", next_document_id)
                    .map_err(storage_error)?;
            }
            existing
        };

        if let Some(existing) = existing {
            write_txn.abort().map_err(storage_error)?;
            return Ok(Merged::existing(DocumentId(existing)));
        }
        write_txn.commit().map_err(storage_error)?;

        self.next_document_id = next_document_id;
        Ok(Merged::created(document_id))
    }

    fn find_document(&self, fingerprint: &str) -> Result<Option<DocumentId>, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let index_table = read_txn.open_table(DOCUMENT_INDEX).map_err(storage_error)?;
        Ok(index_table
            .get(fingerprint)
            .map_err(storage_error)?
            .map(|v| DocumentId(v.value())))
    }

    fn documents(&self) -> Result<Vec<(DocumentId, DocumentRecord)>, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let documents_table = read_txn.open_table(DOCUMENTS).map_err(storage_error)?;

        let mut documents = Vec::new();
        for entry in documents_table.iter().map_err(storage_error)? {
            let (key, value) = entry.map_err(storage_error)?;
            documents.push((DocumentId(key.value()), decode(value.value())?));
        }
        Ok(documents)
    }

    fn canonicalization_pending(&self) -> Result<bool, BelGraphError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let meta_table = read_txn.open_table(METADATA).map_err(storage_error)?;
        Ok(meta_table
            .get(CANONICALIZATION_PENDING)
            .map_err(storage_error)?
            .is_some_and(|v| v.value() != 0))
    }

    fn set_canonicalization_pending(&mut self, pending: bool) -> Result<(), BelGraphError> {
        let write_txn = self.db.begin_write().map_err(storage_error)?;
        {
            let mut meta_table = write_txn.open_table(METADATA).map_err(storage_error)?;
            meta_table
                .insert(CANONICALIZATION_PENDING, u64::from(pending))
                .map_err(storage_error)?;
        }
        write_txn.commit().map_err(storage_error)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::types::{PureLink, RelationType};
    use tempfile::tempdir;

    fn protein(name: &str) -> NodeDraft {
        NodeDraft::pure(FunctionClass::Protein, "HGNC", name)
    }

    fn statement(evidence: &str) -> Option<Provenance> {
        Some(Provenance {
            evidence: evidence.to_string(),
            ..Provenance::default()
        })
    }

    #[test]
    fn merge_node_deduplicates() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("test.redb")).expect("open db");

        let first = graph.merge_node(protein("TP53")).expect("merge");
        let second = graph.merge_node(protein("TP53")).expect("merge");

        assert!(first.created);
        assert_eq!(first.id, second.id);
        assert!(!second.created);
        assert_eq!(graph.node_count().expect("count"), 1);
        assert_eq!(
            graph
                .node_by_bel(FunctionClass::Protein, "p(HGNC:\"TP53\")")
                .unwrap(),
            Some(first.id)
        );
    }

    #[test]
    fn merge_edge_deduplicates_by_identity() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("test.redb")).expect("open db");
        let a = graph.merge_node(protein("A")).unwrap().id;
        let b = graph.merge_node(protein("B")).unwrap().id;
        let kind = EdgeKind::Relation(RelationType::Increases);

        let first = graph.merge_edge(a, kind, statement("e1"), b).expect("edge");
        let again = graph.merge_edge(a, kind, statement("e1"), b).expect("edge");
        let other = graph.merge_edge(a, kind, statement("e2"), b).expect("edge");

        assert_eq!(first.id, again.id);
        assert!(!again.created);
        assert_ne!(first.id, other.id);
        assert_eq!(graph.edge_count().unwrap(), 2);
        assert_eq!(graph.outgoing(a).unwrap().len(), 2);
        assert!(graph.outgoing(b).unwrap().is_empty());
    }

    #[test]
    fn merge_edge_rejects_dangling_endpoints() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("test.redb")).expect("open db");
        let a = graph.merge_node(protein("A")).unwrap().id;

        let result = graph.merge_edge(
            a,
            EdgeKind::PureLink(PureLink::ModifiedProtein),
            None,
            NodeId(7),
        );
        assert!(matches!(result, Err(BelGraphError::NodeNotFound(NodeId(7)))));
        assert_eq!(graph.edge_count().unwrap(), 0);
    }

    #[test]
    fn update_node_and_document_refs() {
        let temp = tempdir().expect("temp dir");
        let mut graph = RedbGraph::open(temp.path().join("test.redb")).expect("open db");
        let a = graph.merge_node(protein("A")).unwrap().id;
        let b = graph.merge_node(protein("B")).unwrap().id;
        let edge = graph
            .merge_edge(
                a,
                EdgeKind::Relation(RelationType::Decreases),
                statement("x"),
                b,
            )
            .unwrap()
            .id;

        assert!(graph.update_node(a, NodeUpdate::species(9606)).unwrap());
        assert!(!graph.update_node(a, NodeUpdate::species(9606)).unwrap());
        assert_eq!(graph.node(a).unwrap().unwrap().species, Some(9606));

        assert!(graph.add_edge_document(edge, DocumentId(0)).unwrap());
        assert!(!graph.add_edge_document(edge, DocumentId(0)).unwrap());
        let stored = graph.edge(edge).unwrap().unwrap();
        assert!(stored.provenance.unwrap().documents.contains(&DocumentId(0)));
    }

    #[test]
    fn recovery_persistence_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        let (a, b, doc) = {
            let mut graph = RedbGraph::open(&db_path).expect("open db");
            let a = graph.merge_node(protein("A")).unwrap().id;
            let b = graph.merge_node(protein("B")).unwrap().id;
            graph
                .merge_edge(a, EdgeKind::Relation(RelationType::Regulates), statement("r"), b)
                .unwrap();
            let doc = graph
                .register_document(DocumentRecord {
                    name: "net".to_string(),
                    fingerprint: Some("ff00".to_string()),
                    ..DocumentRecord::default()
                })
                .unwrap();
            assert!(!graph.canonicalization_pending().unwrap());
            graph.set_canonicalization_pending(true).unwrap();
            (a, b, doc.id)
        };

        let mut graph = RedbGraph::open(&db_path).expect("reopen db");
        assert!(graph.canonicalization_pending().unwrap());
        assert_eq!(graph.node_count().unwrap(), 2);
        assert_eq!(graph.edge_count().unwrap(), 1);
        assert_eq!(graph.find_document("ff00").unwrap(), Some(doc));
        assert!(!graph.merge_node(protein("A")).unwrap().created);

        // counters survive the reopen
        let c = graph.merge_node(protein("C")).unwrap().id;
        assert_eq!(c, NodeId(2));
        assert_ne!(c, a);
        assert_ne!(c, b);
        let again = graph
            .merge_edge(a, EdgeKind::Relation(RelationType::Regulates), statement("r"), b)
            .unwrap();
        assert!(!again.created);
    }

    #[test]
    fn recovery_compact_and_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        {
            let mut graph = RedbGraph::open(&db_path).expect("open db");
            for name in ["A", "B", "C"] {
                graph.merge_node(protein(name)).unwrap();
            }
            graph.compact().expect("compact");
        }
        let graph = RedbGraph::open(&db_path).expect("reopen db");
        assert_eq!(graph.node_count().unwrap(), 3);
    }

    #[test]
    fn raw_query_matches_in_memory_graph() {
        let temp = tempdir().expect("temp dir");
        let mut redb = RedbGraph::open(temp.path().join("test.redb")).expect("open db");
        let mut memory = Graph::new();

        let backends: [&mut dyn GraphBackend; 2] = [&mut redb, &mut memory];
        for backend in backends {
            let protein_id = backend.merge_node(protein("TP53")).unwrap().id;
            let rna = backend
                .merge_node(NodeDraft::pure(FunctionClass::Rna, "HGNC", "MDM2"))
                .unwrap()
                .id;
            backend
                .merge_edge(
                    rna,
                    EdgeKind::Relation(RelationType::Increases),
                    statement("s"),
                    protein_id,
                )
                .unwrap();
        }

        for query in [
            GraphQuery::PureCandidates,
            GraphQuery::proteins_without_rna(),
            GraphQuery::RelationParticipants,
            GraphQuery::InvolvedUnset,
        ] {
            assert_eq!(
                redb.raw_query(&query).unwrap(),
                memory.raw_query(&query).unwrap(),
                "{query:?}"
            );
        }
    }
}
