//! # Statement Stream Reducer
//!
//! Consumes the ordered records of one document and emits relation edges
//! carrying the provenance in force at each statement.
//!
//! ## Provenance context
//!
//! | record          | effect                                                  |
//! |-----------------|---------------------------------------------------------|
//! | `citation`      | replace citation, clear evidence and annotation         |
//! | `evidence`      | replace evidence (line continuations collapsed)         |
//! | `set`           | replace the values of one annotation keyword            |
//! | `unset`         | remove annotation keywords, absent ones are ignored     |
//!
//! The context lives for one document only and is never persisted.
//!
//! ## Failure isolation
//!
//! A statement that cannot be decoded or inserted is logged, recorded as a
//! [`StatementError`] and skipped. The rest of the document is still reduced.

use crate::backend::GraphBackend;
use crate::cache::{EdgeCache, IdentityCaches};
use crate::document::{Record, SetRecord, Statement};
use crate::materializer::Materializer;
use crate::types::{
    Annotation, BelGraphError, Citation, DocumentId, EdgeId, EdgeIdentity, EdgeKind, Merged,
    Provenance, RelationKey,
};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// `\` + newline with surrounding whitespace.
static LINE_CONTINUATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\s*\\\s*\n\s*").ok());

/// Collapse BEL line continuations and remaining newlines into single spaces.
#[must_use]
pub fn normalize_evidence(raw: &str) -> String {
    let collapsed = match LINE_CONTINUATION.as_ref() {
        Some(re) => re.replace_all(raw, " ").into_owned(),
        None => raw.to_string(),
    };
    collapsed.replace('\n', " ")
}

// =============================================================================
// PROVENANCE CONTEXT
// =============================================================================

/// Citation, evidence and annotation in force while reducing one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceContext {
    citation: Citation,
    pmid: u64,
    evidence: String,
    annotation: Annotation,
}

impl ProvenanceContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one set record.
    pub fn apply(&mut self, set: &SetRecord) {
        match set {
            SetRecord::Citation(citation) => {
                self.pmid = citation.pmid();
                self.citation = citation.clone();
                self.evidence.clear();
                self.annotation.clear();
            }
            SetRecord::Evidence(raw) => self.evidence = normalize_evidence(raw),
            SetRecord::Set { keyword, values } => {
                self.annotation.insert(keyword.clone(), values.clone());
            }
            SetRecord::Unset(keywords) => {
                for keyword in keywords {
                    self.annotation.remove(keyword);
                }
            }
            SetRecord::Unknown(key) => tracing::debug!(key, "ignoring unknown set key"),
        }
    }

    #[must_use]
    pub fn citation(&self) -> &Citation {
        &self.citation
    }

    #[must_use]
    pub fn pmid(&self) -> u64 {
        self.pmid
    }

    #[must_use]
    pub fn evidence(&self) -> &str {
        &self.evidence
    }

    #[must_use]
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Provenance of a statement asserted now.
    #[must_use]
    pub fn provenance(&self) -> Provenance {
        Provenance {
            citation: self.citation.clone(),
            pmid: self.pmid,
            evidence: self.evidence.clone(),
            annotation: self.annotation.clone(),
            documents: BTreeSet::new(),
        }
    }
}

// =============================================================================
// REPORTS
// =============================================================================

/// A statement that was skipped, by its position in `statements_and_sets`.
#[derive(Debug, Clone)]
pub struct StatementError {
    pub index: usize,
    pub error: BelGraphError,
}

impl Serialize for StatementError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("StatementError", 2)?;
        state.serialize_field("index", &self.index)?;
        state.serialize_field("error", &self.error.to_string())?;
        state.end()
    }
}

/// Outcome of reducing one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentReport {
    pub document: Option<DocumentId>,
    /// Statement records seen, valid or not.
    pub statements: usize,
    /// Relation edges created.
    pub inserted: usize,
    /// Statements whose relation edge already existed.
    pub existing: usize,
    pub nodes_created: usize,
    pub structural_edges_created: usize,
    pub errors: Vec<StatementError>,
}

// =============================================================================
// REDUCER
// =============================================================================

/// Reduces the record stream of one document into the graph.
pub struct StatementReducer<'r> {
    backend: &'r mut dyn GraphBackend,
    caches: &'r mut IdentityCaches,
    document: Option<DocumentId>,
    track_documents: bool,
}

impl<'r> StatementReducer<'r> {
    pub fn new(backend: &'r mut dyn GraphBackend, caches: &'r mut IdentityCaches) -> Self {
        Self {
            backend,
            caches,
            document: None,
            track_documents: true,
        }
    }

    /// The document the statements come from.
    #[must_use]
    pub fn document(mut self, document: DocumentId) -> Self {
        self.document = Some(document);
        self
    }

    /// Whether relation edges record the documents that asserted them.
    #[must_use]
    pub fn track_documents(mut self, track: bool) -> Self {
        self.track_documents = track;
        self
    }

    /// Reduce all records in order.
    pub fn reduce(self, records: &[Record]) -> DocumentReport {
        let Self {
            backend,
            caches,
            document,
            track_documents,
        } = self;
        let IdentityCaches { nodes, edges } = caches;
        let mut materializer = Materializer::new(nodes);
        let mut context = ProvenanceContext::new();
        let attach = document.filter(|_| track_documents);

        let mut report = DocumentReport {
            document,
            ..DocumentReport::default()
        };

        for (index, record) in records.iter().enumerate() {
            match record {
                Record::Sets(sets) => {
                    for set in sets {
                        context.apply(set);
                    }
                }
                Record::Invalid { error, raw } => {
                    report.statements = report.statements.saturating_add(1);
                    tracing::warn!(index, %error, record = %raw, "skipping malformed record");
                    report.errors.push(StatementError {
                        index,
                        error: error.clone(),
                    });
                }
                Record::Statement(statement) => {
                    report.statements = report.statements.saturating_add(1);
                    match insert_statement(
                        &mut *backend,
                        &mut materializer,
                        edges,
                        &context,
                        statement,
                        attach,
                    ) {
                        Ok(merged) if merged.created => {
                            report.inserted = report.inserted.saturating_add(1);
                        }
                        Ok(_) => report.existing = report.existing.saturating_add(1),
                        Err(error) => {
                            tracing::warn!(
                                index,
                                %error,
                                subject = %statement.subject.canonical(),
                                relation = statement.relation.name(),
                                object = %statement.object.canonical(),
                                "skipping statement"
                            );
                            report.errors.push(StatementError { index, error });
                        }
                    }
                }
            }
        }

        let stats = materializer.stats();
        report.nodes_created = stats.nodes_created;
        report.structural_edges_created = stats.structural_edges_created;
        report
    }
}

/// Materialize both sides of a statement and merge its relation edge.
fn insert_statement(
    backend: &mut dyn GraphBackend,
    materializer: &mut Materializer<'_>,
    edges: &mut EdgeCache,
    context: &ProvenanceContext,
    statement: &Statement,
    document: Option<DocumentId>,
) -> Result<Merged<EdgeId>, BelGraphError> {
    let subject = materializer.materialize(backend, &statement.subject)?;
    let object = materializer.materialize(backend, &statement.object)?;

    let mut provenance = context.provenance();
    let key = RelationKey::new(subject.id, statement.relation, &provenance, object.id);

    let existing = match edges.has(&key) {
        Some(id) => Some(id),
        None => backend.find_edge(&EdgeIdentity::Relation(key.clone()))?,
    };

    if let Some(id) = existing {
        edges.put(key, id);
        if let Some(stored) = backend.edge(id)?
            && let Some(stored) = stored.provenance
            && stored.citation != provenance.citation
        {
            tracing::warn!(
                edge = id.0,
                "statement edge exists with different citation details, keeping stored"
            );
        }
        if let Some(document) = document {
            backend.add_edge_document(id, document)?;
        }
        return Ok(Merged::existing(id));
    }

    if let Some(document) = document {
        provenance.documents.insert(document);
    }
    let merged = backend.merge_edge(
        subject.id,
        EdgeKind::Relation(statement.relation),
        Some(provenance),
        object.id,
    )?;
    edges.put(key, merged.id);
    Ok(merged)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::term::{Arg, Term};
    use crate::types::{FunctionClass, RelationType};

    fn citation(reference: &str) -> SetRecord {
        SetRecord::Citation(Citation {
            kind: "PubMed".to_string(),
            reference: reference.to_string(),
            ..Citation::default()
        })
    }

    fn protein(name: &str) -> Term {
        Term::new(FunctionClass::Protein, vec![Arg::literal("HGNC", name)])
    }

    fn increases(subject: &str, object: &str) -> Record {
        Record::Statement(Statement {
            subject: protein(subject),
            relation: RelationType::Increases,
            object: protein(object),
        })
    }

    #[test]
    fn line_continuation_pattern_compiles() {
        assert!(LINE_CONTINUATION.is_some());
    }

    #[test]
    fn evidence_continuations_collapse() {
        assert_eq!(normalize_evidence("X increases \\\n   Y"), "X increases Y");
        assert_eq!(normalize_evidence("line one\nline two"), "line one line two");
        assert_eq!(normalize_evidence("plain"), "plain");
    }

    #[test]
    fn citation_resets_evidence_and_annotation() {
        let mut context = ProvenanceContext::new();
        context.apply(&citation("1"));
        context.apply(&SetRecord::Evidence("e".to_string()));
        context.apply(&SetRecord::Set {
            keyword: "Species".to_string(),
            values: BTreeSet::from(["9606".to_string()]),
        });
        assert_eq!(context.pmid(), 1);
        assert_eq!(context.annotation().len(), 1);

        context.apply(&citation("2"));
        assert_eq!(context.evidence(), "");
        assert!(context.annotation().is_empty());
        assert_eq!(context.citation().reference, "2");
        assert_eq!(context.pmid(), 2);
    }

    #[test]
    fn set_replaces_and_unset_removes() {
        let mut context = ProvenanceContext::new();
        context.apply(&SetRecord::Set {
            keyword: "Cell".to_string(),
            values: BTreeSet::from(["a".to_string(), "b".to_string()]),
        });
        context.apply(&SetRecord::Set {
            keyword: "Cell".to_string(),
            values: BTreeSet::from(["c".to_string()]),
        });
        assert_eq!(
            context.annotation().get("Cell"),
            Some(&BTreeSet::from(["c".to_string()]))
        );

        context.apply(&SetRecord::Unset(vec!["Cell".to_string(), "Absent".to_string()]));
        assert!(context.annotation().is_empty());
    }

    #[test]
    fn reduce_inserts_once_and_tracks_documents() {
        let mut graph = Graph::new();
        let mut caches = IdentityCaches::cold();
        let records = vec![
            Record::Sets(vec![citation("123"), SetRecord::Evidence("X increases Y".to_string())]),
            increases("TP53", "MDM2"),
        ];

        let first = StatementReducer::new(&mut graph, &mut caches)
            .document(DocumentId(0))
            .reduce(&records);
        let second = StatementReducer::new(&mut graph, &mut caches)
            .document(DocumentId(1))
            .reduce(&records);

        assert_eq!(first.inserted, 1);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.existing, 1);
        assert_eq!(graph.edge_count().unwrap(), 1);

        let edge = &graph.edges().unwrap()[0];
        let provenance = edge.provenance.as_ref().unwrap();
        assert_eq!(provenance.citation.reference, "123");
        assert_eq!(provenance.pmid, 123);
        assert_eq!(provenance.evidence, "X increases Y");
        assert_eq!(
            provenance.documents,
            BTreeSet::from([DocumentId(0), DocumentId(1)])
        );
    }

    #[test]
    fn untracked_documents_leave_existing_edge_untouched() {
        let mut graph = Graph::new();
        let mut caches = IdentityCaches::cold();
        let records = vec![Record::Sets(vec![citation("5")]), increases("A", "B")];

        for document in [DocumentId(0), DocumentId(1)] {
            StatementReducer::new(&mut graph, &mut caches)
                .document(document)
                .track_documents(false)
                .reduce(&records);
        }

        let edge = &graph.edges().unwrap()[0];
        assert!(edge.provenance.as_ref().unwrap().documents.is_empty());
    }

    #[test]
    fn bad_statement_does_not_stop_the_document() {
        let mut graph = Graph::new();
        let mut caches = IdentityCaches::cold();
        let records = vec![
            increases("A", "B"),
            Record::Invalid {
                error: BelGraphError::MalformedStatement("missing object".to_string()),
                raw: "{}".to_string(),
            },
            increases("B", "C"),
        ];

        let report = StatementReducer::new(&mut graph, &mut caches).reduce(&records);

        assert_eq!(report.statements, 3);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].index, 1);
    }

    #[test]
    fn evidence_distinguishes_statement_edges() {
        let mut graph = Graph::new();
        let mut caches = IdentityCaches::cold();
        let records = vec![
            Record::Sets(vec![citation("1"), SetRecord::Evidence("first".to_string())]),
            increases("A", "B"),
            Record::Sets(vec![SetRecord::Evidence("second".to_string())]),
            increases("A", "B"),
        ];

        let report = StatementReducer::new(&mut graph, &mut caches).reduce(&records);
        assert_eq!(report.inserted, 2);
        // A and B materialized once
        assert_eq!(report.nodes_created, 2);
    }
}
