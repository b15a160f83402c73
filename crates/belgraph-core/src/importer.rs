//! # Import Orchestration
//!
//! Compiles a set of `*.bel.json` files into one graph.
//!
//! For each file, in sorted path order:
//! 1. size check against [`MAX_DOCUMENT_SIZE`]
//! 2. fingerprint (BLAKE3, feature `fingerprint`), skipped if already registered
//! 3. decode; empty documents are reported and skipped
//! 4. register the document, reduce its statements
//!
//! A failing file never stops the run. Registering a document marks the
//! backend as pending canonicalization; the pass runs once at the end of a run
//! whenever the mark is set or statement edges were inserted, and clears it.
//! A run that was cancelled or killed part way is therefore canonicalized by
//! the next one, even if every file it sees is already known.
//!
//! Documents are processed one after another; a cancellation flag is checked
//! between documents only. Cancelling stops the import, not the
//! canonicalization of what was already reduced.

use crate::backend::GraphBackend;
use crate::cache::IdentityCaches;
use crate::canonicalize::{CanonicalizationReport, Canonicalizer};
use crate::document::BelDocument;
use crate::primitives::{BEL_JSON_SUFFIX, MAX_DOCUMENT_SIZE};
use crate::reducer::{DocumentReport, StatementReducer};
use crate::types::{BelGraphError, DocumentId, DocumentRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// OPTIONS
// =============================================================================

/// Import switches. Also the `[import]` table of the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Scan directories recursively.
    pub include_subfolders: bool,
    pub complete_central_dogma: bool,
    pub update_species: bool,
    /// Fill `involved_genes`/`involved_other` on statement participants.
    pub update_involved: bool,
    /// Record on each statement edge the documents that asserted it.
    pub track_documents: bool,
    /// Load identity caches from the backend before the first document.
    pub warm_cache: bool,
    /// Skip files whose fingerprint is already registered.
    pub skip_known_documents: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            include_subfolders: false,
            complete_central_dogma: true,
            update_species: true,
            update_involved: true,
            track_documents: true,
            warm_cache: true,
            skip_known_documents: true,
        }
    }
}

// =============================================================================
// REPORTS
// =============================================================================

/// What happened to one file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Imported(DocumentReport),
    AlreadyImported { document: DocumentId },
    Empty,
    Failed { error: String },
    /// Not reached because the run was cancelled.
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Outcome of a multi-document import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub files: Vec<FileReport>,
    /// `None` when nothing was waiting for canonicalization.
    pub canonicalization: Option<CanonicalizationReport>,
}

impl ImportSummary {
    /// Statement edges inserted over all files.
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.imported().map(|r| r.inserted).sum()
    }

    /// Statement edges that already existed, over all files.
    #[must_use]
    pub fn existing(&self) -> usize {
        self.imported().map(|r| r.existing).sum()
    }

    /// Statements skipped because of an error, over all files.
    #[must_use]
    pub fn statement_errors(&self) -> usize {
        self.imported().map(|r| r.errors.len()).sum()
    }

    /// Files that could not be imported at all.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed { .. }))
            .count()
    }

    fn imported(&self) -> impl Iterator<Item = &DocumentReport> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Imported(report) => Some(report),
            _ => None,
        })
    }
}

// =============================================================================
// FILE DISCOVERY
// =============================================================================

/// Expand `paths` into the sorted list of files to import.
///
/// Directories contribute their `*.bel.json` files (recursively if asked).
/// Any other path is taken as-is, so a missing file is reported at import time.
pub fn collect_files(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, BelGraphError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            scan_directory(path, recursive, &mut files)?;
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn scan_directory(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<(), BelGraphError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| BelGraphError::IoError(format!("{}: {e}", dir.display())))?;
    for entry in entries {
        let path = entry
            .map_err(|e| BelGraphError::IoError(format!("{}: {e}", dir.display())))?
            .path();
        if path.is_dir() {
            if recursive {
                scan_directory(&path, recursive, files)?;
            }
        } else if is_bel_json(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_bel_json(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(BEL_JSON_SUFFIX))
}

/// BLAKE3 hex digest of a document.
#[cfg(feature = "fingerprint")]
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> Option<String> {
    Some(blake3::hash(bytes).to_hex().to_string())
}

/// Without the `fingerprint` feature documents are never recognised as known.
#[cfg(not(feature = "fingerprint"))]
#[must_use]
pub fn fingerprint(_bytes: &[u8]) -> Option<String> {
    None
}

// =============================================================================
// IMPORTER
// =============================================================================

/// Imports documents into a backend.
pub struct Importer<'b> {
    backend: &'b mut dyn GraphBackend,
    options: ImportOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'b> Importer<'b> {
    pub fn new(backend: &'b mut dyn GraphBackend, options: ImportOptions) -> Self {
        Self {
            backend,
            options,
            cancel: None,
        }
    }

    /// Stop before the next document once `flag` is set.
    #[must_use]
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Import every file reachable from `paths`, then canonicalize.
    ///
    /// Fails only if the inputs cannot be listed, the caches cannot be warmed,
    /// or the canonicalization queries fail.
    pub fn import_paths(&mut self, paths: &[PathBuf]) -> Result<ImportSummary, BelGraphError> {
        let files = collect_files(paths, self.options.include_subfolders)?;
        tracing::info!(files = files.len(), "import started");

        let mut caches = if self.options.warm_cache {
            IdentityCaches::warm(&*self.backend)?
        } else {
            IdentityCaches::cold()
        };

        let mut summary = ImportSummary::default();
        let mut cancelled = false;
        for path in files {
            let outcome = if cancelled || self.cancelled() {
                cancelled = true;
                FileOutcome::Cancelled
            } else {
                self.import_file(&path, &mut caches)
            };
            summary.files.push(FileReport { path, outcome });
        }

        if cancelled {
            tracing::warn!("import cancelled");
        }
        if summary.inserted() > 0 || self.backend.canonicalization_pending()? {
            summary.canonicalization = Some(self.canonicalize()?);
        }

        tracing::info!(
            inserted = summary.inserted(),
            existing = summary.existing(),
            statement_errors = summary.statement_errors(),
            failed_files = summary.failed(),
            "import finished"
        );
        Ok(summary)
    }

    /// Run the canonicalization pass with the configured phases and clear
    /// the pending mark.
    pub fn canonicalize(&mut self) -> Result<CanonicalizationReport, BelGraphError> {
        let report = Canonicalizer::new(&mut *self.backend)
            .central_dogma(self.options.complete_central_dogma)
            .species(self.options.update_species)
            .involved(self.options.update_involved)
            .run()?;
        self.backend.set_canonicalization_pending(false)?;
        Ok(report)
    }

    /// Import one file. Errors become [`FileOutcome::Failed`].
    pub fn import_file(&mut self, path: &Path, caches: &mut IdentityCaches) -> FileOutcome {
        match self.read_and_import(path, caches) {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!(path = %path.display(), %error, "document failed");
                FileOutcome::Failed {
                    error: error.to_string(),
                }
            }
        }
    }

    fn read_and_import(
        &mut self,
        path: &Path,
        caches: &mut IdentityCaches,
    ) -> Result<FileOutcome, BelGraphError> {
        let io_error = |e: std::io::Error| BelGraphError::IoError(format!("{}: {e}", path.display()));

        let size = std::fs::metadata(path).map_err(io_error)?.len();
        if size > MAX_DOCUMENT_SIZE {
            return Err(BelGraphError::MalformedDocument(format!(
                "document is {size} bytes, limit is {MAX_DOCUMENT_SIZE}"
            )));
        }
        let bytes = std::fs::read(path).map_err(io_error)?;
        self.import_document(&bytes, &path.display().to_string(), caches)
    }

    /// Import one document from its raw bytes. `path` is only recorded.
    pub fn import_document(
        &mut self,
        bytes: &[u8],
        path: &str,
        caches: &mut IdentityCaches,
    ) -> Result<FileOutcome, BelGraphError> {
        let fingerprint = fingerprint(bytes);
        if self.options.skip_known_documents
            && let Some(fingerprint) = &fingerprint
            && let Some(document) = self.backend.find_document(fingerprint)?
        {
            tracing::info!(path, %document, "document already imported");
            return Ok(FileOutcome::AlreadyImported { document });
        }

        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| BelGraphError::DeserializationError(e.to_string()))?;
        if BelDocument::is_empty_json(&value) {
            tracing::warn!(path, "empty document skipped");
            return Ok(FileOutcome::Empty);
        }
        let document = BelDocument::from_json(&value)?;

        let header = document.header;
        let record = DocumentRecord {
            name: header.name,
            version: header.version,
            description: header.description,
            authors: header.authors,
            keywords: header.keywords,
            path: path.to_string(),
            fingerprint,
            size: bytes.len() as u64,
            namespaces: header.namespaces,
            annotations: header.annotations,
        };
        let registered = self.backend.register_document(record)?;
        if !registered.created && self.options.skip_known_documents {
            return Ok(FileOutcome::AlreadyImported {
                document: registered.id,
            });
        }
        self.backend.set_canonicalization_pending(true)?;

        let report = StatementReducer::new(&mut *self.backend, caches)
            .document(registered.id)
            .track_documents(self.options.track_documents)
            .reduce(&document.records);

        tracing::info!(
            path,
            document = %registered.id,
            statements = report.statements,
            inserted = report.inserted,
            existing = report.existing,
            errors = report.errors.len(),
            "document imported"
        );
        Ok(FileOutcome::Imported(report))
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
    use tempfile::tempdir;

    const TP53_DOC: &str = r#"[
        {"document": {"name": "tp53", "version": "1.0", "authors": "A, B"}},
        {"definitions": [{"namespace": {"keyword": "HGNC"}}]},
        {"statements_and_sets": [
            {"sets": [
                {"citation": {"type": "PubMed", "ref": "123"}},
                {"evidence": "TP53 increases MDM2"}
            ]},
            {"statement": [
                {"subject": [{"function": {"type": "abundance", "name": "protein"}}, [{"namespace": "HGNC", "name": "TP53"}]]},
                {"relation": "increases"},
                {"object": [{"function": {"type": "abundance", "name": "protein"}}, [{"namespace": "HGNC", "name": "MDM2"}]]}
            ]}
        ]}
    ]"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write");
        path
    }

    #[test]
    fn collects_only_bel_json_in_sorted_order() {
        let temp = tempdir().expect("temp dir");
        write(temp.path(), "b.bel.json", "[]");
        write(temp.path(), "a.bel.json", "[]");
        write(temp.path(), "notes.json", "[]");
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        write(&temp.path().join("sub"), "c.bel.json", "[]");

        let flat = collect_files(&[temp.path().to_path_buf()], false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a.bel.json", "b.bel.json"]);

        let deep = collect_files(&[temp.path().to_path_buf()], true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn imports_and_canonicalizes() {
        let temp = tempdir().expect("temp dir");
        let file = write(temp.path(), "tp53.bel.json", TP53_DOC);
        let mut graph = Graph::new();

        let summary = Importer::new(&mut graph, ImportOptions::default())
            .import_paths(&[file])
            .expect("import");

        assert_eq!(summary.inserted(), 1);
        let canonicalization = summary.canonicalization.expect("canonicalized");
        assert_eq!(canonicalization.pure_tagged, 2);
        assert_eq!(canonicalization.translated_to_added, 2);
        assert_eq!(canonicalization.species_updated, 6);
        assert_eq!(canonicalization.involved_updated, graph.node_count().unwrap());
        assert_eq!(graph.documents().unwrap().len(), 1);
        assert!(!graph.canonicalization_pending().unwrap());
    }

    #[test]
    fn interrupted_import_is_canonicalized_by_next_run() {
        let temp = tempdir().expect("temp dir");
        let file = write(temp.path(), "tp53.bel.json", TP53_DOC);
        let mut graph = Graph::new();

        // reduced and registered, but the run ended before canonicalization
        let mut caches = IdentityCaches::cold();
        let first =
            Importer::new(&mut graph, ImportOptions::default()).import_file(&file, &mut caches);
        assert!(matches!(first, FileOutcome::Imported(_)));
        assert!(graph.canonicalization_pending().unwrap());

        let next = Importer::new(&mut graph, ImportOptions::default())
            .import_paths(std::slice::from_ref(&file))
            .unwrap();
        assert!(matches!(
            next.files[0].outcome,
            FileOutcome::AlreadyImported { .. }
        ));
        assert_eq!(next.inserted(), 0);
        let canonicalization = next.canonicalization.expect("pending run canonicalized");
        assert_eq!(canonicalization.pure_tagged, 2);
        assert!(!graph.canonicalization_pending().unwrap());

        let again = Importer::new(&mut graph, ImportOptions::default())
            .import_paths(&[file])
            .unwrap();
        assert!(again.canonicalization.is_none());
    }

    #[test]
    fn interrupted_import_on_redb_survives_reopen() {
        let temp = tempdir().expect("temp dir");
        let file = write(temp.path(), "tp53.bel.json", TP53_DOC);
        let db_path = temp.path().join("kg.redb");
        {
            let mut redb = crate::storage::RedbGraph::open(&db_path).expect("open");
            let mut caches = IdentityCaches::cold();
            let outcome =
                Importer::new(&mut redb, ImportOptions::default()).import_file(&file, &mut caches);
            assert!(matches!(outcome, FileOutcome::Imported(_)));
        }

        let mut redb = crate::storage::RedbGraph::open(&db_path).expect("reopen");
        let summary = Importer::new(&mut redb, ImportOptions::default())
            .import_paths(&[file])
            .unwrap();
        assert!(summary.canonicalization.is_some());
        assert!(!redb.canonicalization_pending().unwrap());
    }

    #[test]
    fn known_document_is_skipped() {
        let temp = tempdir().expect("temp dir");
        let file = write(temp.path(), "tp53.bel.json", TP53_DOC);
        let mut graph = Graph::new();

        Importer::new(&mut graph, ImportOptions::default())
            .import_paths(std::slice::from_ref(&file))
            .unwrap();
        let edges = graph.edge_count().unwrap();
        let again = Importer::new(&mut graph, ImportOptions::default())
            .import_paths(&[file])
            .unwrap();

        assert!(matches!(
            again.files[0].outcome,
            FileOutcome::AlreadyImported { .. }
        ));
        assert!(again.canonicalization.is_none());
        assert_eq!(graph.edge_count().unwrap(), edges);
    }

    #[test]
    fn empty_and_broken_files_do_not_stop_the_run() {
        let temp = tempdir().expect("temp dir");
        write(temp.path(), "a.bel.json", "[]");
        write(temp.path(), "b.bel.json", "{not json");
        write(temp.path(), "c.bel.json", TP53_DOC);
        let mut graph = Graph::new();

        let summary = Importer::new(&mut graph, ImportOptions::default())
            .import_paths(&[temp.path().to_path_buf()])
            .unwrap();

        assert!(matches!(summary.files[0].outcome, FileOutcome::Empty));
        assert!(matches!(summary.files[1].outcome, FileOutcome::Failed { .. }));
        assert!(matches!(summary.files[2].outcome, FileOutcome::Imported(_)));
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.inserted(), 1);
    }

    #[test]
    fn cancelled_run_skips_remaining_documents() {
        let temp = tempdir().expect("temp dir");
        write(temp.path(), "a.bel.json", TP53_DOC);
        let flag = Arc::new(AtomicBool::new(true));
        let mut graph = Graph::new();

        let summary = Importer::new(&mut graph, ImportOptions::default())
            .with_cancel(flag)
            .import_paths(&[temp.path().to_path_buf()])
            .unwrap();

        assert!(matches!(summary.files[0].outcome, FileOutcome::Cancelled));
        assert!(summary.canonicalization.is_none());
        assert_eq!(graph.node_count().unwrap(), 0);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ImportOptions = toml::from_str("update_species = false").unwrap();
        assert!(!options.update_species);
        assert!(options.complete_central_dogma);
        assert!(!options.include_subfolders);
        assert!(options.update_involved);
    }
}
