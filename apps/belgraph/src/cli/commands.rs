//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::Settings;
use belgraph_core::{
    BelGraphError, EdgeKind, FileOutcome, FunctionClass, Graph, Importer, ImportSummary,
    SerializableGraph, Session, StorageKind,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Maximum size of a `file` backend snapshot (500 MB).
const MAX_SNAPSHOT_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), BelGraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| BelGraphError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(BelGraphError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an output path: the parent directory must exist.
///
/// Returns the path with its parent canonicalized.
fn validate_output_path(path: &Path) -> Result<PathBuf, BelGraphError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        BelGraphError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(BelGraphError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| BelGraphError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn backend_name(kind: StorageKind) -> &'static str {
    match kind {
        StorageKind::Redb => "redb",
        StorageKind::File => "file",
    }
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new database.
pub fn cmd_init(settings: &Settings, force: bool) -> Result<(), BelGraphError> {
    let db_path = &settings.database;
    if db_path.exists() {
        if !force {
            return Err(BelGraphError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| BelGraphError::IoError(format!("Remove db: {}", e)))?;
    }

    match settings.backend {
        StorageKind::Redb => {
            let _session = Session::with_redb(db_path)?;
        }
        StorageKind::File => save_session(&Session::new(), db_path)?,
    }
    tracing::info!(database = %db_path.display(), backend = backend_name(settings.backend), "database initialized");

    if settings.json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend_name(settings.backend),
        }));
    } else {
        println!(
            "Initialized new {} database at {:?}",
            backend_name(settings.backend),
            db_path
        );
    }
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import BEL JSON documents and canonicalize.
pub fn cmd_import(settings: &Settings, paths: &[PathBuf]) -> Result<(), BelGraphError> {
    let mut session = load_or_create_session(settings)?;

    let summary = Importer::new(session.store_mut(), settings.import).import_paths(paths)?;
    save_session(&session, &settings.database)?;

    if settings.json_mode {
        let output = serde_json::to_value(&summary)
            .map_err(|e| BelGraphError::SerializationError(e.to_string()))?;
        print_json(&output);
    } else {
        print_import_summary(&summary);
    }
    Ok(())
}

fn print_import_summary(summary: &ImportSummary) {
    println!("Import Summary");
    println!("==============");
    for file in &summary.files {
        let status = match &file.outcome {
            FileOutcome::Imported(report) => format!(
                "{} inserted, {} existing, {} skipped",
                report.inserted,
                report.existing,
                report.errors.len()
            ),
            FileOutcome::AlreadyImported { document } => format!("already imported ({document})"),
            FileOutcome::Empty => "empty".to_string(),
            FileOutcome::Failed { error } => format!("FAILED: {error}"),
            FileOutcome::Cancelled => "cancelled".to_string(),
        };
        println!("  {}: {}", file.path.display(), status);
    }
    println!();
    println!("Inserted edges:    {}", summary.inserted());
    println!("Existing edges:    {}", summary.existing());
    println!("Skipped records:   {}", summary.statement_errors());
    println!("Failed files:      {}", summary.failed());

    if let Some(report) = &summary.canonicalization {
        println!();
        println!("Canonicalization");
        println!("  Pure tagged:      {}", report.pure_tagged);
        println!("  Pure nodes:       {}", report.pure_nodes_created);
        println!("  Pure links:       {}", report.pure_links_created);
        println!("  translated_to:    {}", report.translated_to_added);
        println!("  transcribed_to:   {}", report.transcribed_to_added);
        println!("  Species set:      {}", report.species_updated);
        println!("  Involved set:     {}", report.involved_updated);
        println!("  Failures:         {}", report.failures);
    }
}

// =============================================================================
// CANONICALIZE COMMAND
// =============================================================================

/// Run the canonicalization pass alone.
pub fn cmd_canonicalize(settings: &Settings) -> Result<(), BelGraphError> {
    let mut session = load_or_create_session(settings)?;
    let report = Importer::new(session.store_mut(), settings.import).canonicalize()?;
    save_session(&session, &settings.database)?;

    if settings.json_mode {
        let output = serde_json::to_value(report)
            .map_err(|e| BelGraphError::SerializationError(e.to_string()))?;
        print_json(&output);
    } else {
        println!(
            "Canonicalized: {} tagged pure, {} nodes and edges created, {} species set, {} involved set, {} failures",
            report.pure_tagged,
            report.created(),
            report.species_updated,
            report.involved_updated,
            report.failures
        );
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph status.
pub fn cmd_status(settings: &Settings) -> Result<(), BelGraphError> {
    let session = load_or_create_session(settings)?;
    let store = session.store();

    let mut classes: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut pure = 0_usize;
    for node in store.nodes()? {
        *classes.entry(node.class.name()).or_default() += 1;
        if node.pure {
            pure += 1;
        }
    }
    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    for edge in store.edges()? {
        *kinds.entry(edge.kind.label()).or_default() += 1;
    }
    let node_count = store.node_count()?;
    let edge_count = store.edge_count()?;
    let documents = store.documents()?.len();

    if settings.json_mode {
        print_json(&serde_json::json!({
            "database": settings.database.to_string_lossy(),
            "backend": backend_name(settings.backend),
            "node_count": node_count,
            "edge_count": edge_count,
            "pure_nodes": pure,
            "documents": documents,
            "nodes_by_class": classes,
            "edges_by_kind": kinds,
        }));
        return Ok(());
    }

    println!("belgraph Status");
    println!("===============");
    println!("Database:  {:?}", settings.database);
    println!("Backend:   {}", backend_name(settings.backend));
    println!();
    println!("Nodes:     {} ({} pure)", node_count, pure);
    println!("Edges:     {}", edge_count);
    println!("Documents: {}", documents);
    if !classes.is_empty() {
        println!();
        println!("Nodes by class:");
        for (class, count) in &classes {
            println!("  {:<28} {}", class, count);
        }
    }
    if !kinds.is_empty() {
        println!();
        println!("Edges by kind:");
        for (kind, count) in &kinds {
            println!("  {:<28} {}", kind, count);
        }
    }
    Ok(())
}

// =============================================================================
// LOOKUP COMMAND
// =============================================================================

/// Show one node and its outgoing edges.
pub fn cmd_lookup(settings: &Settings, canonical: &str, class: &str) -> Result<(), BelGraphError> {
    let class = FunctionClass::from_name(class)
        .ok_or_else(|| BelGraphError::UnknownFunction(class.to_string()))?;

    let session = load_or_create_session(settings)?;
    let store = session.store();

    let Some(id) = store.node_by_bel(class, canonical)? else {
        if settings.json_mode {
            print_json(&serde_json::json!({ "found": false }));
        } else {
            println!("No {} node {}", class.name(), canonical);
        }
        return Ok(());
    };
    let node = store.node(id)?.ok_or(BelGraphError::NodeNotFound(id))?;
    let outgoing = store.outgoing(id)?;

    if settings.json_mode {
        print_json(&serde_json::json!({
            "found": true,
            "node": node,
            "outgoing": outgoing,
        }));
        return Ok(());
    }

    println!("Node {}", node.id);
    println!("  class:   {}", node.class.name());
    println!("  bel:     {}", node.bel);
    println!("  pure:    {}", node.pure);
    if let Some(species) = node.species {
        println!("  species: {}", species);
    }
    for (key, value) in &node.properties {
        println!("  {}: {}", key, value);
    }
    if !outgoing.is_empty() {
        println!();
        println!("Outgoing:");
        for edge in &outgoing {
            let target = store
                .node(edge.to)?
                .map(|n| n.bel)
                .unwrap_or_else(|| edge.to.to_string());
            let pmid = match &edge.kind {
                EdgeKind::Relation(_) => edge
                    .provenance
                    .as_ref()
                    .map(|p| format!(" [pmid {}]", p.pmid))
                    .unwrap_or_default(),
                _ => String::new(),
            };
            println!("  -{}-> {}{}", edge.kind, target, pmid);
        }
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the graph as a JSON snapshot.
pub fn cmd_export(settings: &Settings, output: &Path) -> Result<(), BelGraphError> {
    let validated_output = validate_output_path(output)?;
    let session = load_or_create_session(settings)?;

    let snapshot = session.snapshot()?;
    let data = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| BelGraphError::SerializationError(e.to_string()))?;
    std::fs::write(&validated_output, &data)
        .map_err(|e| BelGraphError::IoError(format!("Write file: {}", e)))?;

    if settings.json_mode {
        print_json(&serde_json::json!({
            "output": validated_output.to_string_lossy(),
            "bytes": data.len(),
            "nodes": snapshot.nodes.len(),
            "edges": snapshot.edges.len(),
        }));
    } else {
        println!("Exported {} bytes to {:?}", data.len(), validated_output);
    }
    Ok(())
}

// =============================================================================
// COMPACT COMMAND
// =============================================================================

/// Compact the database file.
///
/// Only the redb backend has free pages to reclaim; a `file` snapshot is
/// rewritten whole on every save.
pub fn cmd_compact(settings: &Settings) -> Result<(), BelGraphError> {
    if settings.backend != StorageKind::Redb {
        return Err(BelGraphError::ConfigError(format!(
            "compact needs the redb backend, not {}",
            backend_name(settings.backend)
        )));
    }
    let mut session = load_or_create_session(settings)?;
    let compacted = session.compact()?;
    tracing::info!(database = %settings.database.display(), compacted, "database compacted");

    if settings.json_mode {
        print_json(&serde_json::json!({
            "database": settings.database.to_string_lossy(),
            "compacted": compacted,
        }));
    } else if compacted {
        println!("Compacted {:?}", settings.database);
    } else {
        println!("Nothing to compact in {:?}", settings.database);
    }
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load or create a session from the configured database and backend.
pub fn load_or_create_session(settings: &Settings) -> Result<Session, BelGraphError> {
    let db_path = &settings.database;
    match settings.backend {
        StorageKind::Redb => Session::with_redb(db_path),
        StorageKind::File => {
            if !db_path.exists() {
                return Ok(Session::new());
            }
            validate_file_size(db_path, MAX_SNAPSHOT_SIZE)?;
            let data = std::fs::read(db_path)
                .map_err(|e| BelGraphError::IoError(format!("Read db: {}", e)))?;
            let snapshot: SerializableGraph = serde_json::from_slice(&data)
                .map_err(|e| BelGraphError::DeserializationError(e.to_string()))?;
            Ok(Session::with_graph(Graph::from(snapshot)))
        }
    }
}

/// Save a session to a database path.
pub fn save_session(session: &Session, db_path: &Path) -> Result<(), BelGraphError> {
    if session.is_persistent() {
        // redb commits every write
        return Ok(());
    }
    let snapshot = session.snapshot()?;
    let data = serde_json::to_vec(&snapshot)
        .map_err(|e| BelGraphError::SerializationError(e.to_string()))?;
    std::fs::write(db_path, &data).map_err(|e| BelGraphError::IoError(format!("Write db: {}", e)))?;
    Ok(())
}
