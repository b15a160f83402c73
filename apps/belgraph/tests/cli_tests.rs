//! Integration tests for the command layer.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use belgraph::cli::{
    Cli, Commands, Settings, cmd_compact, cmd_export, cmd_import, cmd_init, cmd_lookup,
    cmd_status, execute, load_or_create_session,
};
use belgraph_core::{FunctionClass, ImportOptions, SerializableGraph, StorageKind};
use clap::Parser;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const TP53_DOC: &str = r#"[
    {"document": {"name": "tp53", "version": "1.0"}},
    {"definitions": [{"namespace": {"keyword": "HGNC"}}]},
    {"statements_and_sets": [
        {"sets": [{"citation": {"type": "PubMed", "ref": "1"}}, {"evidence": "e"}]},
        {"statement": [
            {"subject": [{"function": {"type": "abundance", "name": "protein"}}, [{"namespace": "HGNC", "name": "TP53"}, [{"function": {"type": "modifier", "name": "pmod"}}, [{"namespace": null, "name": null, "type": "pmod_pho", "amino_acid": "Ser", "position": 15}]]]]},
            {"relation": "increases"},
            {"object": [{"function": {"type": "abundance", "name": "protein"}}, [{"namespace": "HGNC", "name": "MDM2"}]]}
        ]}
    ]}
]"#;

fn settings(dir: &Path, backend: StorageKind) -> Settings {
    let name = match backend {
        StorageKind::Redb => "graph.redb",
        StorageKind::File => "graph.json",
    };
    Settings {
        database: dir.join(name),
        backend,
        import: ImportOptions::default(),
        json_mode: true,
    }
}

fn write_doc(dir: &Path) -> PathBuf {
    let path = dir.join("tp53.bel.json");
    std::fs::write(&path, TP53_DOC).unwrap();
    path
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn test_parse_import_flags() {
    let cli = Cli::parse_from([
        "belgraph",
        "-B",
        "file",
        "import",
        "a.bel.json",
        "dir",
        "--recursive",
        "--no-species",
        "--no-involved",
    ]);
    assert_eq!(cli.backend, Some(StorageKind::File));
    let Some(Commands::Import {
        paths,
        recursive,
        no_species,
        no_involved,
        no_central_dogma,
        ..
    }) = cli.command
    else {
        panic!("expected import");
    };
    assert_eq!(paths.len(), 2);
    assert!(recursive);
    assert!(no_species);
    assert!(no_involved);
    assert!(!no_central_dogma);
}

#[test]
fn test_unknown_backend_is_rejected() {
    assert!(Cli::try_parse_from(["belgraph", "-B", "neo4j", "status"]).is_err());
}

#[test]
fn test_config_file_and_flag_precedence() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("belgraph.toml");
    std::fs::write(
        &config,
        "[storage]\nbackend = \"file\"\npath = \"from-config.json\"\n[import]\nwarm_cache = false\n",
    )
    .unwrap();

    let cli = Cli::parse_from([
        "belgraph",
        "--config",
        config.to_str().unwrap(),
        "-D",
        "from-flag.json",
        "status",
    ]);
    let settings = Settings::resolve(&cli).unwrap();
    assert_eq!(settings.database, PathBuf::from("from-flag.json"));
    assert_eq!(settings.backend, StorageKind::File);
    assert!(!settings.import.warm_cache);
}

// =============================================================================
// COMMANDS
// =============================================================================

#[test]
fn test_init_refuses_existing_database() {
    let temp = tempdir().unwrap();
    let settings = settings(temp.path(), StorageKind::Redb);
    cmd_init(&settings, false).unwrap();
    assert!(cmd_init(&settings, false).is_err());
    cmd_init(&settings, true).unwrap();
}

#[test]
fn test_import_then_lookup_redb() {
    let temp = tempdir().unwrap();
    let doc = write_doc(temp.path());
    let settings = settings(temp.path(), StorageKind::Redb);

    cmd_import(&settings, &[doc]).unwrap();

    let session = load_or_create_session(&settings).unwrap();
    let store = session.store();
    let pure = store
        .node_by_bel(FunctionClass::Protein, "p(HGNC:\"TP53\")")
        .unwrap()
        .expect("pure TP53 created by canonicalization");
    let pure = store.node(pure).unwrap().unwrap();
    assert!(pure.pure);
    assert!(pure.involved_genes.unwrap().contains("TP53"));
    drop(session);

    cmd_lookup(&settings, "p(HGNC:\"TP53\")", "protein").unwrap();
    cmd_status(&settings).unwrap();
    assert!(cmd_lookup(&settings, "p(HGNC:\"TP53\")", "proteinz").is_err());
}

#[test]
fn test_file_backend_round_trip() {
    let temp = tempdir().unwrap();
    let doc = write_doc(temp.path());
    let settings = settings(temp.path(), StorageKind::File);

    cmd_import(&settings, std::slice::from_ref(&doc)).unwrap();
    let first = load_or_create_session(&settings).unwrap().snapshot().unwrap();

    // the same document again changes nothing
    cmd_import(&settings, &[doc]).unwrap();
    let second = load_or_create_session(&settings).unwrap().snapshot().unwrap();
    assert_eq!(first, second);

    let output = temp.path().join("export.json");
    cmd_export(&settings, &output).unwrap();
    let exported: SerializableGraph =
        serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(exported, second);
}

#[test]
fn test_export_rejects_missing_directory() {
    let temp = tempdir().unwrap();
    let settings = settings(temp.path(), StorageKind::File);
    assert!(cmd_export(&settings, &temp.path().join("nope").join("out.json")).is_err());
}

#[test]
fn test_execute_dispatches_import() {
    let temp = tempdir().unwrap();
    let doc = write_doc(temp.path());
    let db = temp.path().join("graph.redb");

    let cli = Cli::parse_from([
        "belgraph",
        "--json-mode",
        "-D",
        db.to_str().unwrap(),
        "import",
        doc.to_str().unwrap(),
        "--no-central-dogma",
    ]);
    execute(cli).unwrap();

    let settings = settings(temp.path(), StorageKind::Redb);
    let session = load_or_create_session(&settings).unwrap();
    assert!(
        session
            .store()
            .node_by_bel(FunctionClass::Rna, "r(HGNC:\"MDM2\")")
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_compact_after_import_redb() {
    let temp = tempdir().unwrap();
    let doc = write_doc(temp.path());
    let settings = settings(temp.path(), StorageKind::Redb);

    cmd_import(&settings, &[doc]).unwrap();
    let before = load_or_create_session(&settings).unwrap().snapshot().unwrap();
    cmd_compact(&settings).unwrap();
    let after = load_or_create_session(&settings).unwrap().snapshot().unwrap();
    assert_eq!(before, after);

    let cli = Cli::parse_from(["belgraph", "-D", "x.redb", "compact"]);
    assert!(matches!(cli.command, Some(Commands::Compact)));
}

#[test]
fn test_compact_rejects_file_backend() {
    let temp = tempdir().unwrap();
    let settings = settings(temp.path(), StorageKind::File);
    assert!(cmd_compact(&settings).is_err());
}
