//! # Configuration
//!
//! Optional TOML file; every key has a default.
//!
//! ```toml
//! [storage]
//! backend = "redb"          # or "file" (JSON snapshot)
//! path = "belgraph.redb"
//!
//! [import]
//! include_subfolders = false
//! complete_central_dogma = true
//! update_species = true
//! update_involved = true
//! track_documents = true
//! warm_cache = true
//! skip_known_documents = true
//! ```

use crate::importer::ImportOptions;
use crate::types::BelGraphError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default database path when neither the file nor the command line names one.
pub const DEFAULT_DATABASE: &str = "belgraph.redb";

/// Where the graph lives between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// redb database.
    #[default]
    Redb,
    /// JSON snapshot of the in-memory graph.
    File,
}

impl FromStr for StorageKind {
    type Err = BelGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "file" => Ok(Self::File),
            other => Err(BelGraphError::ConfigError(format!(
                "unknown backend '{other}' (expected 'redb' or 'file')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageKind,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            path: PathBuf::from(DEFAULT_DATABASE),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BelGraphConfig {
    pub storage: StorageConfig,
    pub import: ImportOptions,
}

impl BelGraphConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, BelGraphError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BelGraphError::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| BelGraphError::ConfigError(format!("{}: {e}", path.display())))
    }

    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, BelGraphError> {
        toml::from_str(content).map_err(|e| BelGraphError::ConfigError(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_gives_defaults() {
        let config = BelGraphConfig::from_toml("").unwrap();
        assert_eq!(config, BelGraphConfig::default());
        assert_eq!(config.storage.backend, StorageKind::Redb);
        assert!(config.import.track_documents);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = BelGraphConfig::from_toml(
            r#"
            [storage]
            backend = "file"

            [import]
            include_subfolders = true
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageKind::File);
        assert_eq!(config.storage.path, PathBuf::from(DEFAULT_DATABASE));
        assert!(config.import.include_subfolders);
        assert!(config.import.warm_cache);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        assert!(matches!(
            BelGraphConfig::from_toml("[storage\nbackend ="),
            Err(BelGraphError::ConfigError(_))
        ));
        assert!(matches!(
            BelGraphConfig::from_toml("[storage]\nbackend = \"neo4j\""),
            Err(BelGraphError::ConfigError(_))
        ));
    }

    #[test]
    fn load_from_disk() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("belgraph.toml");
        std::fs::write(&path, "[storage]\npath = \"kg.redb\"\n").unwrap();
        let config = BelGraphConfig::load(&path).unwrap();
        assert_eq!(config.storage.path, PathBuf::from("kg.redb"));

        assert!(BelGraphConfig::load(&temp.path().join("missing.toml")).is_err());
    }

    #[test]
    fn backend_names_parse() {
        assert_eq!("REDB".parse::<StorageKind>().unwrap(), StorageKind::Redb);
        assert_eq!("file".parse::<StorageKind>().unwrap(), StorageKind::File);
        assert!("neo4j".parse::<StorageKind>().is_err());
    }
}
