//! # belgraph CLI Module
//!
//! ## Available Commands
//!
//! - `init` - Create an empty database
//! - `import` - Compile BEL JSON documents into the graph
//! - `canonicalize` - Re-run the canonicalization pass
//! - `status` - Node and edge counts
//! - `lookup` - Show one node and its outgoing edges
//! - `export` - Write a JSON snapshot of the graph
//! - `compact` - Reclaim free space in a redb database
//!
//! Settings are resolved in order: built-in defaults, `--config` file,
//! command-line flags.

mod commands;

use belgraph_core::{BelGraphConfig, BelGraphError, ImportOptions, StorageKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// belgraph - compile BEL documents into a knowledge graph
#[derive(Parser, Debug)]
#[command(name = "belgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the graph database [default: belgraph.redb]
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (ACID database) or "file" (JSON snapshot)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<StorageKind>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Import *.bel.json files or directories
    Import {
        /// Files or directories to import
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Scan directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Do not add missing RNA/gene precursors
        #[arg(long)]
        no_central_dogma: bool,

        /// Do not infer species from namespaces
        #[arg(long)]
        no_species: bool,

        /// Do not fill involved genes/others on nodes
        #[arg(long)]
        no_involved: bool,

        /// Do not record source documents on existing edges
        #[arg(long)]
        no_document_refs: bool,
    },

    /// Run the canonicalization pass on the stored graph
    Canonicalize,

    /// Show graph status
    Status,

    /// Look up a node by canonical BEL string
    Lookup {
        /// Canonical string, e.g. 'p(HGNC:"TP53")'
        canonical: String,

        /// Function class, e.g. protein
        #[arg(short, long)]
        class: String,
    },

    /// Export graph as a JSON snapshot
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compact the redb database file
    Compact,
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Effective settings of one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: PathBuf,
    pub backend: StorageKind,
    pub import: ImportOptions,
    pub json_mode: bool,
}

impl Settings {
    /// Merge the configuration file (if any) with the global flags.
    pub fn resolve(cli: &Cli) -> Result<Self, BelGraphError> {
        let config = match &cli.config {
            Some(path) => BelGraphConfig::load(path)?,
            None => BelGraphConfig::default(),
        };
        Ok(Self {
            database: cli.database.clone().unwrap_or(config.storage.path),
            backend: cli.backend.unwrap_or(config.storage.backend),
            import: config.import,
            json_mode: cli.json_mode,
        })
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), BelGraphError> {
    let mut settings = Settings::resolve(&cli)?;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&settings, force),
        Some(Commands::Import {
            paths,
            recursive,
            no_central_dogma,
            no_species,
            no_involved,
            no_document_refs,
        }) => {
            let import = &mut settings.import;
            import.include_subfolders |= recursive;
            import.complete_central_dogma &= !no_central_dogma;
            import.update_species &= !no_species;
            import.update_involved &= !no_involved;
            import.track_documents &= !no_document_refs;
            cmd_import(&settings, &paths)
        }
        Some(Commands::Canonicalize) => cmd_canonicalize(&settings),
        Some(Commands::Status) | None => cmd_status(&settings),
        Some(Commands::Lookup { canonical, class }) => cmd_lookup(&settings, &canonical, &class),
        Some(Commands::Export { output }) => cmd_export(&settings, &output),
        Some(Commands::Compact) => cmd_compact(&settings),
    }
}
