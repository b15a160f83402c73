//! # belgraph - BEL Graph Compiler
//!
//! Command-line front end for `belgraph-core`.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │             apps/belgraph (THE BINARY)        │
//! │                                               │
//! │   ┌─────────────┐        ┌────────────────┐   │
//! │   │    CLI      │        │    Config      │   │
//! │   │   (clap)    │◄───────│    (TOML)      │   │
//! │   └──────┬──────┘        └────────────────┘   │
//! │          ▼                                    │
//! │   ┌───────────────┐                           │
//! │   │ belgraph-core │                           │
//! │   │ (THE ENGINE)  │                           │
//! │   └───────────────┘                           │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! belgraph init
//! belgraph import ./networks --recursive
//! belgraph lookup 'p(HGNC:"TP53")' --class protein
//! belgraph export -o graph.json
//! ```

use belgraph::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // BELGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("BELGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "belgraph=info,belgraph_core=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!("belgraph v{} - BEL graph compiler", env!("CARGO_PKG_VERSION"));
    println!();
}
