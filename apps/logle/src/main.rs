//! # Logle - Log Analysis with Graphs
//!
//! The main binary for logle-core.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  apps/logle (THE BINARY)                 │
//! │                                                          │
//! │   ┌──────────────┐    ┌────────────────────────────┐     │
//! │   │     CLI      │    │  Options (TOML) + flags    │     │
//! │   │   (clap)     │───▶│  -> AnalysisOptions        │     │
//! │   └──────────────┘    └─────────────┬──────────────┘     │
//! │                                     ▼                    │
//! │                           ┌──────────────────┐           │
//! │                           │   logle-core     │           │
//! │                           │   (THE LOGIC)    │           │
//! │                           └──────────────────┘           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Account access graph from a CSV file
//! logle run --analyzer mail --csv-file access.csv --output-dot-file access.dot
//!
//! # Event timeline from a Plaso stream, options from a file
//! logle run --options timeline.toml --output-pbtxt-file timeline.pbtxt
//!
//! # Validate a configuration without touching any file it names
//! logle check --options timeline.toml
//! ```

use clap::Parser;
use logle::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing — LOGLE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LOGLE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli::default_log_filter(cli.verbose).into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
