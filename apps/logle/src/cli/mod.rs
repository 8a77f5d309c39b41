//! # Logle CLI Module
//!
//! This module implements the CLI interface for Logle.
//!
//! ## Available Commands
//!
//! - `run` - Run one analysis and write its graph
//! - `check` - Validate a configuration without reading or writing files
//!
//! Both commands take the analysis configuration from an optional TOML
//! options file, overridden field by field by command-line flags.

mod commands;

use clap::{Args, Parser, Subcommand};
use logle_core::LogleError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Logle - log analysis with graphs
///
/// Turns stream dependency documents, account access logs and Plaso
/// timelines into GraphViz DOT or text-proto graphs.
#[derive(Parser, Debug)]
#[command(name = "logle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress the run summary
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print the summary as JSON (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an analysis and write the resulting graph
    Run(AnalysisArgs),

    /// Validate an analysis configuration; opens no files
    Check(AnalysisArgs),
}

/// The analysis configuration, as flags. At most one input flag may be
/// given.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// TOML options file; flags override its values
    #[arg(short, long)]
    pub options: Option<PathBuf>,

    /// Analyzer to run (curio, mail, plaso)
    #[arg(short, long)]
    pub analyzer: Option<String>,

    /// CSV input (mail)
    #[arg(long)]
    pub csv_file: Option<PathBuf>,

    /// Whole JSON document input (curio, plaso)
    #[arg(long)]
    pub json_file: Option<PathBuf>,

    /// Line-delimited JSON input (plaso)
    #[arg(long)]
    pub json_stream_file: Option<PathBuf>,

    /// Link every Plaso event to the file it was reconstructed from
    #[arg(long)]
    pub show_all_sources: bool,

    /// Write the graph as DOT to this file
    #[arg(long)]
    pub output_dot_file: Option<PathBuf>,

    /// Write the graph as pbtxt to this file
    #[arg(long)]
    pub output_pbtxt_file: Option<PathBuf>,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), LogleError> {
    let json_mode = cli.json_mode;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Run(args) => cmd_run(&args, json_mode, quiet),
        Commands::Check(args) => cmd_check(&args, json_mode, quiet),
    }
}

/// The default log filter for a verbosity.
#[must_use]
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "logle=debug,logle_core=debug"
    } else {
        "logle=info,logle_core=info"
    }
}
