//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::AnalysisArgs;
use logle_core::{AnalysisOptions, InputSource, LogleError, RunReport, validate};
use std::path::{Path, PathBuf};

// =============================================================================
// OPTIONS LOADING
// =============================================================================

/// Read an options file. An unreadable file is `EXTERNAL`; a file that is
/// not valid options TOML is `INVALID_ARGUMENT`.
pub fn read_options_file(path: &Path) -> Result<AnalysisOptions, LogleError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        tracing::debug!(path = %path.display(), error = %e, "cannot read options file");
        LogleError::open_failed(path)
    })?;
    toml::from_str(&text).map_err(|e| {
        LogleError::invalid_argument(format!("Invalid options file {}: {e}", path.display()))
    })
}

/// The options file, if any, with every flag that was given applied on top.
///
/// An input flag replaces whatever input the file selected. Two input flags
/// are `INVALID_ARGUMENT`.
pub fn load_options(args: &AnalysisArgs) -> Result<AnalysisOptions, LogleError> {
    let mut options = match &args.options {
        Some(path) => read_options_file(path)?,
        None => AnalysisOptions::default(),
    };

    if let Some(analyzer) = &args.analyzer {
        options.analyzer = Some(analyzer.clone());
    }
    let mut inputs = [
        args.csv_file.clone().map(InputSource::Csv),
        args.json_file.clone().map(InputSource::Json),
        args.json_stream_file.clone().map(InputSource::JsonStream),
    ]
    .into_iter()
    .flatten();
    if let Some(input) = inputs.next() {
        if let Some(extra) = inputs.next() {
            return Err(LogleError::invalid_argument(format!(
                "At most one input may be set, found {} and {}",
                input.field_name(),
                extra.field_name()
            )));
        }
        options.input = Some(input);
    }
    if args.show_all_sources {
        options = options.with_show_all_sources(true);
    }
    if let Some(path) = &args.output_dot_file {
        options.output_dot_file = Some(path.clone());
    }
    if let Some(path) = &args.output_pbtxt_file {
        options.output_pbtxt_file = Some(path.clone());
    }
    Ok(options)
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Run one analysis.
pub fn cmd_run(args: &AnalysisArgs, json_mode: bool, quiet: bool) -> Result<(), LogleError> {
    let options = load_options(args)?;
    let report = logle_core::run(&options)?;

    if quiet {
        return Ok(());
    }
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
        return Ok(());
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Logle Analysis");
    println!("==============");
    println!("Analyzer: {}", report.analyzer);
    println!("Nodes:    {}", report.stats.nodes);
    println!("Edges:    {}", report.stats.edges);
    println!(
        "Records:  {} processed, {} skipped",
        report.stats.records_processed, report.stats.records_skipped
    );
    println!();
    if report.written.is_empty() {
        println!("Nothing to write.");
        return;
    }
    let format = report.format.map(|f| f.to_string()).unwrap_or_default();
    for path in &report.written {
        println!("Wrote {} to {}", format, path.display());
    }
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate the configuration. Opens no input and writes no output.
pub fn cmd_check(args: &AnalysisArgs, json_mode: bool, quiet: bool) -> Result<(), LogleError> {
    let options = load_options(args)?;
    let (analyzer, input) = validate(&options)?;
    let destinations: Vec<&PathBuf> = options.destinations().collect();
    tracing::debug!(%analyzer, destinations = destinations.len(), "configuration valid");

    if quiet {
        return Ok(());
    }
    if json_mode {
        let output = serde_json::json!({
            "valid": true,
            "analyzer": analyzer,
            "input": { (input.field_name()): input.path() },
            "show_all_sources": options.show_all_sources(),
            "destinations": destinations,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Configuration OK");
    println!("================");
    println!("Analyzer: {}", analyzer);
    println!("Input:    {} = {}", input.field_name(), input.path().display());
    if destinations.is_empty() {
        println!("Outputs:  none");
    }
    for path in destinations {
        println!("Output:   {}", path.display());
    }
    Ok(())
}
