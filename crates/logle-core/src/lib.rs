//! # logle-core
//!
//! Log analysis with labeled graphs.
//!
//! A run reads one input (CSV, a whole JSON document or a line-delimited
//! JSON stream), hands it to one of three analyzers, and writes the
//! resulting graph as GraphViz DOT or a text-proto `GraphDef`.
//!
//! ## Architecture
//!
//! - [`Frontend`] validates an [`AnalysisOptions`], acquires the input
//!   through an [`InputAcquirer`], runs the selected [`Pipeline`] and
//!   persists the render through an [`OutputWriter`].
//! - Every analyzer builds a [`LabeledGraph`]; the exporters in [`export`]
//!   turn it into text.
//!
//! ## Constraints
//!
//! - Synchronous: one analysis per call, phases run in order
//! - Deterministic: `BTreeMap` storage, ids in allocation order, so the
//!   same input always renders the same bytes
//! - No panics in library code: every failure is a [`LogleError`]

// =============================================================================
// MODULES
// =============================================================================

pub mod analyzers;
pub mod csv;
pub mod export;
pub mod frontend;
pub mod graph;
pub mod input;
pub mod json;
pub mod options;
pub mod output;
pub mod primitives;
pub mod types;

// =============================================================================
// RE-EXPORTS: Status
// =============================================================================

pub use types::{Code, LogleError, Status};

// =============================================================================
// RE-EXPORTS: Configuration and Dispatch
// =============================================================================

pub use frontend::{AnalyzerFactory, Frontend, PipelineFactory, RunReport, run, validate};
pub use options::{AnalysisOptions, AnalyzerKind, InputSource, PlasoOptions};

// =============================================================================
// RE-EXPORTS: Graphs and Exporters
// =============================================================================

pub use analyzers::{AnalysisPipeline, GraphFormat, GraphStats, Pipeline};
pub use export::{DotPrinter, PbtxtExporter, format_timestamp};
pub use graph::{Edge, EdgeId, GraphSchema, Label, LabelValue, LabeledGraph, NodeId};

// =============================================================================
// RE-EXPORTS: I/O
// =============================================================================

pub use csv::{CsvParser, Record};
pub use input::{FsInputAcquirer, InputAcquirer};
pub use json::{JsonDocument, JsonEvents, JsonStream};
pub use output::{FsOutputWriter, OutputWriter};
