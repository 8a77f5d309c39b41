//! # Analysis Pipelines
//!
//! Three independent analyzers, each turning one input format into one
//! labeled graph:
//!
//! | Selector | Analyzer                      | Input                  |
//! |----------|-------------------------------|------------------------|
//! | `curio`  | [`curio::CurioAnalyzer`]      | whole JSON document    |
//! | `mail`   | [`access::AccessAnalyzer`]    | CSV                    |
//! | `plaso`  | [`plaso::PlasoAnalyzer`]      | JSON document / stream |
//!
//! Every analyzer follows the same two-phase protocol: `initialize` consumes
//! the input reader and validates its shape, then `build` constructs the
//! graph. Rendering before `build` yields the empty string.

pub mod access;
pub mod curio;
pub mod plaso;

use crate::options::AnalysisOptions;
use crate::primitives::MAX_MALFORMED_RECORDS;
use crate::{LogleError, Status};
use serde::Serialize;
use std::fmt;

// =============================================================================
// OUTPUT FORMATS
// =============================================================================

/// Text formats a graph can be rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    /// GraphViz DOT.
    Dot,
    /// Text-proto `GraphDef`.
    PbTxt,
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dot => f.write_str("dot"),
            Self::PbTxt => f.write_str("pbtxt"),
        }
    }
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Size of a built graph and how much input went into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    /// Input records (rows, streams or events) that were used.
    pub records_processed: usize,
    /// Input records that were malformed and skipped.
    pub records_skipped: usize,
}

/// Counts malformed records and aborts once the limit is reached.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SkipCounter {
    skipped: usize,
    limit: usize,
}

impl Default for SkipCounter {
    fn default() -> Self {
        Self {
            skipped: 0,
            limit: MAX_MALFORMED_RECORDS,
        }
    }
}

impl SkipCounter {
    /// Record one skipped record. Fails with `INVALID_ARGUMENT` when the
    /// count reaches the limit.
    pub(crate) fn skip(&mut self, reason: &str) -> Status {
        self.skipped = self.skipped.saturating_add(1);
        tracing::warn!(skipped = self.skipped, reason, "skipping malformed record");
        if self.skipped >= self.limit {
            return Err(LogleError::invalid_argument(format!(
                "Over {} malformed records in input. Aborting.",
                self.limit
            )));
        }
        Ok(())
    }

    pub(crate) fn count(&self) -> usize {
        self.skipped
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// The operations the dispatcher drives on an initialized analyzer.
pub trait AnalysisPipeline {
    /// Construct the graph.
    fn build(&mut self) -> Status;

    /// The format this pipeline renders for `options`, if any.
    #[must_use]
    fn output_format(&self, options: &AnalysisOptions) -> Option<GraphFormat>;

    /// Render the built graph. Empty when there is nothing to write.
    #[must_use]
    fn render(&self, format: GraphFormat) -> String;

    #[must_use]
    fn stats(&self) -> GraphStats;
}

/// An initialized analyzer, one variant per selector.
#[derive(Debug)]
pub enum Pipeline {
    Curio(curio::CurioAnalyzer),
    Access(access::AccessAnalyzer),
    Plaso(plaso::PlasoAnalyzer),
}

impl AnalysisPipeline for Pipeline {
    fn build(&mut self) -> Status {
        match self {
            Self::Curio(a) => a.build(),
            Self::Access(a) => a.build(),
            Self::Plaso(a) => a.build(),
        }
    }

    /// The dependency and access pipelines always render DOT. The timeline
    /// pipeline renders DOT when a DOT destination is set, otherwise pbtxt
    /// when a pbtxt destination is set, otherwise nothing.
    fn output_format(&self, options: &AnalysisOptions) -> Option<GraphFormat> {
        match self {
            Self::Curio(_) | Self::Access(_) => Some(GraphFormat::Dot),
            Self::Plaso(_) => {
                if options.has_dot_output() {
                    Some(GraphFormat::Dot)
                } else if options.has_pbtxt_output() {
                    Some(GraphFormat::PbTxt)
                } else {
                    None
                }
            }
        }
    }

    fn render(&self, format: GraphFormat) -> String {
        match self {
            Self::Curio(a) => a.render(format),
            Self::Access(a) => a.render(format),
            Self::Plaso(a) => a.render(format),
        }
    }

    fn stats(&self) -> GraphStats {
        match self {
            Self::Curio(a) => a.stats(),
            Self::Access(a) => a.stats(),
            Self::Plaso(a) => a.stats(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
