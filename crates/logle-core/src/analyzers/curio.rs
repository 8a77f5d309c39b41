//! # Stream Dependency Analyzer
//!
//! Builds a graph of data-stream dependencies from a JSON document of the
//! form `{ stream_id: stream, ... }`. A well-formed stream looks like:
//!
//! ```json
//! {
//!   "Node": { "ID": { "Name": "ingest" } },
//!   "Children": { "producer_id": { "Node": ..., "Children": ... } }
//! }
//! ```
//!
//! Every child is a producer its parent consumes. Each consumer/producer pair
//! becomes a `Dependent` edge from consumer to producer. The clock stream is
//! a dependency of everything and is left out.

use super::{GraphFormat, GraphStats, SkipCounter};
use crate::export::{DotPrinter, PbtxtExporter};
use crate::graph::{GraphSchema, Label, LabelValue, LabeledGraph};
use crate::json::{JsonDocument, value_text};
use crate::primitives::CLOCK_STREAM_ID;
use crate::{LogleError, Status};
use serde_json::{Map, Value};
use tracing::{debug, info};

const STREAM_TAG: &str = "Stream";
const DEPENDENT_TAG: &str = "Dependent";
const GRAPH_NAME: &str = "stream_dependencies";

// =============================================================================
// GRAPH
// =============================================================================

/// Streams are unique `Stream(id, name)` nodes; dependencies are unique
/// `Dependent` edges from consumer to producer.
#[derive(Debug, Clone)]
pub struct StreamDependencyGraph {
    graph: LabeledGraph,
}

impl Default for StreamDependencyGraph {
    fn default() -> Self {
        let schema = GraphSchema::new()
            .node(STREAM_TAG, true)
            .edge(DEPENDENT_TAG, true);
        Self {
            graph: LabeledGraph::new(schema),
        }
    }
}

impl StreamDependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The label of a stream node.
    #[must_use]
    pub fn stream_label(id: &str, name: &str) -> Label {
        Label::new(
            STREAM_TAG,
            LabelValue::Tuple(vec![LabelValue::str(id), LabelValue::str(name)]),
        )
    }

    /// Record that the consumer stream reads from the producer stream.
    pub fn add_dependency(
        &mut self,
        consumer: (&str, &str),
        producer: (&str, &str),
    ) -> Status {
        let consumer = self
            .graph
            .find_or_add_node(Self::stream_label(consumer.0, consumer.1))?;
        let producer = self
            .graph
            .find_or_add_node(Self::stream_label(producer.0, producer.1))?;
        self.graph
            .find_or_add_edge(consumer, producer, Label::null(DEPENDENT_TAG))?;
        Ok(())
    }

    #[must_use]
    pub fn graph(&self) -> &LabeledGraph {
        &self.graph
    }

    /// DOT with stream names as node labels.
    #[must_use]
    pub fn to_dot(&self) -> String {
        fn stream_attribute(tag: &str, value: &LabelValue) -> String {
            DotPrinter::node_attribute(tag, value.field(1).unwrap_or(&LabelValue::Null))
        }
        DotPrinter::new(stream_attribute, DotPrinter::edge_attribute)
            .dot_graph(GRAPH_NAME, &self.graph)
    }
}

// =============================================================================
// ANALYZER
// =============================================================================

/// The `curio` pipeline.
#[derive(Debug)]
pub struct CurioAnalyzer {
    streams: Map<String, Value>,
    graph: Option<StreamDependencyGraph>,
    processed: usize,
    skips: SkipCounter,
}

impl CurioAnalyzer {
    /// Take ownership of the document. It must have parsed, be non-empty and
    /// be an object; anything else is `INVALID_ARGUMENT`.
    pub fn initialize(document: JsonDocument) -> Result<Self, LogleError> {
        document.check_usable()?;
        let Value::Object(streams) = document.into_root() else {
            return Err(LogleError::invalid_argument("The document must be an object."));
        };
        debug!(streams = streams.len(), "curio analyzer initialized");
        Ok(Self {
            streams,
            graph: None,
            processed: 0,
            skips: SkipCounter::default(),
        })
    }

    /// Walk every top-level stream and its descendants, siblings in stream id
    /// order.
    pub fn build(&mut self) -> Status {
        if self.graph.is_some() {
            return Err(LogleError::invalid_argument(
                "The dependency graph has already been created.",
            ));
        }
        let mut graph = StreamDependencyGraph::new();
        let streams = std::mem::take(&mut self.streams);
        for (consumer_id, consumer) in by_stream_id(&streams) {
            if consumer_id == CLOCK_STREAM_ID {
                continue;
            }
            match stream_name(consumer) {
                Some(name) => {
                    self.add_dependencies(&mut graph, consumer_id, &name, consumer)?;
                    self.processed = self.processed.saturating_add(1);
                }
                None => self.skips.skip("stream is missing Node.ID.Name or Children")?,
            }
        }
        info!(
            nodes = graph.graph().node_count(),
            edges = graph.graph().edge_count(),
            skipped = self.skips.count(),
            "built stream dependency graph"
        );
        self.graph = Some(graph);
        Ok(())
    }

    /// Add an edge to every well-formed child of `consumer`, then recurse.
    fn add_dependencies(
        &mut self,
        graph: &mut StreamDependencyGraph,
        consumer_id: &str,
        consumer_name: &str,
        consumer: &Value,
    ) -> Status {
        let Some(children) = consumer.get("Children").and_then(Value::as_object) else {
            return Ok(());
        };
        for (producer_id, producer) in by_stream_id(children) {
            if producer_id == CLOCK_STREAM_ID {
                continue;
            }
            let Some(producer_name) = stream_name(producer) else {
                self.skips.skip("stream is missing Node.ID.Name or Children")?;
                continue;
            };
            graph.add_dependency((consumer_id, consumer_name), (producer_id, &producer_name))?;
            self.add_dependencies(graph, producer_id, &producer_name, producer)?;
            self.processed = self.processed.saturating_add(1);
        }
        Ok(())
    }

    /// Empty before `build`.
    #[must_use]
    pub fn render(&self, format: GraphFormat) -> String {
        match (&self.graph, format) {
            (None, _) => String::new(),
            (Some(g), GraphFormat::Dot) => g.to_dot(),
            (Some(g), GraphFormat::PbTxt) => PbtxtExporter::new(g.graph()).to_pbtxt(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.graph.as_ref().map_or(0, |g| g.graph().node_count()),
            edges: self.graph.as_ref().map_or(0, |g| g.graph().edge_count()),
            records_processed: self.processed,
            records_skipped: self.skips.count(),
        }
    }
}

/// Members sorted by key, so node ids do not depend on document order.
fn by_stream_id(streams: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut members: Vec<_> = streams.iter().collect();
    members.sort_by(|a, b| a.0.cmp(b.0));
    members
}

/// The name of a well-formed stream: one with `Node.ID.Name` and `Children`.
fn stream_name(stream: &Value) -> Option<String> {
    let name = stream.get("Node")?.get("ID")?.get("Name")?;
    stream.get("Children")?;
    Some(value_text(name))
}

// =============================================================================
// TESTS
// =============================================================================
