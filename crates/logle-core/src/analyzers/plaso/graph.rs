//! # Event Timeline Graph
//!
//! Events are non-unique `Event(time, description)` nodes. Files, URLs and
//! IP addresses are unique nodes joined to events by unique `Uses` edges: a
//! source points at the event, the event points at a target.
//!
//! Temporal order is encoded as `Precedes` edges, added once after every
//! event is in. Only events at consecutive distinct timestamps are linked,
//! so a range query over time becomes a breadth-first search.

use super::event::{FilePath, PlasoEvent};
use crate::export::{DEFAULT_GRAPH_NAME, DotPrinter, PbtxtExporter, format_timestamp};
use crate::graph::{GraphSchema, Label, LabelValue, LabeledGraph, NodeId};
use crate::primitives::{FILE_TAG, IP_ADDRESS_TAG, PRECEDES_TAG, URL_TAG, USES_TAG};
use crate::{LogleError, Status};
use std::collections::{BTreeMap, BTreeSet};

const EVENT_TAG: &str = "Event";
const TEMPORAL_EDGES_ERR: &str = "Temporal edges can be added at most once. \
     Events cannot be added after they are.";

/// Which side of an event a file or address is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Source,
    Target,
}

/// Events, the files and addresses they touch, and their order in time.
#[derive(Debug, Clone)]
pub struct PlasoEventGraph {
    graph: LabeledGraph,
    time_index: BTreeMap<i64, BTreeSet<NodeId>>,
    show_all_sources: bool,
    has_temporal_edges: bool,
}

impl PlasoEventGraph {
    /// With `show_all_sources`, every event is linked to the file it was
    /// reconstructed from.
    #[must_use]
    pub fn new(show_all_sources: bool) -> Self {
        let schema = GraphSchema::new()
            .node(EVENT_TAG, false)
            .node(FILE_TAG, true)
            .node(IP_ADDRESS_TAG, true)
            .node(URL_TAG, true)
            .edge(PRECEDES_TAG, true)
            .edge(USES_TAG, true);
        Self {
            graph: LabeledGraph::new(schema),
            time_index: BTreeMap::new(),
            show_all_sources,
            has_temporal_edges: false,
        }
    }

    #[must_use]
    pub fn event_label(timestamp: i64, description: &str) -> Label {
        Label::new(
            EVENT_TAG,
            LabelValue::Tuple(vec![
                LabelValue::Timestamp(timestamp),
                LabelValue::str(description),
            ]),
        )
    }

    /// Add one event and the files and URLs it names.
    pub fn process_event(&mut self, event: &PlasoEvent) -> Result<NodeId, LogleError> {
        if self.has_temporal_edges {
            return Err(LogleError::internal(TEMPORAL_EDGES_ERR));
        }
        let id = self
            .graph
            .find_or_add_node(Self::event_label(event.timestamp, &event.description))?;
        self.time_index
            .entry(event.timestamp)
            .or_default()
            .insert(id);

        if self.show_all_sources {
            self.add_file(id, &event.display_file, Role::Source)?;
        }
        if let Some(file) = &event.target_file {
            self.add_file(id, file, Role::Target)?;
        }
        if let Some(url) = &event.source_url {
            self.add_resource(id, URL_TAG, url, Role::Source)?;
        }
        if let Some(url) = &event.target_url {
            self.add_resource(id, URL_TAG, url, Role::Target)?;
        }
        Ok(id)
    }

    fn add_file(&mut self, event: NodeId, file: &FilePath, role: Role) -> Status {
        let file = self
            .graph
            .find_or_add_node(Label::new(FILE_TAG, file.to_label_value()))?;
        self.link(event, file, role)
    }

    fn add_resource(&mut self, event: NodeId, tag: &str, resource: &str, role: Role) -> Status {
        let resource = self
            .graph
            .find_or_add_node(Label::new(tag, LabelValue::str(resource)))?;
        self.link(event, resource, role)
    }

    fn link(&mut self, event: NodeId, other: NodeId, role: Role) -> Status {
        let (source, target) = match role {
            Role::Source => (other, event),
            Role::Target => (event, other),
        };
        self.graph
            .find_or_add_edge(source, target, Label::null(USES_TAG))?;
        Ok(())
    }

    /// Link every event at one timestamp to every event at the next distinct
    /// timestamp. Callable once; no events may be added afterwards.
    pub fn add_temporal_edges(&mut self) -> Status {
        if self.has_temporal_edges {
            return Err(LogleError::internal(TEMPORAL_EDGES_ERR));
        }
        self.has_temporal_edges = true;
        let later = self.time_index.values().skip(1);
        for (current, next) in self.time_index.values().zip(later) {
            for &from in current {
                for &to in next {
                    self.graph
                        .find_or_add_edge(from, to, Label::null(PRECEDES_TAG))?;
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn graph(&self) -> &LabeledGraph {
        &self.graph
    }

    /// Number of distinct timestamps seen.
    #[must_use]
    pub fn timestamp_count(&self) -> usize {
        self.time_index.len()
    }

    /// A vertical timeline of timestamps, earliest on top, with each event
    /// ranked level with its timestamp. Empty when there are no events.
    fn timeline(&self) -> String {
        if self.time_index.is_empty() {
            return String::new();
        }
        let mut timeline = String::from("// Sub-graph showing timeline\n{\n");
        let mut names = Vec::with_capacity(self.time_index.len());
        let mut ranks = String::new();
        for (&time, events) in &self.time_index {
            let name = timeline_node(time);
            timeline.push_str(&format!(
                "  {name} [shape=plaintext, label=\"{}\"];\n",
                format_timestamp(time)
            ));
            let ids: Vec<String> = events.iter().map(ToString::to_string).collect();
            ranks.push_str(&format!("  {{rank=same; {name}; {}}}\n", ids.join("; ")));
            names.push(name);
        }
        timeline.push_str(&format!("  {};\n", names.join(" -> ")));
        timeline.push_str(&ranks);
        timeline.push_str("}  // subgraph for timeline \n");
        timeline
    }

    /// DOT with the timeline sub-graph between nodes and edges.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let printer = DotPrinter::default();
        format!(
            "digraph {DEFAULT_GRAPH_NAME} {{\n{}{}\n{}\n}}",
            printer.all_nodes(&self.graph),
            self.timeline(),
            printer.all_edges(&self.graph)
        )
    }

    #[must_use]
    pub fn to_pbtxt(&self) -> String {
        PbtxtExporter::new(&self.graph).to_pbtxt()
    }
}

/// DOT identifier of a timeline entry. IDs cannot hold `-`, so times before
/// the epoch get an `m` prefix.
fn timeline_node(time: i64) -> String {
    if time < 0 {
        format!("Tm{}", time.unsigned_abs())
    } else {
        format!("T{time}")
    }
}

// =============================================================================
// TESTS
// =============================================================================
