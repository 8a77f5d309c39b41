//! # Event Timeline Analyzer
//!
//! Reads Plaso events from a whole JSON document (an object whose values
//! are events, or an array of events) or from a line-delimited stream, and
//! builds a [`graph::PlasoEventGraph`].

pub mod event;
pub mod graph;

use self::event::{EventType, PlasoEvent};
use self::graph::PlasoEventGraph;
use super::{GraphFormat, GraphStats, SkipCounter};
use crate::json::{JsonDocument, JsonEvents, JsonStream};
use crate::{Code, LogleError, Status};
use serde_json::Value;
use tracing::{debug, info};

/// The `plaso` pipeline.
#[derive(Debug)]
pub struct PlasoAnalyzer {
    events: JsonEvents,
    show_all_sources: bool,
    graph: Option<PlasoEventGraph>,
    processed: usize,
    skips: SkipCounter,
}

impl PlasoAnalyzer {
    /// Events from a parsed document. The document must have parsed, be
    /// non-empty and be an object or an array.
    pub fn initialize_document(
        document: JsonDocument,
        show_all_sources: bool,
    ) -> Result<Self, LogleError> {
        document.check_usable()?;
        if !matches!(document.root(), Value::Object(_) | Value::Array(_)) {
            return Err(LogleError::invalid_argument(
                "The document must be an object or an array of events.",
            ));
        }
        debug!(show_all_sources, "plaso analyzer initialized from document");
        Ok(Self::with_events(document.into(), show_all_sources))
    }

    /// Events read line by line from `stream`.
    #[must_use]
    pub fn initialize_stream(stream: JsonStream, show_all_sources: bool) -> Self {
        debug!(show_all_sources, "plaso analyzer initialized from stream");
        Self::with_events(stream.into(), show_all_sources)
    }

    fn with_events(events: JsonEvents, show_all_sources: bool) -> Self {
        Self {
            events,
            show_all_sources,
            graph: None,
            processed: 0,
            skips: SkipCounter::default(),
        }
    }

    /// Consume every event, then add the temporal edges.
    pub fn build(&mut self) -> Status {
        if self.graph.is_some() {
            return Err(LogleError::invalid_argument(
                "The event graph has already been created.",
            ));
        }
        let mut graph = PlasoEventGraph::new(self.show_all_sources);
        for item in self.events.by_ref() {
            let value = match item {
                Ok(value) => value,
                Err(e) if e.code() == Code::InvalidArgument => {
                    self.skips.skip(e.message())?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let event = match PlasoEvent::from_json(&value) {
                Ok(event) => event,
                Err(reason) => {
                    self.skips.skip(&reason)?;
                    continue;
                }
            };
            self.processed = self.processed.saturating_add(1);
            if event.event_type != EventType::Skip {
                graph.process_event(&event)?;
            }
        }
        graph.add_temporal_edges()?;
        info!(
            nodes = graph.graph().node_count(),
            edges = graph.graph().edge_count(),
            timestamps = graph.timestamp_count(),
            skipped = self.skips.count(),
            "built event timeline graph"
        );
        self.graph = Some(graph);
        Ok(())
    }

    /// Empty before `build`.
    #[must_use]
    pub fn render(&self, format: GraphFormat) -> String {
        match (&self.graph, format) {
            (None, _) => String::new(),
            (Some(g), GraphFormat::Dot) => g.to_dot(),
            (Some(g), GraphFormat::PbTxt) => g.to_pbtxt(),
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

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EVENTS: &str = r#"
{"data_type": "fs:stat", "display_name": "/etc/passwd", "timestamp": 1, "timestamp_desc": "Modified"}

{"data_type": "chrome:history:file_downloaded", "display_name": "/h/History", "timestamp": 2, "timestamp_desc": "Downloaded", "url": "http://x/a.zip", "full_path": "/tmp/a.zip"}
not json
{"data_type": "firefox:cookie:entry", "display_name": "/h/cookies", "timestamp": 3, "timestamp_desc": "Cookie"}
{"display_name": "/h/x", "timestamp": 4}
"#;

    fn stream_analyzer(show_all_sources: bool) -> PlasoAnalyzer {
        PlasoAnalyzer::initialize_stream(
            JsonStream::new(Cursor::new(EVENTS.to_string())),
            show_all_sources,
        )
    }

    #[test]
    fn stream_skips_malformed_events() {
        let mut a = stream_analyzer(false);
        a.build().expect("build");
        let stats = a.stats();
        assert_eq!(stats.records_processed, 3);
        assert_eq!(stats.records_skipped, 2);
        // two events, a URL and a file; the cookie event adds nothing
        assert_eq!(stats.nodes, 4);
        // url->event, event->file, event->event
        assert_eq!(stats.edges, 3);
    }

    #[test]
    fn show_all_sources_adds_display_files() {
        let mut a = stream_analyzer(true);
        a.build().expect("build");
        assert_eq!(a.stats().nodes, 6);
    }

    #[test]
    fn document_initialization() {
        for text in ["", "{}", "\"events\"", "{ broken"] {
            let err = PlasoAnalyzer::initialize_document(JsonDocument::parse(text), false)
                .expect_err("bad document");
            assert_eq!(err.code(), Code::InvalidArgument, "{text}");
        }
        let doc = JsonDocument::parse(
            r#"{"e1": {"data_type": "x", "display_name": "f", "timestamp": "1970-01-01T00:00:00Z", "timestamp_desc": "d"}}"#,
        );
        let mut a = PlasoAnalyzer::initialize_document(doc, false).expect("initialize");
        a.build().expect("build");
        assert_eq!(a.stats().nodes, 1);
    }

    #[test]
    fn render_follows_format() {
        let mut a = stream_analyzer(false);
        assert_eq!(a.render(GraphFormat::Dot), "");
        a.build().expect("build");
        assert!(a.render(GraphFormat::Dot).starts_with("digraph logle_graph {"));
        assert!(a.render(GraphFormat::PbTxt).starts_with("node {\n"));
        assert_eq!(Code::of(&a.build()), Code::InvalidArgument);
    }
}
