//! # Property-Based Tests
//!
//! Configuration validation and determinism invariants, checked with
//! proptest.

use logle_core::analyzers::access::AccessAnalyzer;
use logle_core::{
    AnalysisOptions, Code, CsvParser, Frontend, GraphFormat, GraphSchema, InputAcquirer,
    InputSource, JsonDocument, JsonStream, Label, LabelValue, LabeledGraph, LogleError,
    OutputWriter,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// I/O SPIES
// =============================================================================

/// Fails every open, counting attempts.
#[derive(Default)]
struct SpyAcquirer {
    opens: AtomicUsize,
}

impl SpyAcquirer {
    fn refuse(&self, path: &Path) -> LogleError {
        self.opens.fetch_add(1, Ordering::SeqCst);
        LogleError::open_failed(path)
    }
}

impl InputAcquirer for SpyAcquirer {
    fn open_csv(&self, path: &Path) -> Result<CsvParser, LogleError> {
        Err(self.refuse(path))
    }

    fn open_json_document(&self, path: &Path) -> Result<JsonDocument, LogleError> {
        Err(self.refuse(path))
    }

    fn open_json_stream(&self, path: &Path) -> Result<JsonStream, LogleError> {
        Err(self.refuse(path))
    }
}

/// Counts writes.
#[derive(Default)]
struct SpyWriter {
    writes: AtomicUsize,
}

impl OutputWriter for SpyWriter {
    fn write(&self, _path: &Path, _text: &str) -> Result<(), LogleError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn any_input() -> impl Strategy<Value = Option<InputSource>> {
    prop_oneof![
        Just(None),
        "[a-z]{1,8}\\.csv".prop_map(|p| Some(InputSource::Csv(PathBuf::from(p)))),
        "[a-z]{1,8}\\.json".prop_map(|p| Some(InputSource::Json(PathBuf::from(p)))),
        "[a-z]{1,8}\\.jsonl".prop_map(|p| Some(InputSource::JsonStream(PathBuf::from(p)))),
    ]
}

fn unknown_analyzer() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        "[A-Za-z_]{0,10}"
            .prop_filter("known analyzer", |s| !matches!(s.as_str(), "curio" | "mail" | "plaso"))
            .prop_map(Some),
    ]
}

fn access_csv(rows: &[(u8, u8, i64)]) -> String {
    let mut csv = String::from("fromx,tox,attr_count,attr_actor_title\n");
    for (actor, user, count) in rows {
        csv.push_str(&format!("a{actor},u{user},{count},title\n"));
    }
    csv
}

fn render_access(csv: String) -> String {
    let mut analyzer =
        AccessAnalyzer::initialize(CsvParser::new(Cursor::new(csv))).expect("initialize");
    analyzer.build().expect("build");
    analyzer.render(GraphFormat::Dot)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A missing or unknown analyzer is rejected before any I/O.
    #[test]
    fn unknown_analyzer_is_rejected_without_io(
        analyzer in unknown_analyzer(),
        input in any_input(),
        dot in proptest::option::of("[a-z]{1,8}\\.dot"),
    ) {
        let frontend = Frontend::new(SpyAcquirer::default(), SpyWriter::default());
        let options = AnalysisOptions {
            analyzer,
            input,
            output_dot_file: dot.map(PathBuf::from),
            ..AnalysisOptions::default()
        };
        let result = frontend.run(&options);
        prop_assert_eq!(Code::of(&result), Code::InvalidArgument);
        prop_assert_eq!(frontend.acquirer().opens.load(Ordering::SeqCst), 0);
        prop_assert_eq!(frontend.writer().writes.load(Ordering::SeqCst), 0);
    }

    /// A known analyzer with an input it cannot read is rejected before any
    /// I/O; with a readable input the open is attempted.
    #[test]
    fn input_mismatch_is_rejected_without_io(
        analyzer in prop_oneof![Just("curio"), Just("mail"), Just("plaso")],
        input in any_input(),
    ) {
        let frontend = Frontend::new(SpyAcquirer::default(), SpyWriter::default());
        let accepted = matches!(
            (analyzer, &input),
            ("curio", Some(InputSource::Json(_)))
                | ("mail", Some(InputSource::Csv(_)))
                | ("plaso", Some(InputSource::Json(_) | InputSource::JsonStream(_)))
        );
        let options = AnalysisOptions {
            input,
            ..AnalysisOptions::for_analyzer(analyzer)
        };
        let result = frontend.run(&options);
        let opens = frontend.acquirer().opens.load(Ordering::SeqCst);
        if accepted {
            prop_assert_eq!(Code::of(&result), Code::External);
            prop_assert_eq!(opens, 1);
        } else {
            prop_assert_eq!(Code::of(&result), Code::InvalidArgument);
            prop_assert_eq!(opens, 0);
        }
    }

    /// The same rows always render the same DOT.
    #[test]
    fn access_render_is_deterministic(
        rows in vec((0u8..5, 0u8..5, -3i64..100), 1..30)
    ) {
        let csv = access_csv(&rows);
        prop_assert_eq!(render_access(csv.clone()), render_access(csv));
    }

    /// Adding a unique label again returns the existing node.
    #[test]
    fn unique_labels_are_deduplicated(values in vec(0i64..20, 1..50)) {
        let mut graph = LabeledGraph::new(GraphSchema::new().node("N", true));
        for &v in &values {
            graph.find_or_add_node(Label::new("N", LabelValue::Int(v))).expect("add");
        }
        let distinct: std::collections::BTreeSet<i64> = values.iter().copied().collect();
        prop_assert_eq!(graph.node_count(), distinct.len());
    }

    /// Non-unique labels always get a fresh node.
    #[test]
    fn non_unique_labels_are_never_merged(values in vec(0i64..20, 1..50)) {
        let mut graph = LabeledGraph::new(GraphSchema::new().node("N", false));
        for &v in &values {
            graph.find_or_add_node(Label::new("N", LabelValue::Int(v))).expect("add");
        }
        prop_assert_eq!(graph.node_count(), values.len());
    }
}
