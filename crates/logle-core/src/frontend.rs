//! # Frontend
//!
//! The dispatcher. One call to [`Frontend::run`] takes a configuration
//! through four phases:
//!
//! ```text
//! ValidateConfig -> SelectAndRun -> RenderCheck -> Persist
//! ```
//!
//! 1. **ValidateConfig**: the analyzer must be known and the input must be
//!    one it reads. Nothing is opened until this passes.
//! 2. **SelectAndRun**: the [`PipelineFactory`] acquires the input and
//!    initializes the analyzer, then its graph is built. The first error is
//!    returned.
//! 3. **RenderCheck**: an empty render is a successful run with no output.
//! 4. **Persist**: write the render to every destination, DOT path first.
//!    Every destination is attempted and the first failure is returned.

use crate::LogleError;
use crate::analyzers::access::AccessAnalyzer;
use crate::analyzers::curio::CurioAnalyzer;
use crate::analyzers::plaso::PlasoAnalyzer;
use crate::analyzers::{AnalysisPipeline, GraphFormat, GraphStats, Pipeline};
use crate::input::{FsInputAcquirer, InputAcquirer};
use crate::options::{AnalysisOptions, AnalyzerKind, InputSource};
use crate::output::{FsOutputWriter, OutputWriter};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub analyzer: AnalyzerKind,
    /// `None` when the analyzer had nothing to render for this configuration.
    pub format: Option<GraphFormat>,
    pub stats: GraphStats,
    /// Destinations written, in write order. Empty when the render was empty.
    pub written: Vec<PathBuf>,
}

// =============================================================================
// PIPELINE CONSTRUCTION
// =============================================================================

/// Turns a validated configuration into an initialized pipeline.
pub trait PipelineFactory: Send + Sync {
    type Pipeline: AnalysisPipeline;

    /// Acquire `input` through `acquirer` and initialize `analyzer` on it.
    fn create<A: InputAcquirer>(
        &self,
        acquirer: &A,
        analyzer: AnalyzerKind,
        input: &InputSource,
        options: &AnalysisOptions,
    ) -> Result<Self::Pipeline, LogleError>;
}

/// Builds the analyzers this crate ships.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzerFactory;

impl PipelineFactory for AnalyzerFactory {
    type Pipeline = Pipeline;

    fn create<A: InputAcquirer>(
        &self,
        acquirer: &A,
        analyzer: AnalyzerKind,
        input: &InputSource,
        options: &AnalysisOptions,
    ) -> Result<Pipeline, LogleError> {
        let show_all_sources = options.show_all_sources();
        let pipeline = match (analyzer, input) {
            (AnalyzerKind::Curio, InputSource::Json(path)) => {
                Pipeline::Curio(CurioAnalyzer::initialize(acquirer.open_json_document(path)?)?)
            }
            (AnalyzerKind::Mail, InputSource::Csv(path)) => {
                Pipeline::Access(AccessAnalyzer::initialize(acquirer.open_csv(path)?)?)
            }
            (AnalyzerKind::Plaso, InputSource::Json(path)) => {
                Pipeline::Plaso(PlasoAnalyzer::initialize_document(
                    acquirer.open_json_document(path)?,
                    show_all_sources,
                )?)
            }
            (AnalyzerKind::Plaso, InputSource::JsonStream(path)) => {
                Pipeline::Plaso(PlasoAnalyzer::initialize_stream(
                    acquirer.open_json_stream(path)?,
                    show_all_sources,
                ))
            }
            (analyzer, input) => return Err(input_mismatch(analyzer, Some(input))),
        };
        Ok(pipeline)
    }
}

// =============================================================================
// FRONTEND
// =============================================================================

/// Runs analyses with injected input, output and pipeline collaborators.
///
/// `Send + Sync` whenever its collaborators are, so independent
/// configurations may run on separate threads against one frontend.
#[derive(Debug, Clone, Default)]
pub struct Frontend<A = FsInputAcquirer, W = FsOutputWriter, F = AnalyzerFactory> {
    acquirer: A,
    writer: W,
    factory: F,
}

impl<A: InputAcquirer, W: OutputWriter> Frontend<A, W> {
    pub fn new(acquirer: A, writer: W) -> Self {
        Self::with_factory(acquirer, writer, AnalyzerFactory)
    }
}

impl<A: InputAcquirer, W: OutputWriter, F: PipelineFactory> Frontend<A, W, F> {
    pub fn with_factory(acquirer: A, writer: W, factory: F) -> Self {
        Self {
            acquirer,
            writer,
            factory,
        }
    }

    #[must_use]
    pub fn acquirer(&self) -> &A {
        &self.acquirer
    }

    #[must_use]
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Run one analysis end to end.
    pub fn run(&self, options: &AnalysisOptions) -> Result<RunReport, LogleError> {
        let (analyzer, input) = validate(options)?;
        debug!(%analyzer, input = %input.path().display(), "configuration valid");

        let mut pipeline = self
            .factory
            .create(&self.acquirer, analyzer, input, options)?;
        pipeline.build()?;
        let stats = pipeline.stats();
        debug!(%analyzer, nodes = stats.nodes, edges = stats.edges, "graph built");

        let format = pipeline.output_format(options);
        let text = format.map(|f| pipeline.render(f)).unwrap_or_default();
        let mut report = RunReport {
            analyzer,
            format,
            stats,
            written: Vec::new(),
        };
        if text.is_empty() {
            info!(%analyzer, "nothing to write");
            return Ok(report);
        }

        report.written = self.persist(options, &text)?;
        info!(%analyzer, files = report.written.len(), "analysis complete");
        Ok(report)
    }

    /// Write `text` to every destination. Returns the paths written, or the
    /// first failure once every destination has been attempted.
    fn persist(&self, options: &AnalysisOptions, text: &str) -> Result<Vec<PathBuf>, LogleError> {
        let mut written = Vec::new();
        let mut first_error = None;
        for path in options.destinations() {
            match self.writer.write(path, text) {
                Ok(()) => written.push(path.clone()),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "persist failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }
}

/// Run `options` with the filesystem frontend.
pub fn run(options: &AnalysisOptions) -> Result<RunReport, LogleError> {
    Frontend::<FsInputAcquirer, FsOutputWriter>::default().run(options)
}

/// Check a configuration without touching any input or output.
///
/// Returns the selected analyzer and its input.
pub fn validate(options: &AnalysisOptions) -> Result<(AnalyzerKind, &InputSource), LogleError> {
    let analyzer = AnalyzerKind::select(options.analyzer.as_deref())?;
    let input = options.input.as_ref();
    let accepted = match (analyzer, input) {
        (AnalyzerKind::Curio, Some(InputSource::Json(_)))
        | (AnalyzerKind::Mail, Some(InputSource::Csv(_)))
        | (AnalyzerKind::Plaso, Some(InputSource::Json(_) | InputSource::JsonStream(_))) => input,
        _ => None,
    };
    accepted
        .map(|input| (analyzer, input))
        .ok_or_else(|| input_mismatch(analyzer, input))
}

fn input_mismatch(analyzer: AnalyzerKind, found: Option<&InputSource>) -> LogleError {
    let required = match analyzer {
        AnalyzerKind::Curio => "json_file",
        AnalyzerKind::Mail => "csv_file",
        AnalyzerKind::Plaso => "json_file or json_stream_file",
    };
    let found = found.map_or("no input", InputSource::field_name);
    LogleError::invalid_argument(format!(
        "The {analyzer} analysis requires {required}, found {found}."
    ))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::CsvParser;
    use crate::json::{JsonDocument, JsonStream};
    use crate::{Code, Status};
    use std::collections::BTreeMap;
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Mutex;

    /// Serves inputs from memory by path.
    #[derive(Default)]
    struct MemoryAcquirer {
        files: BTreeMap<PathBuf, String>,
    }

    impl MemoryAcquirer {
        fn with(mut self, path: &str, text: &str) -> Self {
            self.files.insert(PathBuf::from(path), text.to_string());
            self
        }

        fn text(&self, path: &Path) -> Result<String, LogleError> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| LogleError::open_failed(path))
        }
    }

    impl InputAcquirer for MemoryAcquirer {
        fn open_csv(&self, path: &Path) -> Result<CsvParser, LogleError> {
            Ok(CsvParser::new(Cursor::new(self.text(path)?)))
        }

        fn open_json_document(&self, path: &Path) -> Result<JsonDocument, LogleError> {
            Ok(JsonDocument::parse(&self.text(path)?))
        }

        fn open_json_stream(&self, path: &Path) -> Result<JsonStream, LogleError> {
            Ok(JsonStream::new(Cursor::new(self.text(path)?)))
        }
    }

    /// Records writes; paths listed in `fail` are rejected.
    #[derive(Default)]
    struct MemoryWriter {
        written: Mutex<Vec<(PathBuf, String)>>,
        fail: Vec<PathBuf>,
    }

    impl OutputWriter for MemoryWriter {
        fn write(&self, path: &Path, text: &str) -> Result<(), LogleError> {
            if self.fail.iter().any(|p| p == path) {
                return Err(LogleError::open_failed(path));
            }
            self.written
                .lock()
                .expect("lock")
                .push((path.to_path_buf(), text.to_string()));
            Ok(())
        }
    }

    const ACCESS_CSV: &str = "fromx,tox,attr_count,attr_actor_title\n\
                              alice,bob,3,engineer\n";

    fn frontend(writer: MemoryWriter) -> Frontend<MemoryAcquirer, MemoryWriter> {
        Frontend::new(MemoryAcquirer::default().with("a.csv", ACCESS_CSV), writer)
    }

    #[test]
    fn validate_requires_matching_input() {
        let mail = AnalysisOptions::for_analyzer("mail");
        let err = validate(&mail).expect_err("no input");
        assert_eq!(err.code(), Code::InvalidArgument);
        assert!(err.message().contains("csv_file"));

        let curio = AnalysisOptions::for_analyzer("curio")
            .with_input(InputSource::Csv(PathBuf::from("a.csv")));
        let err = validate(&curio).expect_err("wrong input");
        assert!(err.message().contains("json_file"));

        let plaso = AnalysisOptions::for_analyzer("plaso")
            .with_input(InputSource::JsonStream(PathBuf::from("e.jsonl")));
        assert_eq!(validate(&plaso).map(|(a, _)| a), Ok(AnalyzerKind::Plaso));
    }

    #[test]
    fn writes_every_destination_in_order() {
        let f = frontend(MemoryWriter::default());
        let options = AnalysisOptions::for_analyzer("mail")
            .with_input(InputSource::Csv(PathBuf::from("a.csv")))
            .with_dot_output("a.dot")
            .with_pbtxt_output("a.pbtxt");
        let report = f.run(&options).expect("run");
        assert_eq!(report.format, Some(GraphFormat::Dot));
        assert_eq!(
            report.written,
            vec![PathBuf::from("a.dot"), PathBuf::from("a.pbtxt")]
        );
        let written = f.writer().written.lock().expect("lock");
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].1, written[1].1);
    }

    #[test]
    fn later_success_does_not_mask_failure() {
        let f = frontend(MemoryWriter {
            fail: vec![PathBuf::from("a.dot")],
            ..MemoryWriter::default()
        });
        let options = AnalysisOptions::for_analyzer("mail")
            .with_input(InputSource::Csv(PathBuf::from("a.csv")))
            .with_dot_output("a.dot")
            .with_pbtxt_output("a.pbtxt");
        let err = f.run(&options).expect_err("dot write fails");
        assert_eq!(err.code(), Code::External);
        assert!(err.message().contains("a.dot"));
        // the pbtxt destination was still attempted
        assert_eq!(f.writer().written.lock().expect("lock").len(), 1);
    }

    #[test]
    fn initialize_failure_skips_build_and_persist() {
        let f = Frontend::new(
            MemoryAcquirer::default().with("empty.csv", ""),
            MemoryWriter::default(),
        );
        let options = AnalysisOptions::for_analyzer("mail")
            .with_input(InputSource::Csv(PathBuf::from("empty.csv")))
            .with_dot_output("out.dot");
        let err = f.run(&options).expect_err("empty input");
        assert_eq!(err.code(), Code::InvalidArgument);
        assert!(f.writer().written.lock().expect("lock").is_empty());
    }

    #[test]
    fn plaso_without_destination_renders_nothing() {
        let f = Frontend::new(
            MemoryAcquirer::default().with(
                "e.jsonl",
                r#"{"data_type":"x","display_name":"f","timestamp":1,"timestamp_desc":"d"}"#,
            ),
            MemoryWriter::default(),
        );
        let options = AnalysisOptions::for_analyzer("plaso")
            .with_input(InputSource::JsonStream(PathBuf::from("e.jsonl")));
        let report = f.run(&options).expect("run");
        assert_eq!(report.format, None);
        assert!(report.written.is_empty());
        assert_eq!(report.stats.nodes, 1);
    }

    /// Opens its input like a real analyzer, then has nothing to render.
    struct SilentPipeline;

    impl AnalysisPipeline for SilentPipeline {
        fn build(&mut self) -> Status {
            Ok(())
        }

        fn output_format(&self, _: &AnalysisOptions) -> Option<GraphFormat> {
            Some(GraphFormat::Dot)
        }

        fn render(&self, _: GraphFormat) -> String {
            String::new()
        }

        fn stats(&self) -> GraphStats {
            GraphStats::default()
        }
    }

    struct SilentFactory;

    impl PipelineFactory for SilentFactory {
        type Pipeline = SilentPipeline;

        fn create<A: InputAcquirer>(
            &self,
            acquirer: &A,
            _: AnalyzerKind,
            input: &InputSource,
            _: &AnalysisOptions,
        ) -> Result<SilentPipeline, LogleError> {
            acquirer.open_csv(input.path())?;
            Ok(SilentPipeline)
        }
    }

    #[test]
    fn empty_render_skips_every_destination() {
        let f = Frontend::with_factory(
            MemoryAcquirer::default().with("a.csv", ACCESS_CSV),
            MemoryWriter::default(),
            SilentFactory,
        );
        let options = AnalysisOptions::for_analyzer("mail")
            .with_input(InputSource::Csv(PathBuf::from("a.csv")))
            .with_dot_output("a.dot")
            .with_pbtxt_output("a.pbtxt");
        let report = f.run(&options).expect("run");
        assert_eq!(report.format, Some(GraphFormat::Dot));
        assert!(report.written.is_empty());
        assert!(f.writer().written.lock().expect("lock").is_empty());
    }

    #[test]
    fn factory_errors_stop_the_run() {
        let f = Frontend::with_factory(
            MemoryAcquirer::default(),
            MemoryWriter::default(),
            SilentFactory,
        );
        let options = AnalysisOptions::for_analyzer("mail")
            .with_input(InputSource::Csv(PathBuf::from("absent.csv")))
            .with_dot_output("a.dot");
        let err = f.run(&options).expect_err("missing input");
        assert_eq!(err.code(), Code::External);
        assert!(f.writer().written.lock().expect("lock").is_empty());
    }

    #[test]
    fn frontend_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Frontend>();
        assert_send_sync::<Frontend<MemoryAcquirer, MemoryWriter>>();
    }
}
