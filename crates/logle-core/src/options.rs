//! # Analysis Options
//!
//! The immutable configuration of one run.
//!
//! An `AnalysisOptions` names the analyzer, at most one input source and up
//! to two output destinations. The single-input rule is enforced by the
//! type: `input` is an `Option<InputSource>`. Deserializing a document that
//! sets more than one of `csv_file`, `json_file` and `json_stream_file`
//! fails.

use crate::LogleError;
use crate::primitives::{
    CURIO_ANALYZER, INVALID_ANALYZER_MESSAGE, MAIL_ANALYZER, PLASO_ANALYZER,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// =============================================================================
// ANALYZER SELECTION
// =============================================================================

/// The analyzers a run can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    /// Stream dependencies from a whole JSON document.
    Curio,
    /// Account accesses from a CSV file.
    Mail,
    /// Event timeline from a JSON document or stream.
    Plaso,
}

impl AnalyzerKind {
    /// Resolve an optional selector. Absent and unknown selectors are both
    /// `INVALID_ARGUMENT`.
    pub fn select(selector: Option<&str>) -> Result<Self, LogleError> {
        selector
            .ok_or_else(|| LogleError::invalid_argument(INVALID_ANALYZER_MESSAGE))?
            .parse()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Curio => CURIO_ANALYZER,
            Self::Mail => MAIL_ANALYZER,
            Self::Plaso => PLASO_ANALYZER,
        }
    }
}

impl FromStr for AnalyzerKind {
    type Err = LogleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CURIO_ANALYZER => Ok(Self::Curio),
            MAIL_ANALYZER => Ok(Self::Mail),
            PLASO_ANALYZER => Ok(Self::Plaso),
            _ => Err(LogleError::invalid_argument(INVALID_ANALYZER_MESSAGE)),
        }
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// INPUT SOURCE
// =============================================================================

/// Where the input of a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A CSV file with a header row.
    Csv(PathBuf),
    /// A whole JSON document, read into memory.
    Json(PathBuf),
    /// Line-delimited JSON values, read incrementally.
    JsonStream(PathBuf),
}

impl InputSource {
    /// The path of the input.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Csv(p) | Self::Json(p) | Self::JsonStream(p) => p,
        }
    }

    /// The configuration field that selects this kind of input.
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::Csv(_) => "csv_file",
            Self::Json(_) => "json_file",
            Self::JsonStream(_) => "json_stream_file",
        }
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Options specific to the timeline analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlasoOptions {
    /// Link every event to the file it was reconstructed from.
    #[serde(default)]
    pub show_all_sources: bool,
}

/// Configuration of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOptions", into = "RawOptions")]
pub struct AnalysisOptions {
    pub analyzer: Option<String>,
    pub input: Option<InputSource>,
    pub plaso_options: Option<PlasoOptions>,
    pub output_dot_file: Option<PathBuf>,
    pub output_pbtxt_file: Option<PathBuf>,
}

impl AnalysisOptions {
    /// Options selecting `analyzer`, with no input or output.
    pub fn for_analyzer(analyzer: impl Into<String>) -> Self {
        Self {
            analyzer: Some(analyzer.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_input(mut self, input: InputSource) -> Self {
        self.input = Some(input);
        self
    }

    #[must_use]
    pub fn with_dot_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dot_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_pbtxt_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_pbtxt_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_show_all_sources(mut self, show_all_sources: bool) -> Self {
        self.plaso_options = Some(PlasoOptions { show_all_sources });
        self
    }

    /// `plaso_options.show_all_sources`, false when unset.
    #[must_use]
    pub fn show_all_sources(&self) -> bool {
        self.plaso_options.is_some_and(|o| o.show_all_sources)
    }

    /// Whether a non-empty DOT destination is set.
    #[must_use]
    pub fn has_dot_output(&self) -> bool {
        non_empty(self.output_dot_file.as_ref()).is_some()
    }

    /// Whether a non-empty pbtxt destination is set.
    #[must_use]
    pub fn has_pbtxt_output(&self) -> bool {
        non_empty(self.output_pbtxt_file.as_ref()).is_some()
    }

    /// Output destinations in persist order: DOT first, then pbtxt.
    /// Empty paths are not destinations.
    pub fn destinations(&self) -> impl Iterator<Item = &PathBuf> {
        [
            non_empty(self.output_dot_file.as_ref()),
            non_empty(self.output_pbtxt_file.as_ref()),
        ]
        .into_iter()
        .flatten()
    }
}

fn non_empty(path: Option<&PathBuf>) -> Option<&PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

// =============================================================================
// WIRE FORM
// =============================================================================

/// Flat form of the options, as written in TOML or JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    analyzer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    csv_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    json_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    json_stream_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plaso_options: Option<PlasoOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_dot_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_pbtxt_file: Option<PathBuf>,
}

impl TryFrom<RawOptions> for AnalysisOptions {
    type Error = LogleError;

    fn try_from(raw: RawOptions) -> Result<Self, Self::Error> {
        let mut inputs = [
            raw.csv_file.map(InputSource::Csv),
            raw.json_file.map(InputSource::Json),
            raw.json_stream_file.map(InputSource::JsonStream),
        ]
        .into_iter()
        .flatten();
        let input = inputs.next();
        if let Some(extra) = inputs.next() {
            return Err(LogleError::invalid_argument(format!(
                "At most one input may be set, found {} and {}",
                input.as_ref().map_or("", InputSource::field_name),
                extra.field_name()
            )));
        }

        Ok(Self {
            analyzer: raw.analyzer,
            input,
            plaso_options: raw.plaso_options,
            output_dot_file: raw.output_dot_file,
            output_pbtxt_file: raw.output_pbtxt_file,
        })
    }
}

impl From<AnalysisOptions> for RawOptions {
    fn from(options: AnalysisOptions) -> Self {
        let mut raw = Self {
            analyzer: options.analyzer,
            plaso_options: options.plaso_options,
            output_dot_file: options.output_dot_file,
            output_pbtxt_file: options.output_pbtxt_file,
            ..Self::default()
        };
        match options.input {
            Some(InputSource::Csv(p)) => raw.csv_file = Some(p),
            Some(InputSource::Json(p)) => raw.json_file = Some(p),
            Some(InputSource::JsonStream(p)) => raw.json_stream_file = Some(p),
            None => {}
        }
        raw
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Code;

    #[test]
    fn select_known_analyzers() {
        assert_eq!(AnalyzerKind::select(Some("curio")), Ok(AnalyzerKind::Curio));
        assert_eq!(AnalyzerKind::select(Some("mail")), Ok(AnalyzerKind::Mail));
        assert_eq!(AnalyzerKind::select(Some("plaso")), Ok(AnalyzerKind::Plaso));
    }

    #[test]
    fn select_rejects_missing_and_unknown() {
        for selector in [None, Some(""), Some("Curio"), Some("unknown")] {
            let err = AnalyzerKind::select(selector).expect_err("invalid selector");
            assert_eq!(err.code(), Code::InvalidArgument);
            assert_eq!(err.message(), INVALID_ANALYZER_MESSAGE);
        }
    }

    #[test]
    fn deserialize_single_input() {
        let json = r#"{"analyzer":"mail","csv_file":"a.csv","output_dot_file":"a.dot"}"#;
        let options: AnalysisOptions = serde_json::from_str(json).expect("parse");
        assert_eq!(options.analyzer.as_deref(), Some("mail"));
        assert_eq!(options.input, Some(InputSource::Csv(PathBuf::from("a.csv"))));
        assert_eq!(options.output_dot_file, Some(PathBuf::from("a.dot")));
        assert!(!options.show_all_sources());
    }

    #[test]
    fn deserialize_rejects_two_inputs() {
        let json = r#"{"analyzer":"plaso","json_file":"a.json","json_stream_file":"a.jsonl"}"#;
        let err = serde_json::from_str::<AnalysisOptions>(json).expect_err("two inputs");
        assert!(err.to_string().contains("json_file"));
        assert!(err.to_string().contains("json_stream_file"));
    }

    #[test]
    fn deserialize_rejects_unknown_fields() {
        let json = r#"{"analyzer":"plaso","xml_file":"a.xml"}"#;
        assert!(serde_json::from_str::<AnalysisOptions>(json).is_err());
    }

    #[test]
    fn nested_plaso_options() {
        let json = r#"{"analyzer":"plaso","plaso_options":{"show_all_sources":true}}"#;
        let options: AnalysisOptions = serde_json::from_str(json).expect("parse");
        assert!(options.show_all_sources());
    }

    #[test]
    fn serialize_restores_flat_fields() {
        let options = AnalysisOptions::for_analyzer("plaso")
            .with_input(InputSource::JsonStream(PathBuf::from("e.jsonl")))
            .with_pbtxt_output("e.pbtxt");
        let value = serde_json::to_value(&options).expect("serialize");
        assert_eq!(value["json_stream_file"], "e.jsonl");
        assert_eq!(value["output_pbtxt_file"], "e.pbtxt");
        assert!(value.get("csv_file").is_none());

        let back: AnalysisOptions = serde_json::from_value(value).expect("parse");
        assert_eq!(back, options);
    }

    #[test]
    fn destinations_skip_empty_paths() {
        let options = AnalysisOptions::for_analyzer("mail")
            .with_dot_output("")
            .with_pbtxt_output("out.pbtxt");
        let dests: Vec<&PathBuf> = options.destinations().collect();
        assert_eq!(dests, vec![&PathBuf::from("out.pbtxt")]);
        assert!(!options.has_dot_output());
        assert!(options.has_pbtxt_output());
    }
}
