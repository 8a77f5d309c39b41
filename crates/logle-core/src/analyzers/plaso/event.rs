//! Plaso event records and the table that interprets them.
//!
//! A raw event is a JSON object with at least `data_type`, `display_name`,
//! `timestamp` and `timestamp_desc`. The `data_type` selects an entry of a
//! fixed table that says what kind of event it is and which other members
//! carry URLs or files. Descriptive members must be present but are not
//! kept.

use crate::graph::LabelValue;
use crate::json::value_text;
use crate::primitives::{
    PLASO_DATA_TYPE_FIELD, PLASO_DESCRIPTION_FIELD, PLASO_REQUIRED_FIELDS,
    PLASO_SOURCE_FILE_FIELD, PLASO_TIMESTAMP_FIELD,
};
use chrono::DateTime;
use serde_json::Value;
use std::fmt;

// =============================================================================
// FILES
// =============================================================================

/// A path split into directories and an optional file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePath {
    pub directories: Vec<String>,
    pub filename: Option<String>,
}

impl FilePath {
    /// Split on `/`. The last component is the file name unless it is empty,
    /// so a trailing slash names a directory.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let mut parts: Vec<String> = path.split('/').map(str::to_string).collect();
        let last = parts.pop().filter(|name| !name.is_empty());
        Self {
            directories: parts,
            filename: last,
        }
    }

    /// `tuple(list(directory), filename)`, the value of a file node.
    #[must_use]
    pub fn to_label_value(&self) -> LabelValue {
        LabelValue::Tuple(vec![
            LabelValue::List(self.directories.iter().map(LabelValue::str).collect()),
            self.filename
                .as_ref()
                .map_or(LabelValue::Null, LabelValue::str),
        ])
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for dir in &self.directories {
            write!(f, "{dir}/")?;
        }
        if let Some(name) = &self.filename {
            f.write_str(name)?;
        }
        Ok(())
    }
}

// =============================================================================
// EVENT TABLE
// =============================================================================

/// What an event means, independent of the tool that logged it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// A data type with no table entry.
    Default,
    /// Logged, but carries nothing worth graphing.
    Skip,
    PageVisited,
    FileDownloaded,
    BrowserExtensionInstalled,
    ApplicationExecuted,
}

/// Event attributes the table can fill in. `TargetFile` parses the member
/// as a path; the URLs copy it as text. `Descriptive` only requires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    SourceUrl,
    TargetUrl,
    TargetFile,
    Descriptive,
}

/// `(JSON member, event attribute)`
type Action = (&'static str, Target);

/// The table entry for a data type.
fn parse_actions(data_type: &str) -> Option<(EventType, &'static [Action])> {
    use EventType::{
        ApplicationExecuted, BrowserExtensionInstalled, FileDownloaded, PageVisited, Skip,
    };
    use Target::{Descriptive, SourceUrl, TargetFile, TargetUrl};

    let entry: (EventType, &'static [Action]) = match data_type {
        "chrome:cache:entry" => (PageVisited, &[("original_url", SourceUrl)]),
        "chrome:cookie:entry" => (PageVisited, &[("url", SourceUrl)]),
        "chrome:extension_activity:activity_log" => (
            PageVisited,
            &[
                ("page_url", SourceUrl),
                ("extension_id", Descriptive),
            ],
        ),
        "chrome:history:file_downloaded" | "firefox:downloads:download" => (
            FileDownloaded,
            &[("url", SourceUrl), ("full_path", TargetFile)],
        ),
        "chrome:history:page_visited" => (
            PageVisited,
            &[("from_visit", SourceUrl), ("url", TargetUrl)],
        ),
        "chrome:preferences:extension_installation" => (
            BrowserExtensionInstalled,
            &[
                ("extension_name", Descriptive),
                ("extension_id", Descriptive),
            ],
        ),
        "firefox:cache:record"
        | "firefox:cookie:entry"
        | "firefox:places:bookmark"
        | "firefox:places:bookmark_annotation"
        | "firefox:places:bookmark_folder" => (Skip, &[]),
        "firefox:places:page_visited" => (PageVisited, &[("url", SourceUrl)]),
        "macosx:application_usage" | "windows:tasks:job" => (
            ApplicationExecuted,
            &[("application", Descriptive)],
        ),
        "task_scheduler:task_cache:entry" => (
            ApplicationExecuted,
            &[("task_name", Descriptive)],
        ),
        "windows:evt:record" | "windows:evtx:record" => (
            ApplicationExecuted,
            &[
                ("event_identifier", Descriptive),
                ("source_name", TargetFile),
            ],
        ),
        "windows:prefetch:execution" => (
            ApplicationExecuted,
            &[("executable", TargetFile)],
        ),
        "windows:registry:appcompatcache" => {
            (ApplicationExecuted, &[("path", TargetFile)])
        }
        "windows:shell_item:file_entry" => {
            (ApplicationExecuted, &[("name", TargetFile)])
        }
        _ => return None,
    };
    Some(entry)
}

// =============================================================================
// EVENTS
// =============================================================================

/// The fields of one event that the timeline graph uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlasoEvent {
    /// Microseconds since the Unix epoch.
    pub timestamp: i64,
    pub description: String,
    pub event_type: EventType,
    /// The file Plaso reconstructed the event from.
    pub display_file: FilePath,
    pub target_file: Option<FilePath>,
    pub source_url: Option<String>,
    pub target_url: Option<String>,
}

impl PlasoEvent {
    /// Parse an event object. The error names what made it unusable.
    pub fn from_json(event: &Value) -> Result<Self, String> {
        let Some(object) = event.as_object() else {
            return Err("event is not an object".to_string());
        };
        if let Some(missing) = PLASO_REQUIRED_FIELDS
            .iter()
            .find(|field| !object.contains_key(**field))
        {
            return Err(format!("event has no '{missing}' field"));
        }

        let timestamp = parse_timestamp(&object[PLASO_TIMESTAMP_FIELD])
            .ok_or_else(|| format!("unparsable timestamp {}", object[PLASO_TIMESTAMP_FIELD]))?;
        let mut parsed = Self {
            timestamp,
            description: value_text(&object[PLASO_DESCRIPTION_FIELD]),
            event_type: EventType::Default,
            display_file: FilePath::parse(&value_text(&object[PLASO_SOURCE_FILE_FIELD])),
            target_file: None,
            source_url: None,
            target_url: None,
        };

        let data_type = value_text(&object[PLASO_DATA_TYPE_FIELD]);
        let Some((event_type, actions)) = parse_actions(&data_type) else {
            return Ok(parsed);
        };
        parsed.event_type = event_type;
        for &(member, target) in actions {
            let Some(value) = object.get(member) else {
                return Err(format!("{data_type} event has no '{member}' field"));
            };
            let text = value_text(value);
            match target {
                Target::TargetFile => parsed.target_file = Some(FilePath::parse(&text)),
                Target::SourceUrl => parsed.source_url = Some(text),
                Target::TargetUrl => parsed.target_url = Some(text),
                Target::Descriptive => {}
            }
        }
        Ok(parsed)
    }
}

/// Integer microseconds, or an RFC 3339 string.
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.timestamp_micros())
            })
        }
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
