//! # JSON Readers
//!
//! Two ways of reading JSON input:
//!
//! - [`JsonDocument`]: a whole document parsed eagerly. `//` and `/* */`
//!   comments outside string literals are allowed. A document that fails to
//!   parse is still constructed: it records the parse error and carries a
//!   `Null` root, and the consuming analyzer decides what to do with it.
//! - [`JsonStream`]: one JSON value per line, read incrementally from an
//!   owned reader.
//!
//! [`JsonEvents`] iterates the values of either source uniformly.

use crate::LogleError;
use serde_json::Value;
use std::io::{BufRead, BufReader, Read};

// =============================================================================
// COMMENTS
// =============================================================================

/// Replace `//` and `/* */` comments outside strings with spaces.
///
/// Newlines are kept so parse errors report the original line numbers.
#[must_use]
pub fn strip_comments(text: &str) -> String {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum State {
        Code,
        Str,
        StrEscape,
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(text.len());
    let mut state = State::Code;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        state = match (state, c) {
            (State::Code, '"') => {
                out.push(c);
                State::Str
            }
            (State::Code, '/') if chars.peek() == Some(&'/') => {
                chars.next();
                out.push_str("  ");
                State::LineComment
            }
            (State::Code, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str("  ");
                State::BlockComment
            }
            (State::Str, '\\') => {
                out.push(c);
                State::StrEscape
            }
            (State::Str, '"') => {
                out.push(c);
                State::Code
            }
            (State::StrEscape, _) => {
                out.push(c);
                State::Str
            }
            (State::LineComment, '\n') => {
                out.push(c);
                State::Code
            }
            (State::BlockComment, '*') if chars.peek() == Some(&'/') => {
                chars.next();
                out.push_str("  ");
                State::Code
            }
            (State::LineComment | State::BlockComment, _) => {
                out.push(if c == '\n' { '\n' } else { ' ' });
                state
            }
            (State::Code | State::Str, _) => {
                out.push(c);
                state
            }
        };
    }
    out
}

/// A scalar as text: strings unquoted, `null` empty, anything else as JSON.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// =============================================================================
// WHOLE DOCUMENT
// =============================================================================

/// A JSON document held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    root: Value,
    parse_error: Option<String>,
}

impl JsonDocument {
    /// Parse `text`, tolerating comments.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str(&strip_comments(text)) {
            Ok(root) => Self {
                root,
                parse_error: None,
            },
            Err(e) => Self {
                root: Value::Null,
                parse_error: Some(e.to_string()),
            },
        }
    }

    /// Read all of `reader` and parse it. Only a read failure is an error.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, LogleError> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| LogleError::internal(format!("Error reading JSON document: {e}")))?;
        Ok(Self::parse(&text))
    }

    /// The parsed root, `Null` when parsing failed.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Consume the document, returning its root.
    #[must_use]
    pub fn into_root(self) -> Value {
        self.root
    }

    /// The parse error, if the text was not valid JSON.
    #[must_use]
    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    /// Whether the root is empty: `null`, or an empty object, array or string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.root {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(s) => s.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }

    /// Reject a document that failed to parse or is empty.
    pub fn check_usable(&self) -> Result<(), LogleError> {
        if let Some(err) = &self.parse_error {
            return Err(LogleError::invalid_argument(format!(
                "The input is not valid JSON: {err}"
            )));
        }
        if self.is_empty() {
            return Err(LogleError::invalid_argument(
                "The input document must not be empty.",
            ));
        }
        Ok(())
    }

    /// Values of the top-level object in document order, or the elements of
    /// a top-level array. Any other root yields nothing.
    #[must_use]
    pub fn into_events(self) -> JsonEvents {
        let values: Vec<Value> = match self.root {
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        JsonEvents::Document(values.into_iter())
    }
}

// =============================================================================
// LINE STREAM
// =============================================================================

/// Line-delimited JSON read from an owned reader.
///
/// Blank lines are skipped. A malformed or non-UTF-8 line yields an
/// `INVALID_ARGUMENT` item naming the line and iteration continues; a read failure yields an
/// `INTERNAL` item and ends iteration.
pub struct JsonStream {
    reader: BufReader<Box<dyn Read + Send>>,
    line: usize,
    done: bool,
}

impl std::fmt::Debug for JsonStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStream")
            .field("line", &self.line)
            .field("done", &self.done)
            .finish()
    }
}

impl JsonStream {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: BufReader::new(Box::new(reader)),
            line: 0,
            done: false,
        }
    }
}

impl Iterator for JsonStream {
    type Item = Result<Value, LogleError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        while !self.done {
            buf.clear();
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line = self.line.saturating_add(1);
                    let text = match std::str::from_utf8(&buf) {
                        Ok(text) => text.trim(),
                        Err(e) => {
                            return Some(Err(LogleError::invalid_argument(format!(
                                "Malformed JSON on line {}: {e}",
                                self.line
                            ))));
                        }
                    };
                    if text.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(text).map_err(|e| {
                        LogleError::invalid_argument(format!(
                            "Malformed JSON on line {}: {e}",
                            self.line
                        ))
                    }));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(LogleError::internal(format!(
                        "Error reading line {}: {e}",
                        self.line.saturating_add(1)
                    ))));
                }
            }
        }
        None
    }
}

// =============================================================================
// UNIFIED EVENTS
// =============================================================================

/// The event values of a document or a stream.
#[derive(Debug)]
pub enum JsonEvents {
    Document(std::vec::IntoIter<Value>),
    Stream(JsonStream),
}

impl From<JsonDocument> for JsonEvents {
    fn from(document: JsonDocument) -> Self {
        document.into_events()
    }
}

impl From<JsonStream> for JsonEvents {
    fn from(stream: JsonStream) -> Self {
        Self::Stream(stream)
    }
}

impl Iterator for JsonEvents {
    type Item = Result<Value, LogleError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Document(values) => values.next().map(Ok),
            Self::Stream(stream) => stream.next(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
