//! # CSV Tokenizer
//!
//! Splits line-oriented delimited text into records.
//!
//! One line is one record. Inside a `"`-quoted section the delimiter is
//! literal. A backslash escapes `\`, `"` or `n` (newline); any other escape
//! turns that line into an `INVALID_ARGUMENT` item, as does a line that is not
//! UTF-8. A read failure yields an `INTERNAL` item and ends iteration.

use crate::LogleError;
use std::io::{BufRead, BufReader, Read};

/// The fields of one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based line number.
    pub line: usize,
    pub fields: Vec<String>,
}

/// Iterates the records of an owned reader.
///
/// The parser owns its reader; dropping the parser closes the input.
pub struct CsvParser {
    reader: BufReader<Box<dyn Read + Send>>,
    line: usize,
    done: bool,
}

impl std::fmt::Debug for CsvParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvParser")
            .field("line", &self.line)
            .field("done", &self.done)
            .finish()
    }
}

impl CsvParser {
    /// A comma-delimited parser over `reader`.
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: BufReader::new(Box::new(reader)),
            line: 0,
            done: false,
        }
    }
}

impl Iterator for CsvParser {
    type Item = Result<Record, LogleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line = self.line.saturating_add(1);
                let line = self.line;
                let fields = String::from_utf8(buf)
                    .map_err(|e| e.utf8_error().to_string())
                    .and_then(|text| tokenize(text.trim_end_matches(['\n', '\r'])));
                Some(
                    fields
                        .map(|fields| Record { line, fields })
                        .map_err(|e| {
                            LogleError::invalid_argument(format!(
                                "Error tokenizing line {line}: {e}"
                            ))
                        }),
                )
            }
            Err(e) => {
                self.done = true;
                Some(Err(LogleError::internal(format!(
                    "Error reading line {}: {e}",
                    self.line.saturating_add(1)
                ))))
            }
        }
    }
}

const DELIMITER: char = ',';

/// Split one line into fields.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\\') => field.push('\\'),
                Some('"') => field.push('"'),
                Some('n') => field.push('\n'),
                Some(other) => return Err(format!("unknown escape '\\{other}'")),
                None => return Err("incomplete escape at end of line".to_string()),
            },
            '"' => quoted = !quoted,
            DELIMITER if !quoted => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);
    Ok(fields)
}

// =============================================================================
// TESTS
// =============================================================================
