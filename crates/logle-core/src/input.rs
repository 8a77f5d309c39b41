//! # Input Acquisition
//!
//! Opens a named input and wraps it in the reader its analyzer consumes.
//!
//! The opened handle is moved into the returned reader, which owns it until
//! the reader is dropped. When opening fails nothing is returned, so nothing
//! is left open.

use crate::LogleError;
use crate::csv::CsvParser;
use crate::json::{JsonDocument, JsonStream};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Opens inputs for the dispatcher.
///
/// Implementations must be thread-safe (`Send + Sync`) so a dispatcher can be
/// shared across threads running independent configurations.
pub trait InputAcquirer: Send + Sync {
    /// Open a CSV file. Fails with `EXTERNAL` if it cannot be opened.
    fn open_csv(&self, path: &Path) -> Result<CsvParser, LogleError>;

    /// Open and read a whole JSON document. Fails with `EXTERNAL` if it cannot
    /// be opened. A document that does not parse is returned with its parse
    /// error recorded.
    fn open_json_document(&self, path: &Path) -> Result<JsonDocument, LogleError>;

    /// Open a line-delimited JSON stream. Fails with `EXTERNAL` if it cannot be
    /// opened.
    fn open_json_stream(&self, path: &Path) -> Result<JsonStream, LogleError>;
}

/// Acquires inputs from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsInputAcquirer;

impl FsInputAcquirer {
    fn open(path: &Path) -> Result<File, LogleError> {
        File::open(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "open failed");
            LogleError::open_failed(path)
        })
    }
}

impl InputAcquirer for FsInputAcquirer {
    fn open_csv(&self, path: &Path) -> Result<CsvParser, LogleError> {
        Ok(CsvParser::new(Self::open(path)?))
    }

    fn open_json_document(&self, path: &Path) -> Result<JsonDocument, LogleError> {
        let document = JsonDocument::from_reader(Self::open(path)?)?;
        if let Some(err) = document.parse_error() {
            tracing::warn!(path = %path.display(), error = err, "JSON document did not parse");
        }
        Ok(document)
    }

    fn open_json_stream(&self, path: &Path) -> Result<JsonStream, LogleError> {
        Ok(JsonStream::new(Self::open(path)?))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Code;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).expect("create");
        file.write_all(text.as_bytes()).expect("write");
        path
    }

    #[test]
    fn missing_files_are_external() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("missing.json");
        let acquirer = FsInputAcquirer;

        for err in [
            acquirer.open_csv(&path).expect_err("csv"),
            acquirer.open_json_document(&path).expect_err("doc"),
            acquirer.open_json_stream(&path).expect_err("stream"),
        ] {
            assert_eq!(err.code(), Code::External);
            assert!(err.message().contains("missing.json"));
        }
    }

    #[test]
    fn opens_csv() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(&dir, "a.csv", "x,y\n1,2\n");
        let records: Vec<_> = FsInputAcquirer.open_csv(&path).expect("open").collect();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn malformed_document_is_not_an_acquisition_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(&dir, "bad.json", "{ nope");
        let document = FsInputAcquirer.open_json_document(&path).expect("open");
        assert!(document.parse_error().is_some());
    }

    #[test]
    fn opens_stream() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(&dir, "e.jsonl", "{}\n{}\n");
        assert_eq!(FsInputAcquirer.open_json_stream(&path).expect("open").count(), 2);
    }
}
