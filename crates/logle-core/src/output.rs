//! # Output Writing
//!
//! Persists rendered graph text. Each failure stage has its own code:
//!
//! | Stage  | Code       | Message                          |
//! |--------|------------|----------------------------------|
//! | open   | `EXTERNAL` | `Error opening file: <path>`     |
//! | write  | `INTERNAL` | `Error writing to file: <path>`  |
//! | close  | `EXTERNAL` | `Error closing file: <path>`     |

use crate::LogleError;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Writes a complete text blob to a named destination.
pub trait OutputWriter: Send + Sync {
    /// Create or truncate `path` and write `text` to it.
    fn write(&self, path: &Path, text: &str) -> Result<(), LogleError>;
}

/// Writes to the local filesystem.
///
/// The file handle lives only for the duration of one `write` call. Closing
/// is explicit: the data is flushed and synced before success is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOutputWriter;

impl OutputWriter for FsOutputWriter {
    fn write(&self, path: &Path, text: &str) -> Result<(), LogleError> {
        let mut file = File::create(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "create failed");
            LogleError::open_failed(path)
        })?;

        file.write_all(text.as_bytes()).map_err(|e| {
            debug!(path = %path.display(), error = %e, "write failed");
            LogleError::internal(format!("Error writing to file: {}", path.display()))
        })?;

        file.flush()
            .and_then(|()| file.sync_all())
            .map_err(|e| {
                debug!(path = %path.display(), error = %e, "close failed");
                LogleError::external(format!("Error closing file: {}", path.display()))
            })?;

        debug!(path = %path.display(), bytes = text.len(), "wrote output");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
