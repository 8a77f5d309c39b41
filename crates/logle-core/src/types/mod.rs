//! # Core Type Definitions
//!
//! This module contains the status types shared by every Logle component:
//! - Status codes (`Code`)
//! - Error values (`LogleError`)
//! - The `Status` alias used by operations with no payload
//!
//! ## Propagation
//!
//! Every fallible operation returns `Result<T, LogleError>`. The first error
//! produced anywhere in a run is returned unchanged to the caller; no error
//! is retried or aggregated.

use std::fmt;
use std::path::Path;
use thiserror::Error;

// =============================================================================
// STATUS CODES
// =============================================================================

/// Status code attached to the outcome of an operation.
///
/// `Ok` is only ever observed through [`Code::of`]; errors always carry one of
/// the three failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Code {
    /// The operation succeeded.
    Ok,
    /// Bad or missing configuration or input. Retrying with the same
    /// arguments cannot succeed.
    InvalidArgument,
    /// The environment refused an open or close. The caller may fix the
    /// environment and retry.
    External,
    /// A failure in the middle of an operation (read, write, graph schema).
    Internal,
}

impl Code {
    /// Return the code of a result: `Ok` for success, the error's code otherwise.
    #[must_use]
    pub fn of<T>(result: &Result<T, LogleError>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(e) => e.code(),
        }
    }

    /// Canonical upper-case name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::External => "EXTERNAL",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Logle system.
///
/// - No silent failures
/// - Use `Result<T, LogleError>` for fallible operations
/// - Library code never panics; all errors are returned
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogleError {
    /// Configuration or input that the caller must fix.
    #[error("INVALID_ARGUMENT: {0}")]
    InvalidArgument(String),

    /// An open or close failed.
    #[error("EXTERNAL: {0}")]
    External(String),

    /// A failure in the middle of an operation.
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl LogleError {
    /// Create an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an `External` error.
    pub fn external(message: impl Into<String>) -> Self {
        Self::External(message.into())
    }

    /// Create an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// `External` error for a file that could not be opened.
    pub fn open_failed(path: &Path) -> Self {
        Self::External(format!("Error opening file: {}", path.display()))
    }

    /// The status code of this error.
    #[must_use]
    pub const fn code(&self) -> Code {
        match self {
            Self::InvalidArgument(_) => Code::InvalidArgument,
            Self::External(_) => Code::External,
            Self::Internal(_) => Code::Internal,
        }
    }

    /// The explanatory message, without the code prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m) | Self::External(m) | Self::Internal(m) => m,
        }
    }
}

/// Outcome of an operation with no payload.
pub type Status = Result<(), LogleError>;

// =============================================================================
// TESTS
// =============================================================================
