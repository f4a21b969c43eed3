//! Error types for the metrics engine.
//!
//! Acquisition and parse failures propagate unchanged up to the fallback
//! chain, which wraps every failed attempt into an [`AggregateError`] once all
//! pipelines are exhausted. [`MetricsError`] is the umbrella type returned by
//! every public read operation.

use std::fmt;

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Failure to obtain raw text from a file or a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("not found: {target}")]
    NotFound { target: String },

    #[error("permission denied: {target}")]
    PermissionDenied { target: String },

    #[error("execution failed: {target}: {reason}")]
    ExecutionFailed { target: String, reason: String },
}

impl AcquisitionError {
    /// Maps an I/O error raised while touching `target` onto the acquisition taxonomy.
    pub fn from_io(target: impl Into<String>, err: &std::io::Error) -> Self {
        let target = target.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => AcquisitionError::NotFound { target },
            std::io::ErrorKind::PermissionDenied => AcquisitionError::PermissionDenied { target },
            _ => AcquisitionError::ExecutionFailed {
                target,
                reason: err.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AcquisitionError::NotFound { .. })
    }
}

/// Failure to turn raw text into a typed snapshot.
///
/// `format` names the input that was being parsed (`/proc/stat`,
/// `sysctl vm.loadavg`, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{format}: empty input")]
    EmptyInput { format: String },

    #[error("{format}: missing field '{field}'")]
    MissingField { format: String, field: String },

    #[error("{format}: malformed field '{field}': {value:?}")]
    MalformedField {
        format: String,
        field: String,
        value: String,
    },
}

impl ParseError {
    pub fn empty(format: &str) -> Self {
        ParseError::EmptyInput {
            format: format.to_string(),
        }
    }

    pub fn missing(format: &str, field: &str) -> Self {
        ParseError::MissingField {
            format: format.to_string(),
            field: field.to_string(),
        }
    }

    pub fn malformed(format: &str, field: &str, value: &str) -> Self {
        ParseError::MalformedField {
            format: format.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// One failed pipeline inside a fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub pipeline: String,
    pub error: MetricsError,
}

/// Every pipeline of a chain failed; carries each attempt in order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateError {
    pub domain: String,
    pub attempts: Vec<Attempt>,
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} sources failed", self.domain)?;
        for (idx, attempt) in self.attempts.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{}[{}] {}", sep, attempt.pipeline, attempt.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Umbrella error for every public engine operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("{domain} metrics are not supported on {platform}")]
    UnsupportedPlatform { domain: String, platform: String },
}
