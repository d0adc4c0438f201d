//! Structured error types shared across msamp crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`SampleError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, bounds, identifiers).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the machine sampler.
///
/// Every family except [`SampleError::Job`] is fatal: it aborts a run before
/// any sampling job is dispatched. Job errors are captured per result and
/// folded into the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SampleError {
    /// Malformed settings, paths or run-directory names.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// A required input file does not exist.
    #[error("not found: {0}")]
    NotFound(ErrorInfo),
    /// Input content could not be parsed.
    #[error("format error: {0}")]
    Format(ErrorInfo),
    /// Parsed input violates a consistency rule.
    #[error("validation error: {0}")]
    Validation(ErrorInfo),
    /// Data-slice bounds outside the observed sequence.
    #[error("range error: {0}")]
    Range(ErrorInfo),
    /// Invalid numeric argument such as a negative sample count.
    #[error("value error: {0}")]
    Value(ErrorInfo),
    /// A single sampling job failed.
    #[error("job error: {0}")]
    Job(ErrorInfo),
    /// Filesystem or pipe failure.
    #[error("io error: {0}")]
    Io(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl SampleError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SampleError::Config(info)
            | SampleError::NotFound(info)
            | SampleError::Format(info)
            | SampleError::Validation(info)
            | SampleError::Range(info)
            | SampleError::Value(info)
            | SampleError::Job(info)
            | SampleError::Io(info) => info,
        }
    }

    /// Returns true when the error must abort the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SampleError::Job(_))
    }
}
