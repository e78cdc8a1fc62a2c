//! Structured error types shared across hullwalk crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`WalkError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (dimensions, paths, indices, etc.).
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

/// Canonical error type for the hullwalk engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum WalkError {
    /// Invalid run or walker configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Convex hull construction errors.
    #[error("hull error: {0}")]
    Hull(ErrorInfo),
    /// Walk construction and observable errors.
    #[error("walker error: {0}")]
    Walker(ErrorInfo),
    /// Sampler failures (equilibration, unreachable ranges, ...).
    #[error("sampling error: {0}")]
    Sampling(ErrorInfo),
    /// Randomness and seeding errors.
    #[error("rng error: {0}")]
    Rng(ErrorInfo),
    /// Serialization, schema and file errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
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

impl WalkError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            WalkError::Config(info)
            | WalkError::Hull(info)
            | WalkError::Walker(info)
            | WalkError::Sampling(info)
            | WalkError::Rng(info)
            | WalkError::Serde(info) => info,
        }
    }

    /// Shorthand for the stable error code.
    pub fn code(&self) -> &str {
        &self.info().code
    }
}
