//! Error types for the Mediarelay core library
//!
//! This module defines the request-level error taxonomy. Per-provider
//! failures are collected as [`ProviderFailure`] values and only surface to
//! callers through [`Error::AllProvidersFailed`] once failover is exhausted.

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::HttpError;

/// Main error type for Mediarelay operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing credential or an unknown/unconfigured forced provider
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// No provider in the catalog has a configured credential
    #[error("No provider available: {message}")]
    NoProviderAvailable { message: String },

    /// Invalid input, reported before any network call
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Fatal transport failure, including retries that were exhausted
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        status_code: Option<u16>,
    },

    /// Every resolved provider failed; the only terminal user-visible failure
    #[error("All providers failed: {}", summarize(.failures))]
    AllProvidersFailed { failures: Vec<ProviderFailure> },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a validation error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Why a single provider was abandoned during failover
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureCause {
    /// The request could not be built for this provider
    Build { message: String },
    /// Fatal transport failure or exhausted retries
    Transport { error: HttpError },
    /// The provider answered successfully but yielded no media
    EmptyResult,
    /// A multi-step flow stopped part way through
    Partial { message: String },
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Build { message } => write!(f, "request build failed: {}", message),
            FailureCause::Transport { error } => write!(f, "{}", error),
            FailureCause::EmptyResult => write!(f, "response contained no media items"),
            FailureCause::Partial { message } => write!(f, "partially completed: {}", message),
        }
    }
}

/// One provider's recorded failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub cause: FailureCause,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.cause)
    }
}

fn summarize(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers attempted".to_string();
    }
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<HttpError> for Error {
    fn from(http_error: HttpError) -> Self {
        Error::Http {
            message: http_error.message,
            status_code: http_error.status_code,
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ErrorClassification;

    #[test]
    fn test_error_display() {
        let err = Error::validation("count", "must be between 1 and 10");
        assert_eq!(err.to_string(), "Validation error: count - must be between 1 and 10");
    }

    #[test]
    fn test_all_providers_failed_lists_every_provider() {
        let err = Error::AllProvidersFailed {
            failures: vec![
                ProviderFailure {
                    provider: "antigravity".to_string(),
                    cause: FailureCause::Transport {
                        error: HttpError::new(
                            Some(500),
                            ErrorClassification::ServerError,
                            "boom",
                        ),
                    },
                },
                ProviderFailure {
                    provider: "nanobanana".to_string(),
                    cause: FailureCause::EmptyResult,
                },
            ],
        };

        let text = err.to_string();
        assert!(text.contains("antigravity"));
        assert!(text.contains("boom"));
        assert!(text.contains("nanobanana: response contained no media items"));
    }
}
