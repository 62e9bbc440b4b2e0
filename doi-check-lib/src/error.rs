//! Error handling for DOI checking operations.
//!
//! Only failures that stop a whole run surface as `DoiCheckError`. A DOI that
//! fails to resolve is not an error: it becomes a `ResolutionResult` with
//! `resolved == false`.

use std::fmt;
use std::time::Duration;

/// Main error type for DOI checking operations.
#[derive(Debug, Clone)]
pub enum DoiCheckError {
    /// Prefix does not look like a DOI prefix (e.g. "10.12345")
    InvalidPrefix { prefix: String, reason: String },

    /// A DOI given as input could not be parsed
    InvalidDoi { doi: String, reason: String },

    /// The registry listing endpoint answered with a non-success status
    Registry { prefix: String, status_code: u16 },

    /// Network-related errors (connection refused, DNS, TLS, ...)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// Request did not complete in time
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// JSON parsing errors for registry responses
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Configuration errors (invalid settings, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading DOI lists or writing reports
    FileError { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl DoiCheckError {
    /// Create a new invalid prefix error.
    pub fn invalid_prefix<P: Into<String>, R: Into<String>>(prefix: P, reason: R) -> Self {
        Self::InvalidPrefix {
            prefix: prefix.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid DOI error.
    pub fn invalid_doi<D: Into<String>, R: Into<String>>(doi: D, reason: R) -> Self {
        Self::InvalidDoi {
            doi: doi.into(),
            reason: reason.into(),
        }
    }

    /// Create a new registry status error.
    pub fn registry<P: Into<String>>(prefix: P, status_code: u16) -> Self {
        Self::Registry {
            prefix: prefix.into(),
            status_code,
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
            content: None,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Transport-class failure: no HTTP response was received.
    ///
    /// The resolution checker retries exactly these; everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError { .. } | Self::Timeout { .. })
    }

    /// HTTP status attached to this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Registry { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl fmt::Display for DoiCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPrefix { prefix, reason } => {
                write!(f, "Invalid DOI prefix '{}': {}", prefix, reason)
            }
            Self::InvalidDoi { doi, reason } => {
                write!(f, "Invalid DOI '{}': {}", doi, reason)
            }
            Self::Registry {
                prefix,
                status_code,
            } => {
                write!(
                    f,
                    "Failed to fetch DOIs for prefix '{}': registry returned HTTP {}",
                    prefix, status_code
                )
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::ParseError { message, content: _ } => {
                write!(f, "Parse error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for DoiCheckError {}

impl From<reqwest::Error> for DoiCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("HTTP request", Duration::ZERO)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for DoiCheckError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}

impl From<std::io::Error> for DoiCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
