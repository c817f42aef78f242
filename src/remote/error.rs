//! Remote call error types
//!
//! `RemoteError` describes why a single attempt failed. `InvokeError` is what
//! the retry loop hands back once it has given up.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Retry classification of a single failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Explicit "too many requests" from the server
    RateLimited,

    /// Server error, timeout or dropped connection; worth another attempt
    Transient,

    /// Validation error, not-found, conflict and anything else final
    NonRetryable,
}

impl ErrorClass {
    /// Returns true if an attempt failing with this class may be retried
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NonRetryable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Transient => "transient",
            Self::NonRetryable => "non_retryable",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure of one remote attempt
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Classifies this failure for the retry loop
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::RateLimited { .. } => ErrorClass::RateLimited,
            Self::Server { .. } | Self::Timeout | Self::Connection(_) => ErrorClass::Transient,
            Self::Rejected { .. } | Self::Decode(_) => ErrorClass::NonRetryable,
        }
    }

    /// Server-provided wait hint, if the failure carried one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Final failure of a remote operation after the retry loop
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    #[error("{operation} failed without retry: {source}")]
    NonRetryable {
        operation: String,
        source: RemoteError,
    },

    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        source: RemoteError,
    },
}
