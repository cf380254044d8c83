//! Error Types
//!
//! Caller-visible error taxonomy plus the lower-level transport and
//! configuration errors it is built from.

pub mod classify;

use std::time::Duration;
use thiserror::Error;

pub use classify::{ErrorClassifier, RequestFailure};

/// Error category surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Token issuance or refresh failed, or the session is unusable.
    Auth,
    /// Non-success HTTP status or transport failure.
    Http,
    /// Malformed or unexpected response envelope.
    Protocol,
    /// Missing required option. Caller's fault, never retried.
    Validation,
}

impl ErrorKind {
    /// Get error code for telemetry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "NETATMO_AUTH",
            Self::Http => "NETATMO_HTTP",
            Self::Protocol => "NETATMO_PROTOCOL",
            Self::Validation => "NETATMO_VALIDATION",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an error is reported to passive observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Recoverable; broadcast as a warning.
    Warning,
    /// Broadcast as an error.
    Critical,
}

/// Error returned by every client operation.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable message, `"<context>: <detail>"` for classified failures.
    pub message: String,
    /// Reporting severity.
    pub severity: Severity,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
}

impl ApiError {
    /// Create a new error without an HTTP status.
    pub fn new(kind: ErrorKind, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind,
            message: message.into(),
            severity,
            status: None,
        }
    }

    /// Attach the HTTP status the error was derived from.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Validation error (always critical).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message, Severity::Critical)
    }

    /// Check if the error is critical.
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// Result type for client operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Transport-level failure: no usable HTTP response was obtained.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Failed to read response body: {message}")]
    Body { message: String },

    #[error("Response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("No access token available")]
    NotAuthenticated,
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("Failed to create HTTP client: {message}")]
    HttpClient { message: String },
}

impl From<ConfigurationError> for ApiError {
    fn from(error: ConfigurationError) -> Self {
        ApiError::validation(error.to_string())
    }
}
