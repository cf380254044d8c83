//! Error Classification
//!
//! Turns transport failures and non-success responses into [`ApiError`]s and
//! reports them on the client's event bus.

use serde_json::Value;
use tracing::{error, warn};

use crate::core::{EventBus, HttpResponse};
use crate::error::{ApiError, ErrorKind, Severity, TransportError};

/// A failed request: either no response at all, or an unsuccessful one.
#[derive(Clone, Copy, Debug)]
pub enum RequestFailure<'a> {
    /// The transport produced no response.
    Transport(&'a TransportError),
    /// A response was received with an unexpected status.
    Response(&'a HttpResponse),
}

impl<'a> From<&'a TransportError> for RequestFailure<'a> {
    fn from(error: &'a TransportError) -> Self {
        Self::Transport(error)
    }
}

impl<'a> From<&'a HttpResponse> for RequestFailure<'a> {
    fn from(response: &'a HttpResponse) -> Self {
        Self::Response(response)
    }
}

impl RequestFailure<'_> {
    /// HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(_) => None,
            Self::Response(response) => Some(response.status),
        }
    }

    /// Kind inferred from the failure alone.
    pub fn inferred_kind(&self) -> ErrorKind {
        match self {
            Self::Transport(TransportError::NotAuthenticated) => ErrorKind::Auth,
            Self::Transport(_) => ErrorKind::Http,
            Self::Response(response) if matches!(response.status, 401 | 403) => ErrorKind::Auth,
            Self::Response(_) => ErrorKind::Http,
        }
    }

    /// Detail string describing the failure.
    pub fn detail(&self) -> String {
        match self {
            Self::Transport(TransportError::NotAuthenticated) => "No access token".to_string(),
            Self::Transport(too_large @ TransportError::ResponseTooLarge { .. }) => {
                too_large.to_string()
            }
            Self::Transport(_) => "No response".to_string(),
            Self::Response(response) => json_error_detail(response)
                .unwrap_or_else(|| format!("Status code {}", response.status)),
        }
    }
}

/// Extract `error.message` (or the raw `error` value) from a JSON error body.
///
/// Returns `None` for empty bodies, missing or non-JSON content types, bodies
/// that fail to parse and bodies without an `error` member.
pub fn json_error_detail(response: &HttpResponse) -> Option<String> {
    if response.body.is_empty() {
        return None;
    }

    let content_type = response.header("content-type")?;
    if !content_type
        .trim()
        .to_lowercase()
        .contains("application/json")
    {
        return None;
    }

    let parsed: Value = serde_json::from_slice(&response.body).ok()?;
    let error = parsed.get("error")?;

    match error.get("message") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(message) if !message.is_null() => Some(message.to_string()),
        _ => match error {
            Value::Null => None,
            Value::String(raw) => Some(raw.clone()),
            other => Some(other.to_string()),
        },
    }
}

/// Classifies failures and reports them on the event bus.
#[derive(Clone, Debug)]
pub struct ErrorClassifier {
    events: EventBus,
}

impl ErrorClassifier {
    /// Create a classifier reporting to `events`.
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }

    /// Event bus errors are reported on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Classify a failed request, inferring the kind from the failure.
    pub fn classify<'a>(
        &self,
        failure: impl Into<RequestFailure<'a>>,
        context: &str,
        severity: Severity,
    ) -> ApiError {
        let failure = failure.into();
        self.classify_as(failure.inferred_kind(), failure, context, severity)
    }

    /// Classify a failed request with an explicit kind.
    pub fn classify_as<'a>(
        &self,
        kind: ErrorKind,
        failure: impl Into<RequestFailure<'a>>,
        context: &str,
        severity: Severity,
    ) -> ApiError {
        let failure = failure.into();
        let message = format!("{}: {}", context, failure.detail());
        let api_error = ApiError::new(kind, message, severity);
        match failure.status() {
            Some(status) => self.report(api_error.with_status(status)),
            None => self.report(api_error),
        }
    }

    /// Report a malformed success response.
    pub fn protocol(
        &self,
        context: &str,
        detail: impl std::fmt::Display,
        severity: Severity,
    ) -> ApiError {
        self.report(ApiError::new(
            ErrorKind::Protocol,
            format!("{}: {}", context, detail),
            severity,
        ))
    }

    /// Report a validation failure. Always critical.
    pub fn validation(&self, message: impl Into<String>) -> ApiError {
        self.report(ApiError::validation(message))
    }

    /// Log and broadcast an error, handing it back to the caller.
    pub fn report(&self, api_error: ApiError) -> ApiError {
        if api_error.is_critical() {
            error!(kind = %api_error.kind, status = ?api_error.status, "{}", api_error.message);
        } else {
            warn!(kind = %api_error.kind, status = ?api_error.status, "{}", api_error.message);
        }
        self.events.publish_error(&api_error);
        api_error
    }
}
