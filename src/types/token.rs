//! Token Types
//!
//! Token endpoint response and the per-client session it populates.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// Token response from `/oauth2/token`.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<serde_json::Value>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TokenResponse {
    /// Expiry computed from `expires_in`, relative to `now`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.expires_in?).ok()?;
        now.checked_add_signed(Duration::try_seconds(secs)?)
    }
}

/// Session lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No token and no attempt in flight.
    #[default]
    Unauthenticated,
    /// Initial token request in flight.
    Authenticating,
    /// Access token available.
    Authenticated,
    /// Refresh request in flight; the current token stays usable.
    Refreshing,
    /// Last authentication attempt failed.
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Refreshing => "refreshing",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token state of one client instance.
#[derive(Clone, Default)]
pub struct Session {
    /// Current access token.
    pub access_token: Option<String>,
    /// Refresh token from the last token response.
    pub refresh_token: Option<String>,
    /// Expiry of the access token, when known.
    pub expires_at: Option<DateTime<Utc>>,
    /// Lifecycle state.
    pub state: SessionState,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .field("state", &self.state)
            .finish()
    }
}

impl Session {
    /// Check if calls may be dispatched right now.
    pub fn is_usable(&self) -> bool {
        self.access_token.is_some()
            && matches!(
                self.state,
                SessionState::Authenticated | SessionState::Refreshing
            )
    }

    /// Store a token response. The previous refresh token survives when the
    /// response carries none.
    pub fn apply(&mut self, response: &TokenResponse, now: DateTime<Utc>) {
        self.access_token = Some(response.access_token.clone());
        if let Some(refresh_token) = &response.refresh_token {
            self.refresh_token = Some(refresh_token.clone());
        }
        self.expires_at = response.expires_at(now);
        self.state = SessionState::Authenticated;
    }

    /// Check if the token is past its expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp <= Utc::now()).unwrap_or(false)
    }
}
