//! Configuration Types
//!
//! Client configuration: where the API lives and how the session behaves.

use std::time::Duration;
use url::Url;

use crate::builders::NetatmoConfigBuilder;
use crate::core::{DEFAULT_EVENT_CAPACITY, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_TIMEOUT};
use crate::error::ConfigurationError;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.netatmo.com";

/// Token endpoint path, relative to the base URL.
pub const TOKEN_PATH: &str = "/oauth2/token";

/// Default bound on calls parked while the session is not usable.
pub const DEFAULT_MAX_PENDING_CALLS: usize = 64;

/// Client configuration.
#[derive(Clone, Debug)]
pub struct NetatmoConfig {
    /// API base URL. Token and endpoint paths are appended to it.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Refresh this long before the token expires.
    pub refresh_margin: Duration,
    /// Pending queue bound.
    pub max_pending_calls: usize,
    /// Event channel capacity.
    pub event_capacity: usize,
    /// Largest response body accepted, in bytes.
    pub max_response_size: usize,
}

impl Default for NetatmoConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: DEFAULT_TIMEOUT,
            refresh_margin: Duration::ZERO,
            max_pending_calls: DEFAULT_MAX_PENDING_CALLS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL)
        .unwrap_or_else(|_| unreachable!("DEFAULT_BASE_URL is a valid URL"))
}

impl NetatmoConfig {
    /// Start a configuration builder.
    pub fn builder() -> NetatmoConfigBuilder {
        NetatmoConfigBuilder::new()
    }

    /// Read configuration from `NETATMO_*` environment variables.
    ///
    /// Unset variables keep their defaults; set but unparseable ones are errors.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mut builder = NetatmoConfigBuilder::new();

        if let Some(url) = env_var("NETATMO_BASE_URL") {
            builder = builder.base_url(url);
        }
        if let Some(secs) = env_parse::<u64>("NETATMO_TIMEOUT_SECS")? {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("NETATMO_REFRESH_MARGIN_SECS")? {
            builder = builder.refresh_margin(Duration::from_secs(secs));
        }
        if let Some(max) = env_parse::<usize>("NETATMO_MAX_PENDING_CALLS")? {
            builder = builder.max_pending_calls(max);
        }
        if let Some(bytes) = env_parse::<usize>("NETATMO_MAX_RESPONSE_BYTES")? {
            builder = builder.max_response_size(bytes);
        }

        builder.build()
    }

    /// Full URL for an API path, keeping any path prefix of the base URL.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, ConfigurationError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|_| ConfigurationError::InvalidBaseUrl { url: joined })
    }
}

pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigurationError> {
    match env_var(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigurationError::InvalidConfig {
                message: format!("{} is not a valid number: {}", name, raw),
            }),
    }
}
