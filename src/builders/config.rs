//! Configuration Builder
//!
//! Fluent builder for client configuration.

use std::time::Duration;
use url::Url;

use crate::core::{DEFAULT_EVENT_CAPACITY, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_TIMEOUT};
use crate::error::ConfigurationError;
use crate::types::{NetatmoConfig, DEFAULT_BASE_URL, DEFAULT_MAX_PENDING_CALLS};

/// Client configuration builder.
#[derive(Debug)]
pub struct NetatmoConfigBuilder {
    base_url: String,
    timeout: Duration,
    refresh_margin: Duration,
    max_pending_calls: usize,
    event_capacity: usize,
    max_response_size: usize,
}

impl Default for NetatmoConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NetatmoConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            refresh_margin: Duration::ZERO,
            max_pending_calls: DEFAULT_MAX_PENDING_CALLS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }

    /// Set the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Refresh tokens this long before they expire.
    pub fn refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Bound the number of calls parked before authentication.
    pub fn max_pending_calls(mut self, max: usize) -> Self {
        self.max_pending_calls = max;
        self
    }

    /// Set event channel capacity.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Cap response bodies at `bytes`.
    pub fn max_response_size(mut self, bytes: usize) -> Self {
        self.max_response_size = bytes;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<NetatmoConfig, ConfigurationError> {
        let base_url = Url::parse(self.base_url.trim()).map_err(|_| {
            ConfigurationError::InvalidBaseUrl {
                url: self.base_url.clone(),
            }
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidBaseUrl { url: self.base_url });
        }

        if self.timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfig {
                message: "timeout must be greater than zero".to_string(),
            });
        }

        if self.event_capacity == 0 {
            return Err(ConfigurationError::InvalidConfig {
                message: "event_capacity must be greater than zero".to_string(),
            });
        }

        if self.max_response_size == 0 {
            return Err(ConfigurationError::InvalidConfig {
                message: "max_response_size must be greater than zero".to_string(),
            });
        }

        Ok(NetatmoConfig {
            base_url,
            timeout: self.timeout,
            refresh_margin: self.refresh_margin,
            max_pending_calls: self.max_pending_calls,
            event_capacity: self.event_capacity,
            max_response_size: self.max_response_size,
        })
    }
}

/// Create a new configuration builder.
pub fn netatmo_config() -> NetatmoConfigBuilder {
    NetatmoConfigBuilder::new()
}
