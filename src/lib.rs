//! Netatmo Integration Module
//!
//! Async client for the Netatmo home-automation REST API: weather stations,
//! thermostats, cameras and home coaches.
//!
//! # Features
//!
//! - OAuth2 session management (password, authorization code or pre-issued token)
//! - Automatic token refresh on a timer
//! - Calls made before authentication completes are deferred, not rejected
//! - Uniform error taxonomy, returned to the caller and broadcast to observers
//!
//! # Example
//!
//! ```rust,ignore
//! use integrations_netatmo::{params, Credentials, NetatmoClient, NetatmoConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::builder()
//!         .client_id("my-client-id")
//!         .client_secret("my-client-secret")
//!         .username("me@example.com")
//!         .password("hunter2")
//!         .build()?;
//!
//!     let client = NetatmoClient::new(NetatmoConfig::default(), credentials)?;
//!     client.start();
//!
//!     // Waits for authentication, then sends the request.
//!     let stations = client.weather().get_stations_data(None).await?;
//!     println!("{}", stations);
//!
//!     client
//!         .energy()
//!         .set_therm_mode(Some(params([("home_id", json!("5a...")), ("mode", json!("away"))])))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, credentials and session types
//! - `error`: error taxonomy and failure classification
//! - `core`: HTTP transport, refresh scheduler and event bus
//! - `session`: session lifecycle and deferred dispatch
//! - `client`: the client facade and the authenticated request executor
//! - `services`: endpoint descriptors and per-domain wrappers
//! - `builders`: fluent builders for configuration and credentials

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod services;
pub mod session;
pub mod types;

// Re-export main client
pub use client::{NetatmoClient, NetatmoClientBuilder, RequestExecutor};

// Re-export builders
pub use builders::{netatmo_config, CredentialsBuilder, NetatmoConfigBuilder};

// Re-export errors
pub use error::{
    ApiError, ApiResult, ConfigurationError, ErrorClassifier, ErrorKind, RequestFailure,
    Severity, TransportError,
};

// Re-export types
pub use types::{
    Credentials, Grant, NetatmoConfig, Session, SessionState, TokenResponse, DEFAULT_BASE_URL,
    DEFAULT_SCOPE,
};

// Re-export core components
pub use crate::core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // Scheduler
    MockScheduler, ScheduledTask, Scheduler, TokioScheduler,
    // Events
    ClientEvent, EventBus,
};

// Re-export session
pub use session::{SessionManager, CANCELLED_MESSAGE};

// Re-export services
pub use services::params::params;
pub use services::{
    endpoint, AircareService, Endpoint, EnergyService, Params, RequestDescriptor,
    SecurityService, WeatherService, ENDPOINTS,
};
