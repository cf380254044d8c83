//! Builders
//!
//! Fluent builders for configuration and credentials.

mod config;
mod credentials;

pub use config::*;
pub use credentials::*;
