//! Types
//!
//! Configuration, credentials and session types.

pub mod config;
pub mod credentials;
pub mod token;

pub use config::*;
pub use credentials::*;
pub use token::*;
