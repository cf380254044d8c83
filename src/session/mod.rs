//! Session
//!
//! OAuth2 session lifecycle and deferred dispatch of calls made before the
//! session is usable.

pub mod gate;
mod manager;

pub use gate::{PendingCall, PendingQueue, CANCELLED_MESSAGE};
pub use manager::SessionManager;
