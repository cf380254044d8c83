//! Core Components
//!
//! Infrastructure shared by the session manager, the executor and the services.

pub mod events;
pub mod scheduler;
pub mod transport;

pub use events::*;
pub use scheduler::*;
pub use transport::*;
