//! Client Events
//!
//! Best-effort broadcast channel for passive observers. Control flow never
//! depends on it: every result is also returned to the caller.

use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{ApiError, Severity};

/// Default event channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 128;

/// Event broadcast by a client instance.
#[derive(Clone, Debug)]
pub enum ClientEvent {
    /// The session obtained an access token.
    Authenticated,
    /// A critical error.
    Error(ApiError),
    /// A recoverable error.
    Warning(ApiError),
    /// An endpoint returned a payload.
    Response {
        /// Endpoint label, e.g. `get-measure`.
        label: &'static str,
        /// Unwrapped payload.
        body: Value,
    },
    /// An endpoint returned a non-JSON payload, such as a camera picture.
    Raw {
        label: &'static str,
        body: Vec<u8>,
    },
}

/// Broadcast sender shared by the components of one client.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    /// Create a bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: ClientEvent) {
        let _ = self.sender.send(event);
    }

    /// Publish an error on the channel matching its severity.
    pub fn publish_error(&self, error: &ApiError) {
        let event = match error.severity {
            Severity::Critical => ClientEvent::Error(error.clone()),
            Severity::Warning => ClientEvent::Warning(error.clone()),
        };
        self.publish(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
