//! Deferred Dispatch
//!
//! Calls made while the session is not usable are parked in a bounded FIFO
//! queue and released, exactly once, when authentication settles.

use std::collections::VecDeque;
use std::future::Future;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{ApiError, ApiResult, ErrorKind, Severity};
use crate::session::SessionManager;

/// Message carried by calls failed through cancellation.
pub const CANCELLED_MESSAGE: &str = "Deferred call cancelled";

/// A call waiting for the session.
#[derive(Debug)]
pub struct PendingCall {
    /// Sequence number, increasing in enqueue order.
    pub id: u64,
    /// Endpoint that was called.
    pub endpoint: String,
    waker: oneshot::Sender<ApiResult<()>>,
}

/// Bounded FIFO of parked calls.
#[derive(Debug)]
pub struct PendingQueue {
    entries: VecDeque<PendingCall>,
    capacity: usize,
    next_id: u64,
}

impl PendingQueue {
    /// Create a queue holding at most `capacity` calls.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            next_id: 0,
        }
    }

    /// Park a call. Returns `None` when the queue is full.
    ///
    /// Entries whose caller has gone away are pruned first.
    pub fn push(&mut self, endpoint: &str) -> Option<oneshot::Receiver<ApiResult<()>>> {
        self.entries.retain(|entry| !entry.waker.is_closed());

        if self.entries.len() >= self.capacity {
            return None;
        }

        let (waker, receiver) = oneshot::channel();
        self.next_id += 1;
        self.entries.push_back(PendingCall {
            id: self.next_id,
            endpoint: endpoint.to_string(),
            waker,
        });
        Some(receiver)
    }

    /// Let every parked call proceed, oldest first. Returns how many were woken.
    pub fn release_all(&mut self) -> usize {
        self.drain_with(|| Ok(()))
    }

    /// Fail every parked call with `error`. Returns how many were woken.
    pub fn fail_all(&mut self, error: &ApiError) -> usize {
        self.drain_with(|| Err(error.clone()))
    }

    fn drain_with(&mut self, outcome: impl Fn() -> ApiResult<()>) -> usize {
        let mut woken = 0;
        while let Some(entry) = self.entries.pop_front() {
            if entry.waker.send(outcome()).is_ok() {
                woken += 1;
            }
        }
        woken
    }

    /// Number of parked calls, including ones whose caller has gone away.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Endpoints of the parked calls, in release order.
    pub fn endpoints(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.endpoint.clone()).collect()
    }
}

impl SessionManager {
    /// Wait until the session can dispatch calls.
    ///
    /// Resolves immediately when authenticated. Otherwise the call is parked
    /// until the session authenticates (`Ok`) or authentication fails (`Err`).
    /// Dropping the returned future withdraws the call.
    pub async fn ready(&self, endpoint: &str) -> ApiResult<()> {
        let receiver = {
            let mut shared = self.inner.shared.lock();
            if shared.session.is_usable() {
                return Ok(());
            }
            shared.pending.push(endpoint)
        };

        let receiver = match receiver {
            Some(receiver) => receiver,
            None => {
                return Err(self.inner.classifier.report(ApiError::new(
                    ErrorKind::Auth,
                    format!("{} error: Pending call queue is full", endpoint),
                    Severity::Warning,
                )));
            }
        };

        debug!(endpoint, "Deferring call until authenticated");

        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(self.inner.classifier.report(ApiError::new(
                ErrorKind::Auth,
                format!("{} error: {}", endpoint, CANCELLED_MESSAGE),
                Severity::Warning,
            ))),
        }
    }

    /// Run `call` once the session is usable.
    pub async fn guard<F, Fut, T>(&self, endpoint: &str, call: F) -> ApiResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        self.ready(endpoint).await?;
        call().await
    }

    /// Fail every parked call. Returns how many were cancelled.
    pub fn cancel_pending(&self) -> usize {
        let error = ApiError::new(ErrorKind::Auth, CANCELLED_MESSAGE, Severity::Warning);
        let cancelled = self.inner.shared.lock().pending.fail_all(&error);
        if cancelled > 0 {
            self.inner.classifier.report(error);
        }
        cancelled
    }

    /// Number of calls currently parked.
    pub fn pending_count(&self) -> usize {
        self.inner.shared.lock().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ClientEvent, EventBus, MockHttpTransport, MockScheduler};
    use crate::types::{Credentials, NetatmoConfig, SessionState};
    use serde_json::json;
    use std::sync::Arc;
    use tokio_test::{assert_pending, assert_ready, assert_ready_err, assert_ready_ok, task};

    fn password_manager(transport: Arc<MockHttpTransport>, max_pending: usize) -> SessionManager {
        let credentials = Credentials::builder()
            .client_id("id")
            .client_secret("secret")
            .username("u")
            .password("p")
            .build()
            .unwrap();
        let config = NetatmoConfig {
            max_pending_calls: max_pending,
            ..Default::default()
        };
        SessionManager::new(
            config,
            credentials,
            transport,
            Arc::new(MockScheduler::new()),
            EventBus::default(),
        )
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = PendingQueue::new(4);
        let mut first = queue.push("a").unwrap();
        let mut second = queue.push("b").unwrap();

        assert_eq!(queue.endpoints(), vec!["a", "b"]);
        assert_eq!(queue.release_all(), 2);
        assert!(queue.is_empty());
        assert!(matches!(first.try_recv(), Ok(Ok(()))));
        assert!(matches!(second.try_recv(), Ok(Ok(()))));
    }

    #[test]
    fn test_queue_bound_and_pruning() {
        let mut queue = PendingQueue::new(1);
        let receiver = queue.push("a").unwrap();
        assert!(queue.push("b").is_none());

        drop(receiver);
        assert!(queue.push("c").is_some());
        assert_eq!(queue.endpoints(), vec!["c"]);
    }

    #[test]
    fn test_fail_all_delivers_error() {
        let mut queue = PendingQueue::new(2);
        let mut receiver = queue.push("a").unwrap();
        let error = ApiError::validation("nope");

        assert_eq!(queue.fail_all(&error), 1);
        assert_eq!(receiver.try_recv().unwrap(), Err(error));
    }

    #[tokio::test]
    async fn test_ready_parks_until_authenticated() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, json!({"access_token": "T"}));
        let manager = password_manager(transport, 8);

        let mut first = task::spawn(manager.ready("getStationsData"));
        let mut second = task::spawn(manager.ready("homesData"));
        assert_pending!(first.poll());
        assert_pending!(second.poll());
        assert_eq!(manager.pending_count(), 2);

        manager.authenticate().await.unwrap();

        assert!(first.is_woken());
        assert!(second.is_woken());
        assert_ready_ok!(first.poll());
        assert_ready_ok!(second.poll());
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_ready_is_immediate_when_authenticated() {
        let manager = SessionManager::new(
            NetatmoConfig::default(),
            Credentials::from_token("T"),
            Arc::new(MockHttpTransport::new()),
            Arc::new(MockScheduler::new()),
            EventBus::default(),
        );
        manager.authenticate().await.unwrap();

        let mut ready = task::spawn(manager.ready("getMeasure"));
        assert_ready_ok!(ready.poll());
    }

    #[tokio::test]
    async fn test_overflow_is_a_warning() {
        let manager = password_manager(Arc::new(MockHttpTransport::new()), 1);
        let mut events = manager.subscribe_events();

        let mut parked = task::spawn(manager.ready("a"));
        assert_pending!(parked.poll());

        let mut rejected = task::spawn(manager.ready("b"));
        let error = assert_ready_err!(rejected.poll());
        assert_eq!(error.kind, ErrorKind::Auth);
        assert_eq!(error.severity, Severity::Warning);
        assert!(matches!(events.try_recv(), Ok(ClientEvent::Warning(_))));
    }

    #[tokio::test]
    async fn test_cancel_pending() {
        let manager = password_manager(Arc::new(MockHttpTransport::new()), 4);

        let mut parked = task::spawn(manager.ready("a"));
        assert_pending!(parked.poll());

        assert_eq!(manager.cancel_pending(), 1);
        let error = assert_ready_err!(parked.poll());
        assert_eq!(error.message, CANCELLED_MESSAGE);
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_failed_authentication_fails_parked_calls() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(400, json!({"error": "invalid_grant"}));
        let manager = password_manager(transport, 4);

        let mut parked = task::spawn(manager.guard("getHomeData", || async { Ok(42) }));
        assert_pending!(parked.poll());

        assert!(manager.authenticate().await.is_err());

        let outcome = assert_ready!(parked.poll());
        let error = outcome.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Auth);
        assert_eq!(error.message, "Authenticate error: invalid_grant");
    }

    #[tokio::test]
    async fn test_guard_runs_call_after_release() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, json!({"access_token": "T"}));
        let manager = password_manager(transport, 4);

        let mut guarded = task::spawn(manager.guard("getHomeData", || async { Ok("done") }));
        assert_pending!(guarded.poll());

        manager.authenticate().await.unwrap();
        assert_eq!(assert_ready_ok!(guarded.poll()), "done");
    }
}
