//! Scheduler
//!
//! One-shot delayed task execution, used for token refresh.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Handle to a scheduled task.
pub trait ScheduledTask: Send + Sync {
    /// Cancel the task if it has not run yet.
    fn cancel(&self);

    /// Check whether the task was cancelled.
    fn is_cancelled(&self) -> bool;
}

/// Scheduler interface (for dependency injection).
pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay`.
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> Box<dyn ScheduledTask>;
}

/// Tokio timer based scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Create new scheduler.
    pub fn new() -> Self {
        Self
    }
}

struct TokioTask {
    handle: JoinHandle<()>,
    cancelled: AtomicBool,
}

impl ScheduledTask for TokioTask {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.handle.abort();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> Box<dyn ScheduledTask> {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        Box::new(TokioTask {
            handle,
            cancelled: AtomicBool::new(false),
        })
    }
}

struct MockEntry {
    delay: Duration,
    task: Option<BoxFuture<'static, ()>>,
    cancelled: Arc<AtomicBool>,
}

struct MockTask {
    cancelled: Arc<AtomicBool>,
}

impl ScheduledTask for MockTask {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Mock scheduler for testing.
///
/// Records every scheduled task; nothing runs until [`MockScheduler::fire_next`].
#[derive(Default)]
pub struct MockScheduler {
    entries: Mutex<Vec<MockEntry>>,
}

impl MockScheduler {
    /// Create new mock scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays of every task scheduled so far, in order.
    pub fn scheduled_delays(&self) -> Vec<Duration> {
        self.entries.lock().iter().map(|e| e.delay).collect()
    }

    /// Number of tasks that are neither cancelled nor run.
    pub fn active_count(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.task.is_some() && !e.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Number of tasks cancelled before running.
    pub fn cancelled_count(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Run the oldest pending, non-cancelled task. Returns false if none.
    pub async fn fire_next(&self) -> bool {
        let task = {
            let mut entries = self.entries.lock();
            entries
                .iter_mut()
                .find(|e| e.task.is_some() && !e.cancelled.load(Ordering::SeqCst))
                .and_then(|e| e.task.take())
        };
        match task {
            Some(task) => {
                task.await;
                true
            }
            None => false,
        }
    }
}

impl Scheduler for MockScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> Box<dyn ScheduledTask> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.entries.lock().push(MockEntry {
            delay,
            task: Some(task),
            cancelled: cancelled.clone(),
        });
        Box::new(MockTask { cancelled })
    }
}
