// ABOUTME: Concurrent stack activity monitor.
// ABOUTME: Streams recent stack events to the reporter while a deploy waits.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::progress::Reporter;
use crate::provider::StackEventOps;
use crate::types::StackName;

/// Periodically fetches and renders stack events while a stack operation
/// is in flight.
///
/// Runs as an independent task so it never delays the status poller.
/// `start` and `stop` are idempotent; dropping the monitor aborts a task
/// that was never stopped, so error paths cannot leak the poller.
pub struct StackActivityMonitor<P> {
    provider: Arc<P>,
    stack_name: StackName,
    reporter: Arc<Reporter>,
    /// Construct paths by logical resource id, for friendlier labels.
    metadata: Arc<HashMap<String, String>>,
    /// Total number of expected resource changes; unknown for destroys.
    resource_count: Option<usize>,
    interval: Duration,
    displayed: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<P: StackEventOps + Send + Sync + 'static> StackActivityMonitor<P> {
    pub fn new(
        provider: Arc<P>,
        stack_name: StackName,
        reporter: Arc<Reporter>,
        resource_count: Option<usize>,
        metadata: HashMap<String, String>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            stack_name,
            reporter,
            metadata: Arc::new(metadata),
            resource_count,
            interval,
            displayed: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(Notify::new()),
            task: Mutex::new(None),
        }
    }

    /// Start the background event loop. A second call while running is a
    /// no-op.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }

        let worker = Worker {
            provider: Arc::clone(&self.provider),
            stack_name: self.stack_name.clone(),
            reporter: Arc::clone(&self.reporter),
            metadata: Arc::clone(&self.metadata),
            resource_count: self.resource_count,
            interval: self.interval,
            displayed: Arc::clone(&self.displayed),
            shutdown: Arc::clone(&self.shutdown),
            started_at: Utc::now(),
            seen: HashSet::new(),
        };
        *task = Some(tokio::spawn(worker.run()));
    }

    /// Stop the event loop and wait for it to finish its final sweep.
    /// Stopping an already stopped monitor is a no-op.
    pub async fn stop(&self) {
        let handle = self.task.lock().take();
        let Some(handle) = handle else {
            return;
        };

        self.shutdown.notify_one();
        let _ = handle.await;
    }

    /// Number of events rendered so far.
    pub fn events_displayed(&self) -> usize {
        self.displayed.load(Ordering::Relaxed)
    }
}

impl<P> Drop for StackActivityMonitor<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}

struct Worker<P> {
    provider: Arc<P>,
    stack_name: StackName,
    reporter: Arc<Reporter>,
    metadata: Arc<HashMap<String, String>>,
    resource_count: Option<usize>,
    interval: Duration,
    displayed: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
    started_at: DateTime<Utc>,
    seen: HashSet<String>,
}

impl<P: StackEventOps> Worker<P> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => break,
                _ = tokio::time::sleep(self.interval) => self.poll_once().await,
            }
        }

        // One last fetch so events that landed between the final tick and
        // the stop call still get rendered.
        self.poll_once().await;
    }

    async fn poll_once(&mut self) {
        let mut events = match self.provider.recent_stack_events(&self.stack_name).await {
            Ok(events) => events,
            Err(e) => {
                tracing::debug!(stack = %self.stack_name, error = %e, "failed to fetch stack events");
                return;
            }
        };

        // The provider returns newest first; render in the order they happened.
        events.reverse();

        for event in events {
            if event.timestamp < self.started_at {
                continue;
            }
            if !self.seen.insert(event.event_id.clone()) {
                continue;
            }

            let count = self.displayed.fetch_add(1, Ordering::Relaxed) + 1;
            let construct_path = event
                .logical_resource_id
                .as_deref()
                .and_then(|id| self.metadata.get(id))
                .map(String::as_str);
            self.reporter
                .stack_event(count, self.resource_count, &event, construct_path);
        }
    }
}
