// src/connection/queue.rs

//! An unbounded multi-producer, single-consumer FIFO of connection jobs.

use crate::connection::job::QueuedJob;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, timeout_at};

/// The job queue shared between wire-decoder producers and the single
/// draining worker. `offer` never fails and never blocks; backpressure is
/// the transport layer's responsibility.
#[derive(Default)]
pub struct JobQueue {
    entries: Mutex<VecDeque<QueuedJob>>,
    available: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job at the tail and wakes the consumer if it is parked.
    pub fn offer(&self, job: QueuedJob) {
        self.entries.lock().push_back(job);
        self.available.notify_one();
    }

    /// Atomically moves up to `limit` jobs from the head into `buffer`.
    pub fn drain_up_to(&self, buffer: &mut Vec<QueuedJob>, limit: usize) {
        let mut entries = self.entries.lock();
        let take = limit.min(entries.len());
        buffer.extend(entries.drain(..take));
    }

    /// Removes one job from the head, waiting up to `wait` for one to
    /// arrive. Returns `None` on expiry.
    pub async fn poll_with_timeout(&self, wait: Duration) -> Option<QueuedJob> {
        let deadline = Instant::now() + wait;
        loop {
            // Arm the wakeup before checking, so an offer that lands between
            // the check and the await is not lost.
            let notified = self.available.notified();
            if let Some(job) = self.entries.lock().pop_front() {
                return Some(job);
            }
            if timeout_at(deadline, notified).await.is_err() {
                return self.entries.lock().pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
