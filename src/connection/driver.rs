// src/connection/driver.rs

//! Defines `ConnectionDriver`, the execution driver for a single client
//! connection.
//!
//! The driver sits between the wire decoder and the protocol state machine.
//! Decoders `enqueue` jobs from any thread; the shared worker pool calls
//! `process_next_batch`, which drains queued jobs and runs them serially
//! against the state machine. The pool guarantees at most one concurrent
//! drain per connection, so the driver takes no drain lock of its own.

use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::connection::channel::Channel;
use crate::connection::job::{Job, QueuedJob};
use crate::connection::machine::StateMachine;
use crate::connection::monitor::{LifecycleListener, QueueMonitor};
use crate::connection::output::OutputSink;
use crate::connection::queue::JobQueue;
use crate::core::ZirconError;
use crate::core::errors::{PoolRejected, has_cause};
use crate::core::logging::USER_LOG_TARGET;
use crate::core::metrics::ConnectionMetrics;

/// How long an empty drain pass waits for a job before asking the state
/// machine to revalidate its open transaction. Server-side transaction
/// timeouts rely on this to fire while the client is silent.
const JOB_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// The per-connection execution driver.
///
/// Three monotonic flags encode the lifecycle: `should_close` requests
/// teardown, `closed` records that teardown ran, and `idle` is false exactly
/// while a worker is draining this connection.
pub struct ConnectionDriver {
    id: String,
    channel: Arc<dyn Channel>,
    output: Arc<dyn OutputSink>,
    machine: Arc<dyn StateMachine>,
    queue: JobQueue,
    max_batch_size: usize,
    should_close: AtomicBool,
    closed: AtomicBool,
    idle: AtomicBool,
    listener: Option<Arc<dyn LifecycleListener>>,
    queue_monitor: Option<Arc<dyn QueueMonitor>>,
    metrics: Arc<dyn ConnectionMetrics>,
}

impl ConnectionDriver {
    /// Creates a new driver bound to an accepted channel. The driver takes
    /// exclusive ownership of `output` and `machine`; no other component may
    /// call them afterwards.
    pub fn new(
        channel: Arc<dyn Channel>,
        output: Arc<dyn OutputSink>,
        machine: Arc<dyn StateMachine>,
        max_batch_size: usize,
        metrics: Arc<dyn ConnectionMetrics>,
        listener: Option<Arc<dyn LifecycleListener>>,
        queue_monitor: Option<Arc<dyn QueueMonitor>>,
    ) -> Self {
        Self {
            id: channel.id().to_string(),
            channel,
            output,
            machine,
            queue: JobQueue::new(),
            max_batch_size,
            should_close: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            idle: AtomicBool::new(true),
            listener,
            queue_monitor,
            metrics,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when nothing is happening here: no worker is draining the
    /// connection and no jobs are pending. Checking the queue as well
    /// respects jobs that were accepted but not yet picked up.
    pub fn idle(&self) -> bool {
        self.idle.load(Ordering::SeqCst) && self.queue.is_empty()
    }

    pub fn has_pending_jobs(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn local_address(&self) -> SocketAddr {
        self.channel.server_address()
    }

    pub fn remote_address(&self) -> SocketAddr {
        self.channel.client_address()
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn output(&self) -> &Arc<dyn OutputSink> {
        &self.output
    }

    /// Announces the connection to the lifecycle listener and the metrics
    /// emitter. Called exactly once, right after construction.
    pub fn start(&self) {
        self.notify_created();
        self.metrics.connection_opened();
    }

    /// Accepts a client job. Never blocks and never fails; the queue grows
    /// without bound and backpressure is handled upstream by the transport.
    pub fn enqueue(&self, job: Box<dyn Job>) {
        self.metrics.message_received();
        self.enqueue_internal(QueuedJob::Client {
            job,
            enqueued_at: Instant::now(),
        });
    }

    /// Drains and executes up to `max_batch_size` jobs on the calling
    /// worker. Returns `true` iff the connection is still alive.
    pub async fn process_next_batch(&self) -> bool {
        self.process_batch(self.max_batch_size, false).await
    }

    async fn process_batch(&self, batch_limit: usize, exit_if_no_jobs: bool) -> bool {
        self.idle.store(false, Ordering::SeqCst);
        self.metrics.connection_activated();

        let keep_running = self.drain_and_run(batch_limit, exit_if_no_jobs).await;

        self.idle.store(true, Ordering::SeqCst);
        self.metrics.connection_waiting();
        keep_running
    }

    async fn drain_and_run(&self, batch_limit: usize, exit_if_no_jobs: bool) -> bool {
        let mut batch: Vec<QueuedJob> = Vec::with_capacity(batch_limit.min(self.max_batch_size));

        if let Err(fatality) = self
            .run_drain_loop(&mut batch, batch_limit, exit_if_no_jobs)
            .await
        {
            self.should_close.store(true, Ordering::SeqCst);
            self.log_fatality(&fatality);
        }

        if self.will_close() {
            self.close().await;
        }
        !self.closed.load(Ordering::SeqCst)
    }

    async fn run_drain_loop(
        &self,
        batch: &mut Vec<QueuedJob>,
        mut remaining: usize,
        exit_if_no_jobs: bool,
    ) -> Result<(), ZirconError> {
        while remaining > 0 {
            // Exit the loop if we'll close the connection.
            if self.will_close() {
                break;
            }

            self.queue.drain_up_to(batch, remaining);
            if batch.is_empty() {
                if exit_if_no_jobs {
                    break;
                }
                self.wait_for_jobs(batch).await?;
            }
            if batch.is_empty() {
                // The wait gave up because a close was requested.
                break;
            }

            self.notify_drained(batch);
            remaining -= batch.len();

            // Jobs are popped before execution so a fatality abandons the
            // undispatched remainder of the batch.
            while !batch.is_empty() {
                let job = batch.remove(0);
                self.run_job(job).await?;
            }

            if !self.has_pending_jobs() {
                break;
            }
        }

        // All pending messages processed; flush the underlying channel.
        self.output.flush().await?;
        Ok(())
    }

    /// Parks until a job arrives, pushing it into `batch`, or until a close
    /// is requested. Every poll expiry hands control to the state machine so
    /// an expired or terminated open transaction is detected.
    async fn wait_for_jobs(&self, batch: &mut Vec<QueuedJob>) -> Result<(), ZirconError> {
        while !self.will_close() {
            match self.queue.poll_with_timeout(JOB_POLL_INTERVAL).await {
                Some(job) => {
                    batch.push(job);
                    break;
                }
                None => self.machine.validate_transaction().await?,
            }
        }
        Ok(())
    }

    async fn run_job(&self, job: QueuedJob) -> Result<(), ZirconError> {
        match job {
            QueuedJob::Sentinel => Ok(()),
            QueuedJob::Client { job, enqueued_at } => {
                self.metrics
                    .message_processing_started(enqueued_at.elapsed());
                let started = Instant::now();
                match job.perform(self.machine.as_ref()).await {
                    Ok(()) => {
                        self.metrics.message_processing_completed(started.elapsed());
                        Ok(())
                    }
                    Err(fatality) => {
                        self.metrics.message_processing_failed();
                        Err(fatality)
                    }
                }
            }
        }
    }

    fn log_fatality(&self, fatality: &ZirconError) {
        match fatality {
            ZirconError::AuthFatality { message, loggable } => {
                if *loggable {
                    warn!(target: USER_LOG_TARGET, "{message}");
                }
            }
            ZirconError::ProtocolBreach(_) => {
                error!(
                    cause = %fatality,
                    "Protocol breach detected in session '{}'.", self.id
                );
            }
            ZirconError::Interrupted => {
                info!(
                    "Session '{}' is interrupted, probably due to server shutdown.",
                    self.id
                );
            }
            _ => {
                error!(
                    target: USER_LOG_TARGET,
                    cause = %fatality,
                    "Unexpected error detected in session '{}'.", self.id
                );
            }
        }
    }

    /// Invoked by the worker pool when it failed to schedule this
    /// connection. Marks the state machine as failed so the client receives
    /// a final failure response, runs one job on the caller's thread to
    /// deliver it, then tears the connection down.
    pub async fn handle_scheduling_error(&self, cause: &(dyn StdError + 'static)) {
        // A connection that is already closing logs nothing.
        if !self.will_close() {
            let (failure, message) = if has_cause::<PoolRejected>(cause) {
                let message = format!(
                    "Unable to schedule session '{}' for execution since there are no available \
                     threads to serve it at the moment. You can retry at a later time or \
                     consider increasing the worker pool size for the connector.",
                    self.id
                );
                (ZirconError::NoThreadsAvailable(message.clone()), message)
            } else {
                (
                    ZirconError::Internal(cause.to_string()),
                    format!(
                        "Unexpected error during scheduling of session '{}'.",
                        self.id
                    ),
                )
            };

            error!(cause = %cause, "{message}");
            error!(target: USER_LOG_TARGET, "{message}");
            self.machine.mark_failed(failure);
        }

        // Exit immediately if the queue turns out to be empty instead of
        // parking in the job wait.
        self.process_batch(1, true).await;
        // The drain may already have closed the connection if a queued job
        // was fatal; `close` is idempotent.
        self.close().await;
    }

    /// Forwards a cancellation request to the state machine. Does not touch
    /// the queue or the lifecycle flags.
    pub fn interrupt(&self) {
        self.machine.interrupt();
    }

    /// Requests an orderly shutdown. The state machine is marked for
    /// termination so still-queued jobs fast-fail, and a sentinel job wakes
    /// any parked drain so the close itself runs on the worker thread,
    /// serialized behind already-enqueued jobs.
    pub fn stop(&self) {
        if self
            .should_close
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.machine.mark_for_termination();
            self.enqueue_internal(QueuedJob::Sentinel);
        }
    }

    fn will_close(&self) -> bool {
        self.should_close.load(Ordering::SeqCst)
    }

    /// Tears the connection down: closes the output sink, then the state
    /// machine, then fires the lifecycle listener. Idempotent via the
    /// `closed` flag; errors from either close are logged and swallowed so
    /// the second resource is still released and the listener still fires.
    pub async fn close(&self) {
        self.should_close.store(true, Ordering::SeqCst);
        if self
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            if let Err(e) = self.output.close().await {
                error!(
                    "Unable to close output sink of session '{}': {}",
                    self.id, e
                );
            }
            if let Err(e) = self.machine.close().await {
                error!(
                    "Unable to close state machine of session '{}': {}",
                    self.id, e
                );
            }
            self.metrics.connection_closed();
            self.notify_destroyed();
        }
    }

    fn enqueue_internal(&self, job: QueuedJob) {
        self.queue.offer(job);
        self.notify_enqueued();
    }

    fn notify_created(&self) {
        if let Some(listener) = &self.listener {
            listener.created(self);
        }
    }

    fn notify_destroyed(&self) {
        if let Some(listener) = &self.listener {
            listener.closed(self);
        }
    }

    fn notify_enqueued(&self) {
        if let Some(monitor) = &self.queue_monitor {
            monitor.enqueued(self);
        }
    }

    fn notify_drained(&self, jobs: &[QueuedJob]) {
        if let Some(monitor) = &self.queue_monitor {
            if !jobs.is_empty() {
                monitor.drained(self, jobs);
            }
        }
    }
}
