#![allow(dead_code)]

//! Shared test doubles for the connection driver suites.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use zircondb_connection::ZirconError;
use zircondb_connection::connection::{
    Channel, ConnectionDriver, Job, LifecycleListener, QueuedJob, QueueMonitor, StateMachine,
    OutputSink,
};
use zircondb_connection::core::metrics::ConnectionMetrics;

pub struct TestChannel {
    id: String,
    server: SocketAddr,
    client: SocketAddr,
}

impl TestChannel {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            server: "127.0.0.1:7777".parse().unwrap(),
            client: "127.0.0.1:51234".parse().unwrap(),
        }
    }
}

impl Channel for TestChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn server_address(&self) -> SocketAddr {
        self.server
    }

    fn client_address(&self) -> SocketAddr {
        self.client
    }
}

#[derive(Default)]
pub struct RecordingOutput {
    pub flushes: AtomicUsize,
    pub closes: AtomicUsize,
    pub fail_flush: AtomicBool,
}

#[async_trait]
impl OutputSink for RecordingOutput {
    async fn flush(&self) -> Result<(), ZirconError> {
        if self.fail_flush.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "flush failed").into());
        }
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), ZirconError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMachine {
    pub interrupts: AtomicUsize,
    pub terminations: AtomicUsize,
    pub validations: AtomicUsize,
    pub closes: AtomicUsize,
    pub failures: Mutex<Vec<ZirconError>>,
}

#[async_trait]
impl StateMachine for RecordingMachine {
    fn interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
    }

    fn mark_for_termination(&self) {
        self.terminations.fetch_add(1, Ordering::SeqCst);
    }

    fn mark_failed(&self, error: ZirconError) {
        self.failures.lock().push(error);
    }

    async fn validate_transaction(&self) -> Result<(), ZirconError> {
        self.validations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), ZirconError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingListener {
    pub created: AtomicUsize,
    pub closed: AtomicUsize,
}

impl LifecycleListener for RecordingListener {
    fn created(&self, _conn: &ConnectionDriver) {
        self.created.fetch_add(1, Ordering::SeqCst);
    }

    fn closed(&self, _conn: &ConnectionDriver) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingQueueMonitor {
    pub enqueued: AtomicUsize,
    pub drained_batches: AtomicUsize,
    pub drained_jobs: AtomicUsize,
}

impl QueueMonitor for RecordingQueueMonitor {
    fn enqueued(&self, _conn: &ConnectionDriver) {
        self.enqueued.fetch_add(1, Ordering::SeqCst);
    }

    fn drained(&self, _conn: &ConnectionDriver, jobs: &[QueuedJob]) {
        self.drained_batches.fetch_add(1, Ordering::SeqCst);
        self.drained_jobs.fetch_add(jobs.len(), Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingMetrics {
    pub opened: AtomicUsize,
    pub activated: AtomicUsize,
    pub waiting: AtomicUsize,
    pub closed: AtomicUsize,
    pub received: AtomicUsize,
    pub started: AtomicUsize,
    pub completed: AtomicUsize,
    pub failed: AtomicUsize,
    pub queue_times: Mutex<Vec<Duration>>,
    pub processing_times: Mutex<Vec<Duration>>,
}

impl ConnectionMetrics for RecordingMetrics {
    fn connection_opened(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }

    fn connection_activated(&self) {
        self.activated.fetch_add(1, Ordering::SeqCst);
    }

    fn connection_waiting(&self) {
        self.waiting.fetch_add(1, Ordering::SeqCst);
    }

    fn connection_closed(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    fn message_received(&self) {
        self.received.fetch_add(1, Ordering::SeqCst);
    }

    fn message_processing_started(&self, queue_time: Duration) {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.queue_times.lock().push(queue_time);
    }

    fn message_processing_completed(&self, processing_time: Duration) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.processing_times.lock().push(processing_time);
    }

    fn message_processing_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

/// A job that records its tag in a shared log when performed.
pub struct TagJob {
    pub tag: usize,
    pub log: Arc<Mutex<Vec<usize>>>,
}

#[async_trait]
impl Job for TagJob {
    async fn perform(self: Box<Self>, _machine: &dyn StateMachine) -> Result<(), ZirconError> {
        self.log.lock().push(self.tag);
        Ok(())
    }
}

/// A job that fails with a preset error.
pub struct FailingJob {
    pub error: ZirconError,
}

#[async_trait]
impl Job for FailingJob {
    async fn perform(self: Box<Self>, _machine: &dyn StateMachine) -> Result<(), ZirconError> {
        Err(self.error)
    }
}

/// A driver wired to recording doubles.
pub struct DriverFixture {
    pub driver: Arc<ConnectionDriver>,
    pub machine: Arc<RecordingMachine>,
    pub output: Arc<RecordingOutput>,
    pub metrics: Arc<RecordingMetrics>,
    pub listener: Arc<RecordingListener>,
    pub queue_monitor: Arc<RecordingQueueMonitor>,
}

pub fn fixture(max_batch_size: usize) -> DriverFixture {
    let machine = Arc::new(RecordingMachine::default());
    let output = Arc::new(RecordingOutput::default());
    let metrics = Arc::new(RecordingMetrics::default());
    let listener = Arc::new(RecordingListener::default());
    let queue_monitor = Arc::new(RecordingQueueMonitor::default());

    let driver = Arc::new(ConnectionDriver::new(
        Arc::new(TestChannel::new("session-1")),
        output.clone(),
        machine.clone(),
        max_batch_size,
        metrics.clone(),
        Some(listener.clone()),
        Some(queue_monitor.clone()),
    ));

    DriverFixture {
        driver,
        machine,
        output,
        metrics,
        listener,
        queue_monitor,
    }
}

pub fn job_log() -> Arc<Mutex<Vec<usize>>> {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn tag_job(tag: usize, log: &Arc<Mutex<Vec<usize>>>) -> Box<TagJob> {
    Box::new(TagJob {
        tag,
        log: log.clone(),
    })
}
