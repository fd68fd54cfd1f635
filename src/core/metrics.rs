// src/core/metrics.rs

//! Defines and registers Prometheus metrics for connection monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only
//! once globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, Gauge, Histogram, TextEncoder, register_counter, register_gauge, register_histogram,
};
use std::time::Duration;

/// The driver's required metrics collaborator. One emitter is shared by all
/// connections; implementations must be thread-safe.
pub trait ConnectionMetrics: Send + Sync {
    /// A connection finished `start()` and entered the scheduling pool.
    fn connection_opened(&self);
    /// A worker began a drain pass for a connection.
    fn connection_activated(&self);
    /// A drain pass ended and the connection went back to waiting.
    fn connection_waiting(&self);
    /// A connection was torn down.
    fn connection_closed(&self);
    /// A client message was accepted into the job queue.
    fn message_received(&self);
    /// A queued message began executing after `queue_time` in the queue.
    fn message_processing_started(&self, queue_time: Duration);
    /// A message finished executing successfully.
    fn message_processing_completed(&self, processing_time: Duration);
    /// A message raised a fatality while executing.
    fn message_processing_failed(&self);
}

lazy_static! {
    // --- Gauges ---
    /// The number of connections currently open.
    pub static ref OPEN_CONNECTIONS: Gauge =
        register_gauge!("zircondb_open_connections", "Number of currently open connections.").unwrap();
    /// The number of connections currently being drained by a worker.
    pub static ref ACTIVE_CONNECTIONS: Gauge =
        register_gauge!("zircondb_active_connections", "Number of connections currently executing a batch.").unwrap();

    // --- Counters ---
    /// The total number of connections closed since startup.
    pub static ref CONNECTIONS_CLOSED_TOTAL: Counter =
        register_counter!("zircondb_connections_closed_total", "Total number of connections closed.").unwrap();
    /// The total number of client messages accepted for execution.
    pub static ref MESSAGES_RECEIVED_TOTAL: Counter =
        register_counter!("zircondb_messages_received_total", "Total number of messages received.").unwrap();
    /// The total number of messages whose execution raised a fatality.
    pub static ref MESSAGES_FAILED_TOTAL: Counter =
        register_counter!("zircondb_messages_failed_total", "Total number of messages that failed during processing.").unwrap();

    // --- Histograms ---
    /// Time messages spend queued before a worker picks them up.
    pub static ref MESSAGE_QUEUE_SECONDS: Histogram =
        register_histogram!("zircondb_message_queue_seconds", "Time spent by messages in the job queue, in seconds.").unwrap();
    /// Time messages spend executing against the state machine.
    pub static ref MESSAGE_PROCESSING_SECONDS: Histogram =
        register_histogram!("zircondb_message_processing_seconds", "Time spent processing messages, in seconds.").unwrap();
}

/// The production [`ConnectionMetrics`] emitter, backed by the process-wide
/// Prometheus registry above.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusConnectionMetrics;

impl ConnectionMetrics for PrometheusConnectionMetrics {
    fn connection_opened(&self) {
        OPEN_CONNECTIONS.inc();
    }

    fn connection_activated(&self) {
        ACTIVE_CONNECTIONS.inc();
    }

    fn connection_waiting(&self) {
        ACTIVE_CONNECTIONS.dec();
    }

    fn connection_closed(&self) {
        OPEN_CONNECTIONS.dec();
        CONNECTIONS_CLOSED_TOTAL.inc();
    }

    fn message_received(&self) {
        MESSAGES_RECEIVED_TOTAL.inc();
    }

    fn message_processing_started(&self, queue_time: Duration) {
        MESSAGE_QUEUE_SECONDS.observe(queue_time.as_secs_f64());
    }

    fn message_processing_completed(&self, processing_time: Duration) {
        MESSAGE_PROCESSING_SECONDS.observe(processing_time.as_secs_f64());
    }

    fn message_processing_failed(&self) {
        MESSAGES_FAILED_TOTAL.inc();
    }
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap()
}
