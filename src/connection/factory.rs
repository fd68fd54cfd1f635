// src/connection/factory.rs

//! Defines `ConnectionDriverFactory`, which wires process-wide collaborators
//! into per-connection drivers.

use crate::config::ConnectionConfig;
use crate::connection::channel::Channel;
use crate::connection::driver::ConnectionDriver;
use crate::connection::machine::StateMachine;
use crate::connection::monitor::{LifecycleListener, QueueMonitor};
use crate::connection::output::OutputSink;
use crate::core::metrics::ConnectionMetrics;
use std::sync::Arc;

/// Builds connection drivers for accepted channels. Holds the configuration
/// resolved at process start and the shared metrics emitter; listeners are
/// optional.
pub struct ConnectionDriverFactory {
    config: ConnectionConfig,
    metrics: Arc<dyn ConnectionMetrics>,
    listener: Option<Arc<dyn LifecycleListener>>,
    queue_monitor: Option<Arc<dyn QueueMonitor>>,
}

impl ConnectionDriverFactory {
    pub fn new(config: ConnectionConfig, metrics: Arc<dyn ConnectionMetrics>) -> Self {
        Self {
            config,
            metrics,
            listener: None,
            queue_monitor: None,
        }
    }

    /// Registers a lifecycle listener for all drivers created afterwards.
    pub fn with_listener(mut self, listener: Arc<dyn LifecycleListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Registers a queue monitor for all drivers created afterwards.
    pub fn with_queue_monitor(mut self, monitor: Arc<dyn QueueMonitor>) -> Self {
        self.queue_monitor = Some(monitor);
        self
    }

    /// Creates a driver for an accepted channel. The caller owns the startup
    /// sequence and is expected to call `start()` exactly once before
    /// scheduling the connection.
    pub fn create(
        &self,
        channel: Arc<dyn Channel>,
        output: Arc<dyn OutputSink>,
        machine: Arc<dyn StateMachine>,
    ) -> Arc<ConnectionDriver> {
        Arc::new(ConnectionDriver::new(
            channel,
            output,
            machine,
            self.config.max_batch_size,
            self.metrics.clone(),
            self.listener.clone(),
            self.queue_monitor.clone(),
        ))
    }
}
