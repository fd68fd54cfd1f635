// src/connection/monitor.rs

//! Observer traits notified about connection lifetime and queue activity.

use crate::connection::driver::ConnectionDriver;
use crate::connection::job::QueuedJob;

/// Receives connection lifetime events. `created` fires exactly once during
/// `start`, `closed` exactly once during teardown.
pub trait LifecycleListener: Send + Sync {
    fn created(&self, conn: &ConnectionDriver);
    fn closed(&self, conn: &ConnectionDriver);
}

/// Receives queue activity events. `enqueued` fires after the job is
/// visible in the queue, so the monitor may inspect driver state; `drained`
/// is only invoked with a non-empty batch.
pub trait QueueMonitor: Send + Sync {
    fn enqueued(&self, conn: &ConnectionDriver);
    fn drained(&self, conn: &ConnectionDriver, jobs: &[QueuedJob]);
}
