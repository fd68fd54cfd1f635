// src/connection/job.rs

//! Defines the `Job` unit of work and its queued representation.

use crate::connection::machine::StateMachine;
use crate::core::ZirconError;
use async_trait::async_trait;
use tokio::time::Instant;

/// A unit of protocol work: given the state machine, performs one protocol
/// step. Produced by the wire decoder; opaque to the driver.
#[async_trait]
pub trait Job: Send {
    /// Performs this job against the connection's state machine. Any `Err`
    /// is a fatality that tears the connection down.
    async fn perform(self: Box<Self>, machine: &dyn StateMachine) -> Result<(), ZirconError>;
}

/// A queue entry: a client job stamped with the instant it was accepted, or
/// the empty sentinel `stop()` enqueues to wake a parked drain so the close
/// runs on the worker thread.
pub enum QueuedJob {
    Client {
        job: Box<dyn Job>,
        enqueued_at: Instant,
    },
    Sentinel,
}
