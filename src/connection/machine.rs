// src/connection/machine.rs

//! Defines the `StateMachine` trait, the driver's narrow view of the
//! per-connection protocol state machine.

use crate::core::ZirconError;
use async_trait::async_trait;

/// The protocol state machine owned by a connection driver. Jobs mutate it
/// only from the task currently draining the batch; the synchronous methods
/// below are the cross-thread entry points and must not block.
#[async_trait]
pub trait StateMachine: Send + Sync {
    /// Signals the machine to abort whatever it is currently executing,
    /// e.g. a long-running query. Callable from any thread.
    fn interrupt(&self);

    /// Marks the machine for termination so every still-queued job
    /// fast-fails when it eventually runs.
    fn mark_for_termination(&self);

    /// Records a failure that the machine reports to the client on the next
    /// drain pass, before the connection closes.
    fn mark_failed(&self, error: ZirconError);

    /// Revalidates the open transaction, if any. Invoked periodically while
    /// the session is idle so server-side timeouts can terminate it even
    /// when the client is silent.
    async fn validate_transaction(&self) -> Result<(), ZirconError>;

    /// Releases the machine's resources. Called exactly once, during
    /// teardown; errors are logged and swallowed by the caller.
    async fn close(&self) -> Result<(), ZirconError>;
}
