// src/connection/output.rs

//! Defines the `OutputSink` trait for buffered protocol responses.

use crate::core::ZirconError;
use async_trait::async_trait;

/// A scoped sink buffering the protocol responses produced while jobs run.
/// Owned exclusively by the connection driver: flushed at the end of each
/// successful drain pass and closed exactly once during teardown.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Flushes buffered responses to the transport.
    async fn flush(&self) -> Result<(), ZirconError>;

    /// Releases the sink without flushing. Errors are logged and swallowed
    /// by the caller so teardown always completes.
    async fn close(&self) -> Result<(), ZirconError>;
}
