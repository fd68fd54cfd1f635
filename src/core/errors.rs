// src/core/errors.rs

//! Defines the primary error type for the connection driver.

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all failures a session can surface.
/// Every variant except `Io`-on-close is fatal for the connection that
/// produced it; they differ only in how they are logged and reported.
#[derive(Error, Debug, Clone)]
pub enum ZirconError {
    /// The client failed authentication, or an authenticated action was
    /// rejected. Logged to the user log only when `loggable` is set.
    #[error("{message}")]
    AuthFatality { message: String, loggable: bool },

    /// The client violated the wire protocol state rules.
    #[error("Protocol breach: {0}")]
    ProtocolBreach(String),

    /// The session was interrupted, typically by server shutdown.
    #[error("Session interrupted")]
    Interrupted,

    /// The worker pool had no capacity to schedule this session.
    #[error("No threads available: {0}")]
    NoThreadsAvailable(String),

    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ZirconError {
    fn from(e: std::io::Error) -> Self {
        ZirconError::Io(Arc::new(e))
    }
}

/// Marker error produced by the worker pool when it rejects a scheduling
/// request because every worker is busy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("connection worker pool rejected the task")]
pub struct PoolRejected;

/// Walks an error's source chain looking for a cause of type `T`.
pub fn has_cause<T: StdError + 'static>(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if e.downcast_ref::<T>().is_some() {
            return true;
        }
        current = e.source();
    }
    false
}
