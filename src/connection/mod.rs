// src/connection/mod.rs

//! Manages the execution of a single client connection: job queueing,
//! cooperative batch draining, fatality handling, and teardown.

// Declare the private sub-modules of the `connection` module.
mod channel;
mod driver;
mod factory;
mod job;
mod machine;
mod monitor;
mod output;
mod queue;

// Publicly re-export the primary types from the sub-modules.
// This creates a clean public API for the `connection` module, hiding the
// internal file structure from the rest of the crate.
pub use channel::Channel;
pub use driver::ConnectionDriver;
pub use factory::ConnectionDriverFactory;
pub use job::{Job, QueuedJob};
pub use machine::StateMachine;
pub use monitor::{LifecycleListener, QueueMonitor};
pub use output::OutputSink;
pub use queue::JobQueue;
