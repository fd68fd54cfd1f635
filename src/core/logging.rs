// src/core/logging.rs

//! Logging setup and the split between internal and user-facing channels.
//!
//! Internal diagnostics use each module's default tracing target. Messages
//! meant for the operator (authentication warnings, capacity advice) are
//! emitted with [`USER_LOG_TARGET`] so deployments can route them to a
//! separate sink or file.

use tracing_subscriber::filter::EnvFilter;

/// The tracing target for operator-facing log entries.
pub const USER_LOG_TARGET: &str = "zircondb::user";

/// Initializes the global tracing subscriber with a compact single-line
/// format. The filter comes from `RUST_LOG`, falling back to `info`.
/// Intended for binaries and demos embedding the driver; safe to skip when
/// the host process installs its own subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_ansi(true)
        .init();
}
