// src/connection/channel.rs

//! Defines the `Channel` trait, the driver's view of the underlying transport.

use std::net::SocketAddr;

/// The transport a connection was accepted on. Framing and raw I/O stay on
/// the transport side; the driver only needs identity and addressing.
pub trait Channel: Send + Sync {
    /// Stable identifier assigned by the transport when the channel was
    /// accepted.
    fn id(&self) -> &str;

    /// The local address the server accepted this channel on.
    fn server_address(&self) -> SocketAddr;

    /// The remote peer's address.
    fn client_address(&self) -> SocketAddr;
}
