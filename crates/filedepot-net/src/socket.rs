use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::NetError;

/// Trait representing an abstract network socket.
///
/// Implementations may use TCP, Unix domain sockets, or in-memory queues
/// for testing. Each implementation lives in its own crate
/// (e.g. `filedepot-net-tcp`).
///
/// `recv` must return exactly one complete framed message per call
/// (header + payload); stream transports buffer internally.
#[async_trait]
pub trait Socket: Send + Sync + 'static {
    /// Send data over the socket.
    async fn send(&self, data: Bytes) -> Result<(), NetError>;

    /// Receive one complete framed message from the socket.
    ///
    /// An error of `NetError::ConnectionClosed` indicates the connection
    /// was closed.
    async fn recv(&self) -> Result<Bytes, NetError>;

    /// Return the remote peer address.
    fn peer_addr(&self) -> SocketAddr;

    /// Return the local bind address.
    fn local_addr(&self) -> SocketAddr;

    /// Close the socket gracefully.
    async fn close(&self);
}

/// Trait for accepting incoming connections.
///
/// A `Listener` is bound to a local address and yields connected `Socket`
/// instances. The concrete implementation is transport-specific.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// The type of socket produced when a connection is accepted.
    type Socket: Socket;

    /// Accept the next incoming connection.
    async fn accept(&self) -> Result<Self::Socket, NetError>;

    /// Return the local address this listener is bound to.
    fn local_addr(&self) -> SocketAddr;
}
