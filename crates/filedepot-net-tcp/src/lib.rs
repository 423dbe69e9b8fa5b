//! TCP transport implementation for the filedepot networking layer.
//!
//! Provides [`TcpSocket`] and [`TcpListener`] which wrap Tokio's TCP
//! primitives and implement the [`filedepot_net::Socket`] and
//! [`filedepot_net::Listener`] traits.
//!
//! The socket splits a `TcpStream` into independent read/write halves so
//! that sending and receiving can proceed concurrently without holding a
//! single lock over the entire stream. `recv` is length-delimited: it
//! reads the 8-byte message header, then exactly the declared payload, so
//! one call always yields one complete framed message regardless of how
//! TCP segments the stream.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use filedepot_net::error::NetError;
use filedepot_net::message::{MessageHeader, MESSAGE_HEADER_SIZE, MESSAGE_MAX_SIZE};
use filedepot_net::socket::{Listener, Socket};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// TcpSocket
// ---------------------------------------------------------------------------

/// A TCP socket wrapping a Tokio [`TcpStream`](tokio::net::TcpStream).
///
/// The underlying stream is split into independent read and write halves
/// that are each protected by an async mutex, allowing concurrent
/// send/recv from different tasks.
pub struct TcpSocket {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
}

impl TcpSocket {
    /// Wrap an already-connected [`tokio::net::TcpStream`].
    pub fn from_stream(stream: tokio::net::TcpStream) -> Result<Self, NetError> {
        let peer_addr = stream.peer_addr()?;
        let local_addr = stream.local_addr()?;

        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: Arc::new(Mutex::new(read_half)),
            writer: Arc::new(Mutex::new(write_half)),
            peer_addr,
            local_addr,
        })
    }

    /// Send raw bytes over the socket.
    pub async fn send_bytes(&self, data: &[u8]) -> Result<(), NetError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(data).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read one complete framed message (header + payload) from the stream.
    ///
    /// The read lock is held for the whole message so interleaved readers
    /// cannot split a frame.
    pub async fn recv_message(&self) -> Result<Bytes, NetError> {
        let mut reader = self.reader.lock().await;

        let mut header_buf = [0u8; MESSAGE_HEADER_SIZE];
        match reader.read_exact(&mut header_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(NetError::ConnectionClosed);
            }
            Err(e) => return Err(e.into()),
        }

        let header = MessageHeader::from_bytes(&header_buf);
        let size = header.size as usize;
        if size > MESSAGE_MAX_SIZE {
            return Err(NetError::MessageTooLarge {
                size,
                max: MESSAGE_MAX_SIZE,
            });
        }

        let mut message = BytesMut::with_capacity(MESSAGE_HEADER_SIZE + size);
        message.extend_from_slice(&header_buf);
        message.resize(MESSAGE_HEADER_SIZE + size, 0);
        match reader.read_exact(&mut message[MESSAGE_HEADER_SIZE..]).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(NetError::ConnectionClosed);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(message.freeze())
    }

    /// Shut down the socket.
    pub async fn shutdown(&self) {
        // Attempt to shut down the write half; ignore errors (e.g. already closed).
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }
}

impl std::fmt::Debug for TcpSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpSocket")
            .field("peer_addr", &self.peer_addr)
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

#[async_trait]
impl Socket for TcpSocket {
    async fn send(&self, data: Bytes) -> Result<(), NetError> {
        self.send_bytes(&data).await
    }

    async fn recv(&self) -> Result<Bytes, NetError> {
        self.recv_message().await
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    async fn close(&self) {
        self.shutdown().await;
    }
}

// ---------------------------------------------------------------------------
// TcpListener
// ---------------------------------------------------------------------------

/// A TCP listener wrapping [`tokio::net::TcpListener`].
///
/// Accepts incoming TCP connections and yields [`TcpSocket`] instances.
pub struct TcpListener {
    inner: tokio::net::TcpListener,
    local_addr: SocketAddr,
}

impl TcpListener {
    /// Bind to the given [`SocketAddr`].
    pub async fn bind(addr: SocketAddr) -> Result<Self, NetError> {
        let listener = tokio::net::TcpListener::bind(addr).await?;

        // Resolve the actual local address (port may differ if 0 was requested).
        let local_addr = listener.local_addr()?;

        tracing::info!(%local_addr, "TCP listener bound");

        Ok(Self {
            inner: listener,
            local_addr,
        })
    }

    /// Accept the next incoming connection.
    pub async fn accept_socket(&self) -> Result<TcpSocket, NetError> {
        let (stream, peer) = self.inner.accept().await?;

        tracing::debug!(%peer, "accepted TCP connection");

        TcpSocket::from_stream(stream)
    }
}

impl std::fmt::Debug for TcpListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpListener")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

#[async_trait]
impl Listener for TcpListener {
    type Socket = TcpSocket;

    async fn accept(&self) -> Result<TcpSocket, NetError> {
        self.accept_socket().await
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Connect to a remote address and return a [`TcpSocket`].
pub async fn connect(addr: SocketAddr) -> Result<TcpSocket, NetError> {
    tracing::debug!(%addr, "connecting via TCP");
    let stream = tokio::net::TcpStream::connect(addr).await?;
    TcpSocket::from_stream(stream)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use filedepot_net::frame::{recv_frame, send_frame, Frame};

    async fn connected_pair() -> (TcpSocket, TcpSocket) {
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = Listener::local_addr(&listener);

        let accept_handle = tokio::spawn(async move { listener.accept_socket().await.unwrap() });
        let client = connect(addr).await.unwrap();
        let server = accept_handle.await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn test_listener_bind_and_local_addr() {
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let local = Listener::local_addr(&listener);
        assert_eq!(local.ip().to_string(), "127.0.0.1");
        // Port should have been assigned by the OS (nonzero).
        assert_ne!(local.port(), 0);
    }

    #[tokio::test]
    async fn test_connect_and_accept() {
        let (client, server) = connected_pair().await;
        assert_eq!(client.peer_addr, server.local_addr);
        assert_eq!(server.peer_addr, client.local_addr);
    }

    #[tokio::test]
    async fn test_frame_roundtrip() {
        let (client, server) = connected_pair().await;

        let frame = Frame::Data(Bytes::from_static(b"hello over tcp"));
        send_frame(&client, &frame).await.unwrap();

        let received = recv_frame(&server).await.unwrap();
        assert_eq!(received, frame);
    }

    #[tokio::test]
    async fn test_recv_reassembles_one_frame_per_call() {
        // Send several frames back to back; each recv must return exactly
        // one complete frame even though TCP may coalesce the writes.
        let (client, server) = connected_pair().await;

        let frames = vec![
            Frame::Request {
                service_id: 1,
                method_id: 1,
                flags: 1,
                body: Bytes::new(),
            },
            Frame::Data(Bytes::from(vec![0xAB; 4096])),
            Frame::Data(Bytes::from_static(b"tail")),
            Frame::End,
        ];
        for f in &frames {
            send_frame(&client, f).await.unwrap();
        }

        for expected in &frames {
            let got = recv_frame(&server).await.unwrap();
            assert_eq!(&got, expected);
        }
    }

    #[tokio::test]
    async fn test_large_frame() {
        let (client, server) = connected_pair().await;

        // Larger than any single TCP segment.
        let payload: Vec<u8> = (0..2_000_000).map(|i| (i % 251) as u8).collect();
        let frame = Frame::Data(Bytes::from(payload));

        let frame_clone = frame.clone();
        let send_handle = tokio::spawn(async move {
            send_frame(&client, &frame_clone).await.unwrap();
        });

        let received = recv_frame(&server).await.unwrap();
        send_handle.await.unwrap();
        assert_eq!(received, frame);
    }

    #[tokio::test]
    async fn test_close_signals_connection_closed() {
        let (client, server) = connected_pair().await;

        client.shutdown().await;

        let result = server.recv_message().await;
        assert!(matches!(result.unwrap_err(), NetError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_oversize_header_rejected() {
        let (client, server) = connected_pair().await;

        // Hand-craft a header declaring an absurd payload size.
        let bogus = MessageHeader {
            checksum: 0x9D,
            size: (MESSAGE_MAX_SIZE + 1) as u32,
        };
        client.send_bytes(&bogus.to_bytes()).await.unwrap();

        let result = server.recv_message().await;
        assert!(matches!(
            result.unwrap_err(),
            NetError::MessageTooLarge { .. }
        ));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind and then drop the listener so the port is closed.
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = Listener::local_addr(&listener);
        drop(listener);

        let result = connect(addr).await;
        assert!(result.is_err());
    }
}
