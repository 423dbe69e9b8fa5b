use bytes::Bytes;
use filedepot_types::{RPCCode, Status};

use crate::error::NetError;
use crate::frame::{recv_frame, send_frame, Frame, FLAG_CLIENT_STREAMING};
use crate::socket::Socket;

/// Per-call streaming access handed to a `ServiceHandler`.
///
/// Tracks the inbound stream state (whether the client has half-closed
/// with `End`) and whether the handler has sent its terminal frame. The
/// server uses both to keep the connection consistent after a handler
/// error.
pub struct ServerCall<'a> {
    socket: &'a dyn Socket,
    client_streaming: bool,
    half_closed: bool,
    replied: bool,
}

impl<'a> ServerCall<'a> {
    pub fn new(socket: &'a dyn Socket, flags: u8) -> Self {
        Self {
            socket,
            client_streaming: flags & FLAG_CLIENT_STREAMING != 0,
            half_closed: false,
            replied: false,
        }
    }

    /// Whether the request opened a client-streaming call.
    pub fn is_client_streaming(&self) -> bool {
        self.client_streaming
    }

    /// Whether the client has half-closed its stream with `End`.
    pub fn is_half_closed(&self) -> bool {
        self.half_closed
    }

    /// Whether a terminal frame (reply or stream end) has been sent.
    pub fn has_replied(&self) -> bool {
        self.replied
    }

    /// Receive the next streamed message from the client.
    ///
    /// Returns `Some(body)` for a `Data` frame, `None` once the client
    /// half-closes with `End`. Any other frame is a protocol violation.
    pub async fn recv_data(&mut self) -> Result<Option<Bytes>, Status> {
        if self.half_closed {
            return Ok(None);
        }
        let frame = recv_frame(self.socket).await.map_err(status_from_net)?;
        match frame {
            Frame::Data(body) => Ok(Some(body)),
            Frame::End => {
                self.half_closed = true;
                Ok(None)
            }
            other => Err(Status::with_message(
                RPCCode::INVALID_MESSAGE_TYPE,
                format!("expected Data or End, got {}", other.kind_name()),
            )),
        }
    }

    /// Send one streamed message to the client.
    pub async fn send_data(&mut self, body: Bytes) -> Result<(), Status> {
        send_frame(self.socket, &Frame::Data(body))
            .await
            .map_err(status_from_net)
    }

    /// Close the outbound stream normally. Terminal.
    pub async fn finish(&mut self) -> Result<(), Status> {
        send_frame(self.socket, &Frame::End)
            .await
            .map_err(status_from_net)?;
        self.replied = true;
        Ok(())
    }

    /// Send the call's single response body. Terminal.
    pub async fn reply(&mut self, body: Bytes) -> Result<(), Status> {
        send_frame(self.socket, &Frame::Reply(body))
            .await
            .map_err(status_from_net)?;
        self.replied = true;
        Ok(())
    }
}

/// Map a transport error into the RPC status taxonomy.
pub fn status_from_net(err: NetError) -> Status {
    match err {
        NetError::ConnectionClosed => Status::new(RPCCode::SOCKET_CLOSED),
        NetError::Io(e) => Status::with_message(RPCCode::SOCKET_ERROR, e.to_string()),
        NetError::WireError(e) => {
            Status::with_message(RPCCode::INVALID_MESSAGE_TYPE, e.to_string())
        }
        NetError::ServiceError(status) => status,
        other => Status::with_message(RPCCode::SOCKET_ERROR, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageHeader, MESSAGE_HEADER_SIZE};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::net::SocketAddr;

    struct MockSocket {
        sent: Mutex<Vec<Bytes>>,
        recv_data: Mutex<Vec<Bytes>>,
    }

    impl MockSocket {
        fn with_frames(frames: Vec<Frame>) -> Self {
            let messages = frames
                .iter()
                .map(|f| {
                    let payload = f.encode();
                    let header = MessageHeader::for_payload(&payload);
                    let mut message =
                        Vec::with_capacity(MESSAGE_HEADER_SIZE + payload.len());
                    message.extend_from_slice(&header.to_bytes());
                    message.extend_from_slice(&payload);
                    Bytes::from(message)
                })
                .collect();
            Self {
                sent: Mutex::new(Vec::new()),
                recv_data: Mutex::new(messages),
            }
        }

        fn sent_frames(&self) -> Vec<Frame> {
            self.sent
                .lock()
                .iter()
                .map(|msg| Frame::decode(msg.slice(MESSAGE_HEADER_SIZE..)).unwrap())
                .collect()
        }
    }

    #[async_trait]
    impl Socket for MockSocket {
        async fn send(&self, data: Bytes) -> Result<(), NetError> {
            self.sent.lock().push(data);
            Ok(())
        }
        async fn recv(&self) -> Result<Bytes, NetError> {
            let mut queue = self.recv_data.lock();
            if queue.is_empty() {
                Err(NetError::ConnectionClosed)
            } else {
                Ok(queue.remove(0))
            }
        }
        fn peer_addr(&self) -> SocketAddr {
            "10.0.0.1:5000".parse().unwrap()
        }
        fn local_addr(&self) -> SocketAddr {
            "127.0.0.1:0".parse().unwrap()
        }
        async fn close(&self) {}
    }

    #[tokio::test]
    async fn test_recv_data_stream() {
        let socket = MockSocket::with_frames(vec![
            Frame::Data(Bytes::from_static(b"one")),
            Frame::Data(Bytes::from_static(b"two")),
            Frame::End,
        ]);
        let mut call = ServerCall::new(&socket, FLAG_CLIENT_STREAMING);
        assert!(call.is_client_streaming());

        assert_eq!(
            call.recv_data().await.unwrap(),
            Some(Bytes::from_static(b"one"))
        );
        assert_eq!(
            call.recv_data().await.unwrap(),
            Some(Bytes::from_static(b"two"))
        );
        assert_eq!(call.recv_data().await.unwrap(), None);
        assert!(call.is_half_closed());

        // After End, further reads yield None without touching the socket.
        assert_eq!(call.recv_data().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_recv_data_unexpected_frame() {
        let socket = MockSocket::with_frames(vec![Frame::Reply(Bytes::new())]);
        let mut call = ServerCall::new(&socket, FLAG_CLIENT_STREAMING);
        let err = call.recv_data().await.unwrap_err();
        assert_eq!(err.code(), RPCCode::INVALID_MESSAGE_TYPE);
    }

    #[tokio::test]
    async fn test_recv_data_closed() {
        let socket = MockSocket::with_frames(vec![]);
        let mut call = ServerCall::new(&socket, FLAG_CLIENT_STREAMING);
        let err = call.recv_data().await.unwrap_err();
        assert_eq!(err.code(), RPCCode::SOCKET_CLOSED);
    }

    #[tokio::test]
    async fn test_reply_marks_replied() {
        let socket = MockSocket::with_frames(vec![]);
        let mut call = ServerCall::new(&socket, 0);
        assert!(!call.has_replied());
        call.reply(Bytes::from_static(b"done")).await.unwrap();
        assert!(call.has_replied());

        let sent = socket.sent_frames();
        assert_eq!(sent, vec![Frame::Reply(Bytes::from_static(b"done"))]);
    }

    #[tokio::test]
    async fn test_send_data_and_finish() {
        let socket = MockSocket::with_frames(vec![]);
        let mut call = ServerCall::new(&socket, 0);
        call.send_data(Bytes::from_static(b"chunk1")).await.unwrap();
        call.send_data(Bytes::from_static(b"chunk2")).await.unwrap();
        call.finish().await.unwrap();
        assert!(call.has_replied());

        let sent = socket.sent_frames();
        assert_eq!(
            sent,
            vec![
                Frame::Data(Bytes::from_static(b"chunk1")),
                Frame::Data(Bytes::from_static(b"chunk2")),
                Frame::End,
            ]
        );
    }
}
