use bytes::{BufMut, Bytes, BytesMut};
use filedepot_wire::{WireDeserialize, WireSerialize};

use crate::error::NetError;
use crate::message::{MessageHeader, MESSAGE_HEADER_SIZE, MESSAGE_MAX_SIZE};
use crate::socket::Socket;

/// Request flag: the call streams messages from the client after the
/// `Request` frame (terminated by `End`).
pub const FLAG_CLIENT_STREAMING: u8 = 0x01;

const KIND_REQUEST: u8 = 0;
const KIND_DATA: u8 = 1;
const KIND_END: u8 = 2;
const KIND_REPLY: u8 = 3;
const KIND_ERROR: u8 = 4;

/// One protocol frame. Every frame travels as the payload of a
/// `MessageHeader`-framed message; the first payload byte is the kind.
///
/// ```text
/// Request: [0][service_id: u16 LE][method_id: u16 LE][flags: u8][body...]
/// Data:    [1][body...]
/// End:     [2]
/// Reply:   [3][body...]
/// Error:   [4][code: u16 LE][message: String]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Request {
        service_id: u16,
        method_id: u16,
        flags: u8,
        body: Bytes,
    },
    Data(Bytes),
    End,
    Reply(Bytes),
    Error {
        code: u16,
        message: String,
    },
}

impl Frame {
    /// Short name of this frame's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Frame::Request { .. } => "Request",
            Frame::Data(_) => "Data",
            Frame::End => "End",
            Frame::Reply(_) => "Reply",
            Frame::Error { .. } => "Error",
        }
    }

    /// Encode this frame into a message payload.
    pub fn encode(&self) -> Bytes {
        match self {
            Frame::Request {
                service_id,
                method_id,
                flags,
                body,
            } => {
                let mut buf = BytesMut::with_capacity(6 + body.len());
                buf.put_u8(KIND_REQUEST);
                buf.put_u16_le(*service_id);
                buf.put_u16_le(*method_id);
                buf.put_u8(*flags);
                buf.extend_from_slice(body);
                buf.freeze()
            }
            Frame::Data(body) => {
                let mut buf = BytesMut::with_capacity(1 + body.len());
                buf.put_u8(KIND_DATA);
                buf.extend_from_slice(body);
                buf.freeze()
            }
            Frame::End => Bytes::from_static(&[KIND_END]),
            Frame::Reply(body) => {
                let mut buf = BytesMut::with_capacity(1 + body.len());
                buf.put_u8(KIND_REPLY);
                buf.extend_from_slice(body);
                buf.freeze()
            }
            Frame::Error { code, message } => {
                let mut buf = Vec::with_capacity(3 + 4 + message.len());
                buf.push(KIND_ERROR);
                // Infallible for these types.
                let _ = code.wire_serialize(&mut buf);
                let _ = message.wire_serialize(&mut buf);
                Bytes::from(buf)
            }
        }
    }

    /// Decode a frame from a message payload.
    pub fn decode(payload: Bytes) -> Result<Self, NetError> {
        if payload.is_empty() {
            return Err(NetError::InvalidFrameKind(0xFF));
        }
        let kind = payload[0];
        let rest = payload.slice(1..);
        match kind {
            KIND_REQUEST => {
                if rest.len() < 5 {
                    return Err(NetError::IncompleteHeader {
                        need: 5,
                        have: rest.len(),
                    });
                }
                let service_id = u16::from_le_bytes([rest[0], rest[1]]);
                let method_id = u16::from_le_bytes([rest[2], rest[3]]);
                let flags = rest[4];
                Ok(Frame::Request {
                    service_id,
                    method_id,
                    flags,
                    body: rest.slice(5..),
                })
            }
            KIND_DATA => Ok(Frame::Data(rest)),
            KIND_END => Ok(Frame::End),
            KIND_REPLY => Ok(Frame::Reply(rest)),
            KIND_ERROR => {
                let mut offset = 0;
                let code = u16::wire_deserialize(&rest, &mut offset)?;
                let message = String::wire_deserialize(&rest, &mut offset)?;
                Ok(Frame::Error { code, message })
            }
            other => Err(NetError::InvalidFrameKind(other)),
        }
    }
}

/// Frame a payload with a `MessageHeader` and send it over a socket.
///
/// The on-wire format is:
/// ```text
/// [checksum: 4 bytes LE][size: 4 bytes LE][payload: `size` bytes]
/// ```
pub async fn send_frame(socket: &dyn Socket, frame: &Frame) -> Result<(), NetError> {
    let payload = frame.encode();
    if payload.len() > MESSAGE_MAX_SIZE {
        return Err(NetError::MessageTooLarge {
            size: payload.len(),
            max: MESSAGE_MAX_SIZE,
        });
    }

    let header = MessageHeader::for_payload(&payload);

    let mut message = Vec::with_capacity(MESSAGE_HEADER_SIZE + payload.len());
    message.extend_from_slice(&header.to_bytes());
    message.extend_from_slice(&payload);

    socket.send(Bytes::from(message)).await
}

/// Read one framed message from a socket, validate its header and decode
/// the frame.
///
/// The `Socket::recv` implementation must return one complete message
/// (header + payload) per call; stream-oriented transports handle the
/// length-delimited buffering themselves.
pub async fn recv_frame(socket: &dyn Socket) -> Result<Frame, NetError> {
    let data = socket.recv().await?;

    if data.is_empty() {
        return Err(NetError::ConnectionClosed);
    }

    if data.len() < MESSAGE_HEADER_SIZE {
        return Err(NetError::IncompleteHeader {
            need: MESSAGE_HEADER_SIZE,
            have: data.len(),
        });
    }

    let header_bytes: [u8; MESSAGE_HEADER_SIZE] = data[..MESSAGE_HEADER_SIZE]
        .try_into()
        .expect("slice length verified above");
    let header = MessageHeader::from_bytes(&header_bytes);

    let declared_size = header.size as usize;
    if data.len() < MESSAGE_HEADER_SIZE + declared_size {
        return Err(NetError::IncompleteHeader {
            need: MESSAGE_HEADER_SIZE + declared_size,
            have: data.len(),
        });
    }

    let payload = data.slice(MESSAGE_HEADER_SIZE..MESSAGE_HEADER_SIZE + declared_size);
    header.validate(&payload)?;

    Frame::decode(payload)
}
