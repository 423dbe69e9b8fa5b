//! Client for the file service.
//!
//! [`FileClient`] drives one call at a time over a single connection:
//! uploads stream file info plus chunks, downloads collect the server's
//! chunk stream, and listings are a plain request/reply exchange. Server
//! errors arrive as error frames and are surfaced as [`Status`] values.

use std::net::SocketAddr;

use bytes::Bytes;
use filedepot_net::call::status_from_net;
use filedepot_net::frame::{recv_frame, send_frame, Frame, FLAG_CLIENT_STREAMING};
use filedepot_net::socket::Socket;
use filedepot_net_tcp::TcpSocket;
use filedepot_proto::{
    DownloadReq, FileChunk, FileInfo, FileMetadata, ListFilesReq, ListFilesRsp, MethodId,
    UploadFrame, UploadRsp, CHUNK_SIZE, FILE_SERVICE_ID,
};
use filedepot_types::{make_error_msg, RPCCode, Result, Status};
use filedepot_wire::{WireDeserialize, WireSerialize};
use tracing::debug;

fn encode_body<T: WireSerialize>(msg: &T) -> Result<Bytes> {
    let mut buf = Vec::new();
    msg.wire_serialize(&mut buf)
        .map_err(|e| Status::with_message(RPCCode::SEND_FAILED, e.to_string()))?;
    Ok(Bytes::from(buf))
}

fn decode_body<T: WireDeserialize>(body: &Bytes) -> Result<T> {
    let mut offset = 0;
    T::wire_deserialize(body, &mut offset)
        .map_err(|e| Status::with_message(RPCCode::INVALID_MESSAGE_TYPE, e.to_string()))
}

/// A file service client bound to one connection.
pub struct FileClient<S: Socket = TcpSocket> {
    socket: S,
}

impl FileClient<TcpSocket> {
    /// Connect to a file service endpoint over TCP.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let socket = filedepot_net_tcp::connect(addr)
            .await
            .map_err(|e| Status::with_message(RPCCode::CONNECT_FAILED, e.to_string()))?;
        Ok(Self::over(socket))
    }
}

impl<S: Socket> FileClient<S> {
    /// Wrap an already-established connection.
    pub fn over(socket: S) -> Self {
        Self { socket }
    }

    async fn send(&self, frame: &Frame) -> Result<()> {
        send_frame(&self.socket, frame).await.map_err(status_from_net)
    }

    async fn recv(&self) -> Result<Frame> {
        recv_frame(&self.socket).await.map_err(status_from_net)
    }

    async fn send_request(&self, method: MethodId, flags: u8, body: Bytes) -> Result<()> {
        self.send(&Frame::Request {
            service_id: FILE_SERVICE_ID,
            method_id: method as u16,
            flags,
            body,
        })
        .await
    }

    /// Open an upload stream. The caller sends frames and then finishes the
    /// call to get the server's response.
    pub async fn begin_upload(&self) -> Result<UploadCall<'_, S>> {
        self.send_request(MethodId::Upload, FLAG_CLIENT_STREAMING, Bytes::new())
            .await?;
        Ok(UploadCall { client: self })
    }

    /// Upload `data` under `filename`, chunking as needed.
    pub async fn upload(&self, filename: &str, data: &[u8]) -> Result<UploadRsp> {
        debug!(filename, size = data.len(), "uploading file");
        let call = self.begin_upload().await?;
        call.send(&UploadFrame::Info(FileInfo {
            filename: filename.to_string(),
        }))
        .await?;
        for chunk in data.chunks(CHUNK_SIZE) {
            call.send(&UploadFrame::Chunk(Bytes::copy_from_slice(chunk)))
                .await?;
        }
        call.finish().await
    }

    /// Download `filename`, collecting the chunk stream into memory.
    pub async fn download(&self, filename: &str) -> Result<Vec<u8>> {
        debug!(filename, "downloading file");
        let body = encode_body(&DownloadReq {
            filename: filename.to_string(),
        })?;
        self.send_request(MethodId::Download, 0, body).await?;

        let mut data = Vec::new();
        loop {
            match self.recv().await? {
                Frame::Data(body) => {
                    let chunk: FileChunk = decode_body(&body)?;
                    data.extend_from_slice(&chunk.data);
                }
                Frame::End => return Ok(data),
                Frame::Error { code, message } => {
                    return Err(Status::with_message(code, message));
                }
                other => {
                    return make_error_msg(
                        RPCCode::INVALID_MESSAGE_TYPE,
                        format!("unexpected {} frame in download", other.kind_name()),
                    );
                }
            }
        }
    }

    /// List all stored files with their metadata.
    pub async fn list_files(&self) -> Result<Vec<FileMetadata>> {
        let body = encode_body(&ListFilesReq {})?;
        self.send_request(MethodId::ListFiles, 0, body).await?;

        match self.recv().await? {
            Frame::Reply(body) => {
                let rsp: ListFilesRsp = decode_body(&body)?;
                Ok(rsp.files)
            }
            Frame::Error { code, message } => Err(Status::with_message(code, message)),
            other => make_error_msg(
                RPCCode::INVALID_MESSAGE_TYPE,
                format!("unexpected {} frame in list reply", other.kind_name()),
            ),
        }
    }

    /// Close the underlying connection.
    pub async fn close(&self) {
        self.socket.close().await;
    }
}

/// An in-flight upload stream.
pub struct UploadCall<'a, S: Socket> {
    client: &'a FileClient<S>,
}

impl<S: Socket> UploadCall<'_, S> {
    /// Send one upload frame (file info or a chunk).
    pub async fn send(&self, frame: &UploadFrame) -> Result<()> {
        self.client.send(&Frame::Data(encode_body(frame)?)).await
    }

    /// Half-close the stream and wait for the server's response.
    pub async fn finish(self) -> Result<UploadRsp> {
        self.client.send(&Frame::End).await?;
        match self.client.recv().await? {
            Frame::Reply(body) => decode_body(&body),
            Frame::Error { code, message } => Err(Status::with_message(code, message)),
            other => make_error_msg(
                RPCCode::INVALID_MESSAGE_TYPE,
                format!("unexpected {} frame in upload reply", other.kind_name()),
            ),
        }
    }
}
