//! Server-streaming download: read a stored file and stream it in chunks.

use std::path::Path;

use bytes::Bytes;
use filedepot_net::call::ServerCall;
use filedepot_proto::{DownloadReq, FileChunk, CHUNK_SIZE};
use filedepot_types::{make_error_msg, FileCode, Result, Status};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::path::resolve_filename;

/// Stream the requested file to the client and close the stream.
pub async fn send_file(root: &Path, req: &DownloadReq, call: &mut ServerCall<'_>) -> Result<()> {
    let path = resolve_filename(root, &req.filename)?;

    let mut file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return make_error_msg(
                FileCode::NOT_FOUND,
                format!("file not found: {}", req.filename),
            );
        }
        Err(e) => {
            return make_error_msg(
                FileCode::READ_FAILED,
                format!("failed to open {}: {e}", req.filename),
            );
        }
    };

    let metadata = file.metadata().await.map_err(|e| {
        Status::with_message(
            FileCode::READ_FAILED,
            format!("failed to stat {}: {e}", req.filename),
        )
    })?;
    if metadata.is_dir() {
        return make_error_msg(
            FileCode::IS_DIRECTORY,
            format!("not a regular file: {}", req.filename),
        );
    }

    debug!(filename = %req.filename, size = metadata.len(), "download started");

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut bytes_sent: u64 = 0;
    loop {
        let n = file.read(&mut buf).await.map_err(|e| {
            Status::with_message(
                FileCode::READ_FAILED,
                format!("failed to read {}: {e}", req.filename),
            )
        })?;
        if n == 0 {
            break;
        }
        let chunk = FileChunk {
            data: Bytes::copy_from_slice(&buf[..n]),
        };
        call.send_data(crate::encode_message(&chunk)?).await?;
        bytes_sent += n as u64;
    }

    call.finish().await?;
    info!(filename = %req.filename, bytes = bytes_sent, "download complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use filedepot_net::error::NetError;
    use filedepot_net::frame::Frame;
    use filedepot_net::message::MESSAGE_HEADER_SIZE;
    use filedepot_net::socket::Socket;
    use filedepot_wire::WireDeserialize;
    use parking_lot::Mutex;
    use std::net::SocketAddr;
    use std::path::PathBuf;

    struct MockSocket {
        sent: Mutex<Vec<Bytes>>,
    }

    impl MockSocket {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
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
        async fn send(&self, data: Bytes) -> std::result::Result<(), NetError> {
            self.sent.lock().push(data);
            Ok(())
        }
        async fn recv(&self) -> std::result::Result<Bytes, NetError> {
            Err(NetError::ConnectionClosed)
        }
        fn peer_addr(&self) -> SocketAddr {
            "10.0.0.1:5000".parse().unwrap()
        }
        fn local_addr(&self) -> SocketAddr {
            "127.0.0.1:0".parse().unwrap()
        }
        async fn close(&self) {}
    }

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("filedepot-download-{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn collect_stream(frames: &[Frame]) -> Vec<u8> {
        let mut data = Vec::new();
        for frame in frames {
            match frame {
                Frame::Data(body) => {
                    let mut offset = 0;
                    let chunk = FileChunk::wire_deserialize(body, &mut offset).unwrap();
                    data.extend_from_slice(&chunk.data);
                }
                Frame::End => {}
                other => panic!("unexpected frame: {}", other.kind_name()),
            }
        }
        data
    }

    #[tokio::test]
    async fn test_download_small_file() {
        let dir = test_dir("small");
        std::fs::write(dir.join("small.txt"), b"small payload").unwrap();

        let socket = MockSocket::new();
        let mut call = ServerCall::new(&socket, 0);
        let req = DownloadReq {
            filename: "small.txt".to_string(),
        };
        send_file(&dir, &req, &mut call).await.unwrap();

        let frames = socket.sent_frames();
        assert_eq!(frames.last(), Some(&Frame::End));
        assert_eq!(collect_stream(&frames), b"small payload");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_download_empty_file_sends_only_end() {
        let dir = test_dir("empty");
        std::fs::write(dir.join("empty.bin"), b"").unwrap();

        let socket = MockSocket::new();
        let mut call = ServerCall::new(&socket, 0);
        let req = DownloadReq {
            filename: "empty.bin".to_string(),
        };
        send_file(&dir, &req, &mut call).await.unwrap();

        assert_eq!(socket.sent_frames(), vec![Frame::End]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_download_splits_into_chunks() {
        let dir = test_dir("chunks");
        let payload: Vec<u8> = (0..CHUNK_SIZE + 1024).map(|i| (i % 251) as u8).collect();
        std::fs::write(dir.join("big.bin"), &payload).unwrap();

        let socket = MockSocket::new();
        let mut call = ServerCall::new(&socket, 0);
        let req = DownloadReq {
            filename: "big.bin".to_string(),
        };
        send_file(&dir, &req, &mut call).await.unwrap();

        let frames = socket.sent_frames();
        // One full chunk, one remainder, then End.
        assert_eq!(frames.len(), 3);
        assert_eq!(collect_stream(&frames), payload);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_download_missing_file() {
        let dir = test_dir("missing");

        let socket = MockSocket::new();
        let mut call = ServerCall::new(&socket, 0);
        let req = DownloadReq {
            filename: "no-such-file".to_string(),
        };
        let err = send_file(&dir, &req, &mut call).await.unwrap_err();
        assert_eq!(err.code(), FileCode::NOT_FOUND);
        assert!(socket.sent_frames().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_download_directory_rejected() {
        let dir = test_dir("isdir");
        std::fs::create_dir_all(dir.join("sub")).unwrap();

        let socket = MockSocket::new();
        let mut call = ServerCall::new(&socket, 0);
        let req = DownloadReq {
            filename: "sub".to_string(),
        };
        let err = send_file(&dir, &req, &mut call).await.unwrap_err();
        assert_eq!(err.code(), FileCode::IS_DIRECTORY);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_download_traversal_rejected() {
        let dir = test_dir("traversal");

        let socket = MockSocket::new();
        let mut call = ServerCall::new(&socket, 0);
        let req = DownloadReq {
            filename: "../outside".to_string(),
        };
        let err = send_file(&dir, &req, &mut call).await.unwrap_err();
        assert_eq!(err.code(), FileCode::OUTSIDE_ROOT);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
