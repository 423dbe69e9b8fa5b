//! Client-streaming upload: receive file info, stream chunks to disk.

use std::path::Path;

use filedepot_net::call::ServerCall;
use filedepot_proto::{UploadFrame, UploadRsp};
use filedepot_types::{make_error_msg, FileCode, Result};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::path::resolve_filename;

enum UploadState {
    AwaitingInfo,
    Writing {
        file: File,
        filename: String,
        bytes_written: u64,
    },
}

/// Drive one upload stream to completion.
///
/// The first message must be the file info; chunks follow in order and are
/// appended as they arrive. A chunk before the info, or a second info, is a
/// protocol error. The client half-closing in either state completes the
/// upload.
pub async fn receive_upload(root: &Path, call: &mut ServerCall<'_>) -> Result<UploadRsp> {
    let mut state = UploadState::AwaitingInfo;

    while let Some(body) = call.recv_data().await? {
        let frame: UploadFrame = crate::decode_message(&body)?;
        match frame {
            UploadFrame::Info(info) => {
                if matches!(state, UploadState::Writing { .. }) {
                    return make_error_msg(
                        FileCode::DUPLICATE_INFO,
                        "file info already received",
                    );
                }
                let path = resolve_filename(root, &info.filename)?;
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        filedepot_types::Status::with_message(
                            FileCode::CREATE_FAILED,
                            format!("failed to create directory for {}: {e}", info.filename),
                        )
                    })?;
                }
                let file = File::create(&path).await.map_err(|e| {
                    filedepot_types::Status::with_message(
                        FileCode::CREATE_FAILED,
                        format!("failed to create {}: {e}", info.filename),
                    )
                })?;
                debug!(filename = %info.filename, "upload started");
                state = UploadState::Writing {
                    file,
                    filename: info.filename,
                    bytes_written: 0,
                };
            }
            UploadFrame::Chunk(data) => match &mut state {
                UploadState::AwaitingInfo => {
                    return make_error_msg(FileCode::INFO_NOT_RECEIVED, "file info not received");
                }
                UploadState::Writing {
                    file,
                    filename,
                    bytes_written,
                } => {
                    file.write_all(&data).await.map_err(|e| {
                        filedepot_types::Status::with_message(
                            FileCode::WRITE_FAILED,
                            format!("failed to write {filename}: {e}"),
                        )
                    })?;
                    *bytes_written += data.len() as u64;
                }
            },
        }
    }

    match state {
        UploadState::AwaitingInfo => {
            debug!("upload stream closed without file info");
        }
        UploadState::Writing {
            mut file,
            filename,
            bytes_written,
        } => {
            file.flush().await.map_err(|e| {
                filedepot_types::Status::with_message(
                    FileCode::WRITE_FAILED,
                    format!("failed to flush {filename}: {e}"),
                )
            })?;
            info!(filename = %filename, bytes = bytes_written, "upload complete");
        }
    }

    Ok(UploadRsp {
        success: true,
        message: "File uploaded successfully".to_string(),
    })
}
