//! The file service facade: admission, dispatch and error mapping.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use filedepot_net::call::ServerCall;
use filedepot_net::service::ServiceHandler;
use filedepot_proto::{DownloadReq, ListFilesReq, ListFilesRsp, MethodId, FILE_SERVICE_ID};
use filedepot_types::{RPCCode, Status, StatusCode};
use tracing::debug;

use crate::admission::{AdmissionClass, AdmissionGate, AdmissionPermit};
use crate::config::ServiceConfig;
use crate::{decode_message, download, encode_message, lister, upload};

/// The file service: stores, serves and lists files under one root
/// directory, with per-class admission control.
pub struct FileService {
    root: PathBuf,
    gate: AdmissionGate,
}

impl FileService {
    pub fn new(root: impl Into<PathBuf>, gate: AdmissionGate) -> Self {
        Self {
            root: root.into(),
            gate,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.upload_dir.clone(),
            AdmissionGate::new(config.transfer_limit, config.list_limit),
        )
    }

    fn admit(&self, class: AdmissionClass, rejection: &str) -> Result<AdmissionPermit, Status> {
        self.gate
            .try_acquire(class)
            .ok_or_else(|| Status::with_message(StatusCode::RESOURCE_EXHAUSTED, rejection))
    }
}

#[async_trait]
impl ServiceHandler for FileService {
    fn service_id(&self) -> u16 {
        FILE_SERVICE_ID
    }

    fn service_name(&self) -> &str {
        "files"
    }

    async fn handle(
        &self,
        method_id: u16,
        request: Bytes,
        call: &mut ServerCall<'_>,
    ) -> Result<(), Status> {
        let method = MethodId::try_from(method_id).map_err(|()| {
            Status::with_message(
                RPCCode::INVALID_METHOD_ID,
                format!("unknown file service method: {method_id}"),
            )
        })?;

        debug!(?method, "file service call");

        match method {
            MethodId::Upload => {
                let _permit = self.admit(AdmissionClass::Transfer, "upload limit reached")?;
                let rsp = upload::receive_upload(&self.root, call).await?;
                call.reply(encode_message(&rsp)?).await
            }
            MethodId::Download => {
                let _permit = self.admit(AdmissionClass::Transfer, "download limit reached")?;
                let req: DownloadReq = decode_message(&request)?;
                download::send_file(&self.root, &req, call).await
            }
            MethodId::ListFiles => {
                let _permit = self.admit(AdmissionClass::List, "list files limit reached")?;
                let ListFilesReq {} = decode_message(&request)?;
                let files = lister::list_files(&self.root).await?;
                call.reply(encode_message(&ListFilesRsp { files })?).await
            }
        }
    }
}
