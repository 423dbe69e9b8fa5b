//! File service RPC types.
//!
//! Service methods:
//!   1 - upload (client-streaming: UploadFrame*, UploadRsp)
//!   2 - download (DownloadReq, server-streaming: FileChunk*)
//!   3 - listFiles (ListFilesReq, ListFilesRsp)

use bytes::Bytes;
use filedepot_wire::{WireDeserialize, WireError, WireSerialize};
use serde::{Deserialize, Serialize};

/// Service identifier of the file service.
pub const FILE_SERVICE_ID: u16 = 1;

/// Preferred payload size of one streamed file chunk.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Method identifiers of the file service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MethodId {
    Upload = 1,
    Download = 2,
    ListFiles = 3,
}

impl TryFrom<u16> for MethodId {
    type Error = ();
    fn try_from(v: u16) -> Result<Self, ()> {
        match v {
            1 => Ok(Self::Upload),
            2 => Ok(Self::Download),
            3 => Ok(Self::ListFiles),
            _ => Err(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// Metadata announcing an upload; must precede any chunk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
}

impl WireSerialize for FileInfo {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        self.filename.wire_serialize(buf)
    }
}

impl WireDeserialize for FileInfo {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        Ok(Self {
            filename: String::wire_deserialize(buf, offset)?,
        })
    }
}

/// One message of an upload stream: either the leading file info or a
/// payload chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadFrame {
    Info(FileInfo),
    Chunk(Bytes),
}

impl WireSerialize for UploadFrame {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        match self {
            UploadFrame::Info(info) => {
                0u8.wire_serialize(buf)?;
                info.wire_serialize(buf)
            }
            UploadFrame::Chunk(data) => {
                1u8.wire_serialize(buf)?;
                data.wire_serialize(buf)
            }
        }
    }
}

impl WireDeserialize for UploadFrame {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        let tag = u8::wire_deserialize(buf, offset)?;
        match tag {
            0 => Ok(UploadFrame::Info(FileInfo::wire_deserialize(buf, offset)?)),
            1 => Ok(UploadFrame::Chunk(Bytes::wire_deserialize(buf, offset)?)),
            _ => Err(WireError::InvalidEnumVariant {
                enum_name: "UploadFrame",
                value: tag as u64,
            }),
        }
    }
}

/// Reply to a completed upload stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UploadRsp {
    pub success: bool,
    pub message: String,
}

impl WireSerialize for UploadRsp {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        self.success.wire_serialize(buf)?;
        self.message.wire_serialize(buf)
    }
}

impl WireDeserialize for UploadRsp {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        Ok(Self {
            success: bool::wire_deserialize(buf, offset)?,
            message: String::wire_deserialize(buf, offset)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DownloadReq {
    pub filename: String,
}

impl WireSerialize for DownloadReq {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        self.filename.wire_serialize(buf)
    }
}

impl WireDeserialize for DownloadReq {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        Ok(Self {
            filename: String::wire_deserialize(buf, offset)?,
        })
    }
}

/// One chunk of a download stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileChunk {
    pub data: Bytes,
}

impl WireSerialize for FileChunk {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        self.data.wire_serialize(buf)
    }
}

impl WireDeserialize for FileChunk {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        Ok(Self {
            data: Bytes::wire_deserialize(buf, offset)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ListFiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListFilesReq {}

impl WireSerialize for ListFilesReq {
    fn wire_serialize(&self, _buf: &mut Vec<u8>) -> Result<(), WireError> {
        Ok(())
    }
}

impl WireDeserialize for ListFilesReq {
    fn wire_deserialize(_buf: &[u8], _offset: &mut usize) -> Result<Self, WireError> {
        Ok(Self {})
    }
}

/// Metadata of one stored file. Timestamps are Unix-epoch milliseconds;
/// `created_at` is best-effort and may equal `updated_at` on filesystems
/// without a creation time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl WireSerialize for FileMetadata {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        self.filename.wire_serialize(buf)?;
        self.created_at.wire_serialize(buf)?;
        self.updated_at.wire_serialize(buf)
    }
}

impl WireDeserialize for FileMetadata {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        Ok(Self {
            filename: String::wire_deserialize(buf, offset)?,
            created_at: i64::wire_deserialize(buf, offset)?,
            updated_at: i64::wire_deserialize(buf, offset)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListFilesRsp {
    pub files: Vec<FileMetadata>,
}

impl WireSerialize for ListFilesRsp {
    fn wire_serialize(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        self.files.wire_serialize(buf)
    }
}

impl WireDeserialize for ListFilesRsp {
    fn wire_deserialize(buf: &[u8], offset: &mut usize) -> Result<Self, WireError> {
        Ok(Self {
            files: Vec::<FileMetadata>::wire_deserialize(buf, offset)?,
        })
    }
}
