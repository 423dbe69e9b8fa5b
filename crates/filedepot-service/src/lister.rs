//! Directory listing: a complete snapshot of the stored files.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use filedepot_proto::FileMetadata;
use filedepot_types::{FileCode, Result, Status};
use tracing::debug;

fn millis(t: SystemTime) -> i64 {
    DateTime::<Utc>::from(t).timestamp_millis()
}

fn walk_error(path: &Path, e: std::io::Error) -> Status {
    Status::with_message(
        FileCode::WALK_FAILED,
        format!("failed to walk {}: {e}", path.display()),
    )
}

/// Walk the storage root and return metadata for every regular file.
///
/// Filenames are reported relative to the root. The walk is all-or-nothing:
/// any filesystem error fails the whole listing. Creation time is
/// best-effort and falls back to the modification time on filesystems
/// without one.
pub async fn list_files(root: &Path) -> Result<Vec<FileMetadata>> {
    let mut files = Vec::new();
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| walk_error(&dir, e))?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| walk_error(&dir, e))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| walk_error(&path, e))?;

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if !file_type.is_file() {
                debug!(path = %path.display(), "skipping non-regular file");
                continue;
            }

            let metadata = entry.metadata().await.map_err(|e| walk_error(&path, e))?;
            let updated = metadata.modified().map_err(|e| walk_error(&path, e))?;
            let created = metadata.created().unwrap_or(updated);

            let filename = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();

            files.push(FileMetadata {
                filename,
                created_at: millis(created),
                updated_at: millis(updated),
            });
        }
    }

    debug!(count = files.len(), "listed files");
    Ok(files)
}
