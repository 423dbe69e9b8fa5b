//! Filename validation for storage paths.

use std::path::{Component, Path, PathBuf};

use filedepot_types::{make_error_msg, FileCode, Result, StatusCode};

/// Resolve a client-supplied filename against the storage root.
///
/// The filename may contain subdirectory components but must stay inside
/// the root: absolute paths and `..` components are rejected.
pub fn resolve_filename(root: &Path, filename: &str) -> Result<PathBuf> {
    if filename.is_empty() {
        return make_error_msg(StatusCode::INVALID_ARG, "filename must not be empty");
    }

    for component in Path::new(filename).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return make_error_msg(
                    FileCode::OUTSIDE_ROOT,
                    format!("filename escapes the storage root: {filename}"),
                );
            }
        }
    }

    Ok(root.join(filename))
}
