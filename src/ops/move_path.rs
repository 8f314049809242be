use std::fs;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Context, EntryKind};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoveFileRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveFileResponse {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Renames a file or directory. Both ends must lie inside the allowed roots and an existing
/// destination is never replaced.
pub fn move_file(ctx: &Context, request: MoveFileRequest) -> Result<MoveFileResponse> {
    let source = ctx.validate_entry(&request.source)?;
    let destination = ctx.validate_entry(&request.destination)?;

    let meta = fs::symlink_metadata(source.as_path())
        .map_err(|err| Error::io_path("metadata", source.requested(), err))?;
    let kind = EntryKind::from_is_dir(meta.is_dir());

    match fs::symlink_metadata(destination.as_path()) {
        Ok(_) => return Err(Error::AlreadyExists(destination.requested().to_path_buf())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(Error::io_path("metadata", destination.requested(), err)),
    }

    if kind == EntryKind::Directory
        && crate::path_utils::starts_with_segments(destination.as_path(), source.as_path())
    {
        return Err(Error::InvalidPath(format!(
            "cannot move directory {} into itself",
            source.requested().display()
        )));
    }

    let source = ctx.validate_entry(source.requested())?;
    let destination = ctx.validate_entry(destination.requested())?;
    fs::rename(source.as_path(), destination.as_path())
        .map_err(|err| Error::io_path("rename", source.requested(), err))?;
    super::io::sync_parent_directory(destination.as_path())
        .map_err(|err| Error::io_path("sync_parent", destination.requested(), err))?;

    tracing::info!(
        source = %source.requested().display(),
        destination = %destination.requested().display(),
        "move_file"
    );
    Ok(MoveFileResponse {
        source: source.requested().to_path_buf(),
        destination: destination.requested().to_path_buf(),
        kind,
    })
}
