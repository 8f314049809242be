use std::fs;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Context, EntryKind};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListDirectoryRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDirectoryResponse {
    pub path: PathBuf,
    /// Entries in the order the directory listing returned them.
    pub entries: Vec<ListDirEntry>,
}

impl ListDirectoryResponse {
    /// `[DIR] name` / `[FILE] name`, one entry per line.
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| match entry.kind {
                EntryKind::Directory => format!("[DIR] {}", entry.name),
                EntryKind::File => format!("[FILE] {}", entry.name),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn list_directory(ctx: &Context, request: ListDirectoryRequest) -> Result<ListDirectoryResponse> {
    let dir = ctx.validate(&request.path)?;
    let requested = dir.requested().to_path_buf();

    let meta =
        fs::metadata(dir.as_path()).map_err(|err| Error::io_path("metadata", &requested, err))?;
    if !meta.is_dir() {
        return Err(Error::InvalidPath(format!(
            "path {} is not a directory",
            requested.display()
        )));
    }

    let mut entries = Vec::<ListDirEntry>::new();
    for entry in
        fs::read_dir(dir.as_path()).map_err(|err| Error::io_path("read_dir", &requested, err))?
    {
        let entry = entry.map_err(|err| Error::io_path("read_dir", &requested, err))?;
        // `file_type` does not follow symlinks, so a link to a directory lists as a file here.
        let is_dir = entry
            .file_type()
            .map_err(|err| Error::io_path("file_type", dir.requested_child(&entry.file_name()), err))?
            .is_dir();
        entries.push(ListDirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind: EntryKind::from_is_dir(is_dir),
        });
    }

    tracing::debug!(path = %requested.display(), entries = entries.len(), "list_directory");
    Ok(ListDirectoryResponse {
        path: requested,
        entries,
    })
}
