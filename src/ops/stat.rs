use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Context, ValidatedPath};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetFileInfoRequest {
    pub path: PathBuf,
}

/// Normalized metadata for one path. Timestamps are `None` where the platform does not report
/// them (creation time on many Linux filesystems).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub is_directory: bool,
    pub is_file: bool,
    /// Octal permission digits, e.g. `644`.
    pub permissions: String,
}

impl FileInfo {
    /// `key: value` lines in a fixed order. Missing timestamps render as an empty value.
    pub fn to_text(&self) -> String {
        fn timestamp(value: Option<&DateTime<Utc>>) -> String {
            value.map_or_else(String::new, |time| {
                time.to_rfc3339_opts(SecondsFormat::Millis, true)
            })
        }

        [
            format!("size: {}", self.size),
            format!("created: {}", timestamp(self.created.as_ref())),
            format!("modified: {}", timestamp(self.modified.as_ref())),
            format!("accessed: {}", timestamp(self.accessed.as_ref())),
            format!("isDirectory: {}", self.is_directory),
            format!("isFile: {}", self.is_file),
            format!("permissions: {}", self.permissions),
        ]
        .join("\n")
    }
}

fn metadata_time(
    requested: &Path,
    op: &'static str,
    value: std::io::Result<SystemTime>,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Ok(time) => Ok(Some(DateTime::<Utc>::from(time))),
        Err(err) if err.kind() == ErrorKind::Unsupported => Ok(None),
        Err(err) => Err(Error::io_path(op, requested, err)),
    }
}

#[cfg(unix)]
fn permission_digits(meta: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    format!("{:o}", meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permission_digits(meta: &fs::Metadata) -> String {
    if meta.permissions().readonly() {
        "444".to_string()
    } else {
        "666".to_string()
    }
}

/// Maps the metadata of an already validated path. Fails with `NotFound` if the path vanished
/// after validation.
pub(crate) fn stat(path: &ValidatedPath) -> Result<FileInfo> {
    let requested = path.requested();
    let meta =
        fs::metadata(path.as_path()).map_err(|err| Error::io_path("metadata", requested, err))?;

    Ok(FileInfo {
        size: meta.len(),
        created: metadata_time(requested, "metadata.created", meta.created())?,
        modified: metadata_time(requested, "metadata.modified", meta.modified())?,
        accessed: metadata_time(requested, "metadata.accessed", meta.accessed())?,
        is_directory: meta.is_dir(),
        is_file: meta.is_file(),
        permissions: permission_digits(&meta),
    })
}

pub fn get_file_info(ctx: &Context, request: GetFileInfoRequest) -> Result<FileInfo> {
    let path = ctx.validate(&request.path)?;
    let info = stat(&path)?;
    tracing::debug!(path = %path.requested().display(), size = info.size, "get_file_info");
    Ok(info)
}
