use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WriteFileRequest {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteFileResponse {
    pub path: PathBuf,
    pub bytes_written: u64,
    /// `true` when the file did not exist before the write.
    pub created: bool,
}

/// Creates `path` or replaces its content. The parent directory must already exist.
pub fn write_file(ctx: &Context, request: WriteFileRequest) -> Result<WriteFileResponse> {
    let bytes_written = u64::try_from(request.content.len()).unwrap_or(u64::MAX);
    if bytes_written > ctx.max_write_bytes() {
        return Err(Error::FileTooLarge {
            path: request.path,
            size_bytes: bytes_written,
            max_bytes: ctx.max_write_bytes(),
        });
    }

    let path = ctx.validate(&request.path)?;
    let created = !path.as_path().exists();

    let path = ctx.revalidate(&path)?;
    super::io::write_bytes_atomic(&path, request.content.as_bytes())?;

    tracing::info!(
        path = %path.requested().display(),
        bytes = bytes_written,
        created,
        "write_file"
    );
    Ok(WriteFileResponse {
        path: path.requested().to_path_buf(),
        bytes_written,
        created,
    })
}
