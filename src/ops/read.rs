use std::path::PathBuf;

use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReadFileRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFileResponse {
    /// Caller-facing path (absolute, normalized); never the resolved real path.
    pub path: PathBuf,
    pub content: String,
}

pub fn read_file(ctx: &Context, request: ReadFileRequest) -> Result<ReadFileResponse> {
    let path = ctx.validate(&request.path)?;
    let content = super::io::read_string_limited(&path, ctx.max_read_bytes())?;
    tracing::debug!(path = %path.requested().display(), bytes = content.len(), "read_file");
    Ok(ReadFileResponse {
        path: path.requested().to_path_buf(),
        content,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReadMultipleFilesRequest {
    pub paths: Vec<PathBuf>,
}

/// Outcome of one path in a batch read. `path` is echoed exactly as the caller sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FileReadOutcome {
    Read { path: PathBuf, content: String },
    Failed { path: PathBuf, message: String },
}

impl FileReadOutcome {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Failed { path, .. } => path,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadMultipleFilesResponse {
    /// One entry per requested path, in request order.
    pub files: Vec<FileReadOutcome>,
}

/// Reads every path independently on the rayon pool. A failure is recorded inline for that path
/// and never affects the others; the batch itself cannot fail.
pub fn read_multiple_files(
    ctx: &Context,
    request: ReadMultipleFilesRequest,
) -> ReadMultipleFilesResponse {
    let files: Vec<FileReadOutcome> = request
        .paths
        .into_par_iter()
        .map(|path| {
            match read_file(ctx, ReadFileRequest { path: path.clone() }) {
                Ok(response) => FileReadOutcome::Read {
                    path,
                    content: response.content,
                },
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "read_multiple_files: entry failed");
                    FileReadOutcome::Failed {
                        path,
                        message: err.to_string(),
                    }
                }
            }
        })
        .collect();

    tracing::debug!(
        total = files.len(),
        failed = files.iter().filter(|file| file.is_failed()).count(),
        "read_multiple_files"
    );
    ReadMultipleFilesResponse { files }
}
