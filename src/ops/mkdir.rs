use std::fs;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateDirectoryRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDirectoryResponse {
    pub path: PathBuf,
    /// `false` when the directory already existed.
    pub created: bool,
}

/// Creates `path` and any missing parents. An existing directory is not an error.
pub fn create_directory(
    ctx: &Context,
    request: CreateDirectoryRequest,
) -> Result<CreateDirectoryResponse> {
    let path = ctx.validate(&request.path)?;
    let requested = path.requested().to_path_buf();

    match fs::metadata(path.as_path()) {
        Ok(meta) if meta.is_dir() => {
            tracing::debug!(path = %requested.display(), "create_directory: already exists");
            return Ok(CreateDirectoryResponse {
                path: requested,
                created: false,
            });
        }
        Ok(_) => {
            return Err(Error::AlreadyExists(requested));
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(Error::io_path("metadata", &requested, err)),
    }

    let path = ctx.revalidate(&path)?;
    fs::create_dir_all(path.as_path())
        .map_err(|err| Error::io_path("create_dir_all", &requested, err))?;

    tracing::info!(path = %requested.display(), "create_directory");
    Ok(CreateDirectoryResponse {
        path: requested,
        created: true,
    })
}
