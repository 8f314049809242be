use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::SandboxConfig;

pub mod catalog;
mod context;
mod edit;
mod guard;
mod io;
mod list_dir;
mod mkdir;
mod move_path;
mod read;
mod search;
mod stat;
mod tree;
mod write;

pub use edit::{EditFileRequest, EditFileResponse, EditOperation, edit_file};
pub use guard::ValidatedPath;
pub use list_dir::{ListDirEntry, ListDirectoryRequest, ListDirectoryResponse, list_directory};
pub use mkdir::{CreateDirectoryRequest, CreateDirectoryResponse, create_directory};
pub use move_path::{MoveFileRequest, MoveFileResponse, move_file};
pub use read::{
    FileReadOutcome, ReadFileRequest, ReadFileResponse, ReadMultipleFilesRequest,
    ReadMultipleFilesResponse, read_file, read_multiple_files,
};
pub use search::{SearchFilesRequest, SearchFilesResponse, search_files};
pub use stat::{FileInfo, GetFileInfoRequest, get_file_info};
pub use tree::{DirectoryTreeRequest, DirectoryTreeResponse, TreeEntry, directory_tree};
pub use write::{WriteFileRequest, WriteFileResponse, write_file};


/// Request-independent state shared by every operation: the startup configuration and the
/// canonicalized allowed roots. Built once and passed by reference; never mutated afterwards.
pub struct Context {
    config: SandboxConfig,
    roots: Vec<PathBuf>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("roots", &self.roots)
            .field("limits", &self.config.limits)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub(crate) fn from_is_dir(is_dir: bool) -> Self {
        if is_dir { Self::Directory } else { Self::File }
    }
}

/// `list_allowed_directories` takes no arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListAllowedDirectoriesRequest {}
