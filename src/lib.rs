//! `secure-fs` exposes a small set of filesystem operations (read, write, edit, list, tree,
//! search, move, stat) that are confined to a configured allow-list of root directories.
//!
//! Every caller-supplied path goes through [`Context::validate`], which resolves symlinks and
//! checks component-wise containment before any filesystem call. [`dispatch::dispatch`] maps a
//! named operation and its JSON arguments onto the typed operations and always returns an
//! [`OperationResponse`] envelope.

pub mod config;
pub mod config_io;
pub mod dispatch;
mod error;
pub mod ops;
mod path_utils;
pub mod telemetry;

pub use config::{Limits, SandboxConfig};
pub use dispatch::{ContentBlock, Operation, OperationResponse, dispatch};
pub use error::{Error, Result};

pub use ops::{
    Context, CreateDirectoryRequest, CreateDirectoryResponse, DirectoryTreeRequest,
    DirectoryTreeResponse, EditFileRequest, EditFileResponse, EditOperation, EntryKind,
    FileInfo, FileReadOutcome, GetFileInfoRequest, ListAllowedDirectoriesRequest, ListDirEntry,
    ListDirectoryRequest, ListDirectoryResponse, MoveFileRequest, MoveFileResponse,
    ReadFileRequest, ReadFileResponse, ReadMultipleFilesRequest, ReadMultipleFilesResponse,
    SearchFilesRequest, SearchFilesResponse, TreeEntry, ValidatedPath, WriteFileRequest,
    WriteFileResponse, create_directory, directory_tree, edit_file, get_file_info,
    list_directory, move_file, read_file, read_multiple_files, search_files, write_file,
};
