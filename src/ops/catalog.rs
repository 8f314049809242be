//! Names, descriptions, and argument schemas of every dispatchable operation.

use schemars::{JsonSchema, schema_for};
use serde::Serialize;

use crate::error::Result;

use super::{
    CreateDirectoryRequest, DirectoryTreeRequest, EditFileRequest, GetFileInfoRequest,
    ListAllowedDirectoriesRequest, ListDirectoryRequest, MoveFileRequest, ReadFileRequest,
    ReadMultipleFilesRequest, SearchFilesRequest, WriteFileRequest,
};

pub const READ_FILE: &str = "read_file";
pub const READ_MULTIPLE_FILES: &str = "read_multiple_files";
pub const WRITE_FILE: &str = "write_file";
pub const EDIT_FILE: &str = "edit_file";
pub const CREATE_DIRECTORY: &str = "create_directory";
pub const LIST_DIRECTORY: &str = "list_directory";
pub const DIRECTORY_TREE: &str = "directory_tree";
pub const MOVE_FILE: &str = "move_file";
pub const SEARCH_FILES: &str = "search_files";
pub const GET_FILE_INFO: &str = "get_file_info";
pub const LIST_ALLOWED_DIRECTORIES: &str = "list_allowed_directories";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

fn spec<T: JsonSchema>(name: &'static str, description: &'static str) -> Result<OperationSpec> {
    Ok(OperationSpec {
        name,
        description,
        input_schema: serde_json::to_value(schema_for!(T))?,
    })
}

/// Every operation the dispatcher accepts, in a stable order.
pub fn operations() -> Result<Vec<OperationSpec>> {
    Ok(vec![
        spec::<ReadFileRequest>(
            READ_FILE,
            "Read the complete UTF-8 contents of one file inside the allowed directories.",
        )?,
        spec::<ReadMultipleFilesRequest>(
            READ_MULTIPLE_FILES,
            "Read several files at once. A path that cannot be read is reported inline and does \
             not fail the others.",
        )?,
        spec::<WriteFileRequest>(
            WRITE_FILE,
            "Create a file or replace its contents. The parent directory must exist.",
        )?,
        spec::<EditFileRequest>(
            EDIT_FILE,
            "Apply ordered literal replacements to a text file and return a unified diff. Each \
             matchText must occur exactly once. Set dryRun to preview without writing.",
        )?,
        spec::<CreateDirectoryRequest>(
            CREATE_DIRECTORY,
            "Create a directory and any missing parents. Succeeds if it already exists.",
        )?,
        spec::<ListDirectoryRequest>(
            LIST_DIRECTORY,
            "List the direct entries of a directory, each prefixed with [DIR] or [FILE].",
        )?,
        spec::<DirectoryTreeRequest>(
            DIRECTORY_TREE,
            "Return the recursive structure of a directory as JSON entries with name, type, and \
             children.",
        )?,
        spec::<MoveFileRequest>(
            MOVE_FILE,
            "Move or rename a file or directory. Fails if the destination exists.",
        )?,
        spec::<SearchFilesRequest>(
            SEARCH_FILES,
            "Recursively find files and directories whose name matches a pattern, skipping \
             excluded paths.",
        )?,
        spec::<GetFileInfoRequest>(
            GET_FILE_INFO,
            "Report size, timestamps, type, and permissions of a file or directory.",
        )?,
        spec::<ListAllowedDirectoriesRequest>(
            LIST_ALLOWED_DIRECTORIES,
            "List the directories this server is allowed to access.",
        )?,
    ])
}
