//! Maps `(operation name, argument payload)` pairs onto typed operations and renders every
//! outcome, success or failure, as an [`OperationResponse`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ops::catalog;
use crate::ops::{
    Context, CreateDirectoryRequest, DirectoryTreeRequest, EditFileRequest, FileReadOutcome,
    GetFileInfoRequest, ListAllowedDirectoriesRequest, ListDirectoryRequest, MoveFileRequest,
    ReadFileRequest, ReadMultipleFilesRequest, SearchFilesRequest, WriteFileRequest,
};

/// One fully typed request. Only [`Operation::parse`] sees untyped arguments.
#[derive(Debug, Clone)]
pub enum Operation {
    ReadFile(ReadFileRequest),
    ReadMultipleFiles(ReadMultipleFilesRequest),
    WriteFile(WriteFileRequest),
    EditFile(EditFileRequest),
    CreateDirectory(CreateDirectoryRequest),
    ListDirectory(ListDirectoryRequest),
    DirectoryTree(DirectoryTreeRequest),
    MoveFile(MoveFileRequest),
    SearchFiles(SearchFilesRequest),
    GetFileInfo(GetFileInfoRequest),
    ListAllowedDirectories(ListAllowedDirectoriesRequest),
}

fn parse_args<T: DeserializeOwned>(operation: &str, arguments: serde_json::Value) -> Result<T> {
    let arguments = match arguments {
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|err| Error::SchemaValidation {
        operation: operation.to_string(),
        message: err.to_string(),
    })
}

impl Operation {
    pub fn parse(name: &str, arguments: serde_json::Value) -> Result<Self> {
        let op = match name {
            catalog::READ_FILE => Self::ReadFile(parse_args(name, arguments)?),
            catalog::READ_MULTIPLE_FILES => Self::ReadMultipleFiles(parse_args(name, arguments)?),
            catalog::WRITE_FILE => Self::WriteFile(parse_args(name, arguments)?),
            catalog::EDIT_FILE => Self::EditFile(parse_args(name, arguments)?),
            catalog::CREATE_DIRECTORY => Self::CreateDirectory(parse_args(name, arguments)?),
            catalog::LIST_DIRECTORY => Self::ListDirectory(parse_args(name, arguments)?),
            catalog::DIRECTORY_TREE => Self::DirectoryTree(parse_args(name, arguments)?),
            catalog::MOVE_FILE => Self::MoveFile(parse_args(name, arguments)?),
            catalog::SEARCH_FILES => Self::SearchFiles(parse_args(name, arguments)?),
            catalog::GET_FILE_INFO => Self::GetFileInfo(parse_args(name, arguments)?),
            catalog::LIST_ALLOWED_DIRECTORIES => {
                Self::ListAllowedDirectories(parse_args(name, arguments)?)
            }
            other => return Err(Error::UnknownOperation(other.to_string())),
        };
        Ok(op)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadFile(_) => catalog::READ_FILE,
            Self::ReadMultipleFiles(_) => catalog::READ_MULTIPLE_FILES,
            Self::WriteFile(_) => catalog::WRITE_FILE,
            Self::EditFile(_) => catalog::EDIT_FILE,
            Self::CreateDirectory(_) => catalog::CREATE_DIRECTORY,
            Self::ListDirectory(_) => catalog::LIST_DIRECTORY,
            Self::DirectoryTree(_) => catalog::DIRECTORY_TREE,
            Self::MoveFile(_) => catalog::MOVE_FILE,
            Self::SearchFiles(_) => catalog::SEARCH_FILES,
            Self::GetFileInfo(_) => catalog::GET_FILE_INFO,
            Self::ListAllowedDirectories(_) => catalog::LIST_ALLOWED_DIRECTORIES,
        }
    }

    /// Runs the operation and renders its text result.
    pub fn execute(self, ctx: &Context) -> Result<String> {
        match self {
            Self::ReadFile(request) => Ok(ctx.read_file(request)?.content),
            Self::ReadMultipleFiles(request) => {
                let response = ctx.read_multiple_files(request);
                Ok(response
                    .files
                    .iter()
                    .map(render_read_outcome)
                    .collect::<Vec<_>>()
                    .join("\n---\n"))
            }
            Self::WriteFile(request) => {
                let path = request.path.clone();
                ctx.write_file(request)?;
                Ok(format!("Successfully wrote to {}", path.display()))
            }
            Self::EditFile(request) => Ok(ctx.edit_file(request)?.fenced_diff()),
            Self::CreateDirectory(request) => {
                let path = request.path.clone();
                ctx.create_directory(request)?;
                Ok(format!("Successfully created directory {}", path.display()))
            }
            Self::ListDirectory(request) => Ok(ctx.list_directory(request)?.to_text()),
            Self::DirectoryTree(request) => ctx.directory_tree(request)?.to_json_pretty(),
            Self::MoveFile(request) => {
                let (source, destination) = (request.source.clone(), request.destination.clone());
                ctx.move_file(request)?;
                Ok(format!(
                    "Successfully moved {} to {}",
                    source.display(),
                    destination.display()
                ))
            }
            Self::SearchFiles(request) => Ok(ctx.search_files(request)?.to_text()),
            Self::GetFileInfo(request) => Ok(ctx.get_file_info(request)?.to_text()),
            Self::ListAllowedDirectories(ListAllowedDirectoriesRequest {}) => {
                let mut text = String::from("Allowed directories:");
                for root in ctx.allowed_roots() {
                    text.push('\n');
                    text.push_str(&root.display().to_string());
                }
                Ok(text)
            }
        }
    }
}

fn render_read_outcome(outcome: &FileReadOutcome) -> String {
    match outcome {
        FileReadOutcome::Read { path, content } => format!("{}:\n{content}\n", path.display()),
        FileReadOutcome::Failed { path, message } => {
            format!("{}: Error - {message}", path.display())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub text: String,
}

/// The envelope every dispatched call produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl OperationResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock {
                kind: ContentKind::Text,
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(err: &Error) -> Self {
        Self {
            content: vec![ContentBlock {
                kind: ContentKind::Text,
                text: format!("Error: {err}"),
            }],
            is_error: true,
        }
    }

    /// Concatenated text of all content blocks.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parses, runs, and renders one call. Never fails: every error becomes an `isError` response.
pub fn dispatch(ctx: &Context, name: &str, arguments: serde_json::Value) -> OperationResponse {
    let span = tracing::debug_span!("dispatch", operation = name);
    let _entered = span.enter();

    match Operation::parse(name, arguments).and_then(|op| op.execute(ctx)) {
        Ok(text) => OperationResponse::text(text),
        Err(err) => {
            tracing::debug!(code = err.code(), error = %err, "operation failed");
            OperationResponse::error(&err)
        }
    }
}
