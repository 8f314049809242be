use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SandboxConfig;
use crate::error::{Error, Result};

use super::{
    Context, CreateDirectoryRequest, CreateDirectoryResponse, DirectoryTreeRequest,
    DirectoryTreeResponse, EditFileRequest, EditFileResponse, FileInfo, GetFileInfoRequest,
    ListDirectoryRequest, ListDirectoryResponse, MoveFileRequest, MoveFileResponse,
    ReadFileRequest, ReadFileResponse, ReadMultipleFilesRequest, ReadMultipleFilesResponse,
    SearchFilesRequest, SearchFilesResponse, WriteFileRequest, WriteFileResponse,
};

impl Context {
    pub fn new(config: SandboxConfig) -> Result<Self> {
        config.validate()?;

        let mut roots = Vec::<PathBuf>::with_capacity(config.roots.len());
        for root in &config.roots {
            let canonical = root.canonicalize().map_err(|err| {
                Error::InvalidConfig(format!(
                    "failed to canonicalize root {}: {err}",
                    root.display()
                ))
            })?;
            let meta = fs::metadata(&canonical).map_err(|err| {
                Error::InvalidConfig(format!(
                    "failed to stat root {}: {err}",
                    canonical.display()
                ))
            })?;
            if !meta.is_dir() {
                return Err(Error::InvalidConfig(format!(
                    "root {} is not a directory",
                    canonical.display()
                )));
            }
            // Two spellings of the same directory (e.g. via a symlink) collapse into one root.
            if !roots.contains(&canonical) {
                roots.push(canonical);
            }
        }

        tracing::debug!(roots = ?roots, "sandbox roots initialized");
        Ok(Self { config, roots })
    }

    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = crate::config_io::load_config(path)?;
        Self::new(config)
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// The canonicalized allowed roots, in configuration order.
    pub fn allowed_roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Relative request paths are resolved against the first configured root.
    pub(super) fn working_root(&self) -> &Path {
        // `SandboxConfig::validate` guarantees at least one root.
        self.roots.first().map_or(Path::new("/"), PathBuf::as_path)
    }

    pub(super) fn max_read_bytes(&self) -> u64 {
        self.config.limits.max_read_bytes
    }

    pub(super) fn max_write_bytes(&self) -> u64 {
        self.config.limits.max_write_bytes
    }

    pub fn read_file(&self, request: ReadFileRequest) -> Result<ReadFileResponse> {
        super::read_file(self, request)
    }

    pub fn read_multiple_files(&self, request: ReadMultipleFilesRequest) -> ReadMultipleFilesResponse {
        super::read_multiple_files(self, request)
    }

    pub fn write_file(&self, request: WriteFileRequest) -> Result<WriteFileResponse> {
        super::write_file(self, request)
    }

    pub fn edit_file(&self, request: EditFileRequest) -> Result<EditFileResponse> {
        super::edit_file(self, request)
    }

    pub fn create_directory(
        &self,
        request: CreateDirectoryRequest,
    ) -> Result<CreateDirectoryResponse> {
        super::create_directory(self, request)
    }

    pub fn list_directory(&self, request: ListDirectoryRequest) -> Result<ListDirectoryResponse> {
        super::list_directory(self, request)
    }

    pub fn directory_tree(&self, request: DirectoryTreeRequest) -> Result<DirectoryTreeResponse> {
        super::directory_tree(self, request)
    }

    pub fn move_file(&self, request: MoveFileRequest) -> Result<MoveFileResponse> {
        super::move_file(self, request)
    }

    pub fn search_files(&self, request: SearchFilesRequest) -> Result<SearchFilesResponse> {
        super::search_files(self, request)
    }

    pub fn get_file_info(&self, request: GetFileInfoRequest) -> Result<FileInfo> {
        super::get_file_info(self, request)
    }

    /// Runs one named operation and always returns a response envelope.
    pub fn dispatch(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> crate::dispatch::OperationResponse {
        crate::dispatch::dispatch(self, name, arguments)
    }
}
