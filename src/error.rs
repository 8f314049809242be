use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The path resolves outside every allowed root. Carries the caller-facing path only; the
    /// resolved real path is never exposed.
    #[error("access denied: path is outside the allowed directories: {0}")]
    OutOfBounds(PathBuf),

    #[error("no such file or directory: {0}")]
    NotFound(PathBuf),

    #[error(
        "edit #{index} could not be applied: match text found {occurrences} times (expected exactly once)"
    )]
    AmbiguousOrMissingMatch { index: usize, occurrences: usize },

    #[error("symlink cycle detected at {0}")]
    CycleDetected(PathBuf),

    #[error("invalid arguments for {operation}: {message}")]
    SchemaValidation { operation: String, message: String },

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("io error during {op} on {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("file is too large ({size_bytes} bytes; max {max_bytes} bytes): {path}")]
    FileTooLarge {
        path: PathBuf,
        size_bytes: u64,
        max_bytes: u64,
    },

    #[error("invalid utf-8 in file: {0}")]
    InvalidUtf8(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub const CODE_OUT_OF_BOUNDS: &'static str = "out_of_bounds";
    pub const CODE_NOT_FOUND: &'static str = "not_found";
    pub const CODE_AMBIGUOUS_OR_MISSING_MATCH: &'static str = "ambiguous_or_missing_match";
    pub const CODE_CYCLE_DETECTED: &'static str = "cycle_detected";
    pub const CODE_SCHEMA_VALIDATION: &'static str = "schema_validation";
    pub const CODE_UNKNOWN_OPERATION: &'static str = "unknown_operation";
    pub const CODE_IO: &'static str = "io";
    pub const CODE_JSON: &'static str = "json";
    pub const CODE_INVALID_CONFIG: &'static str = "invalid_config";
    pub const CODE_INVALID_PATH: &'static str = "invalid_path";
    pub const CODE_INVALID_PATTERN: &'static str = "invalid_pattern";
    pub const CODE_ALREADY_EXISTS: &'static str = "already_exists";
    pub const CODE_FILE_TOO_LARGE: &'static str = "file_too_large";
    pub const CODE_INVALID_UTF8: &'static str = "invalid_utf8";

    /// Stable machine-readable identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfBounds(_) => Self::CODE_OUT_OF_BOUNDS,
            Self::NotFound(_) => Self::CODE_NOT_FOUND,
            Self::AmbiguousOrMissingMatch { .. } => Self::CODE_AMBIGUOUS_OR_MISSING_MATCH,
            Self::CycleDetected(_) => Self::CODE_CYCLE_DETECTED,
            Self::SchemaValidation { .. } => Self::CODE_SCHEMA_VALIDATION,
            Self::UnknownOperation(_) => Self::CODE_UNKNOWN_OPERATION,
            Self::Io { .. } => Self::CODE_IO,
            Self::Json(_) => Self::CODE_JSON,
            Self::InvalidConfig(_) => Self::CODE_INVALID_CONFIG,
            Self::InvalidPath(_) => Self::CODE_INVALID_PATH,
            Self::InvalidPattern(_) => Self::CODE_INVALID_PATTERN,
            Self::AlreadyExists(_) => Self::CODE_ALREADY_EXISTS,
            Self::FileTooLarge { .. } => Self::CODE_FILE_TOO_LARGE,
            Self::InvalidUtf8(_) => Self::CODE_INVALID_UTF8,
        }
    }

    /// Wraps an I/O failure for `path`. A missing file becomes [`Error::NotFound`] so callers can
    /// tell a vanished path apart from other I/O failures.
    pub fn io_path(op: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            _ => Self::Io { op, path, source },
        }
    }
}
