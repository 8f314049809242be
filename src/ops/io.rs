use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

use super::ValidatedPath;

#[cfg(unix)]
fn is_symlink_open_error(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(not(unix))]
fn is_symlink_open_error(_err: &std::io::Error) -> bool {
    false
}

// The path handed in is already fully resolved, so a symlink in the final component means the
// file was swapped after validation.
#[cfg(unix)]
fn open_readonly_nofollow(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = fs::OpenOptions::new();
    options
        .read(true)
        .custom_flags(libc::O_NOFOLLOW | libc::O_NONBLOCK);
    options.open(path)
}

#[cfg(not(unix))]
fn open_readonly_nofollow(path: &Path) -> std::io::Result<fs::File> {
    fs::File::open(path)
}

fn open_regular_file_for_read(path: &ValidatedPath) -> Result<(fs::File, fs::Metadata)> {
    let requested = path.requested();
    let file = open_readonly_nofollow(path.as_path()).map_err(|err| {
        if is_symlink_open_error(&err) {
            return Error::InvalidPath(format!(
                "path {} changed to a symlink during the operation",
                requested.display()
            ));
        }
        Error::io_path("open", requested, err)
    })?;
    let meta = file
        .metadata()
        .map_err(|err| Error::io_path("metadata", requested, err))?;
    if !meta.is_file() {
        return Err(Error::InvalidPath(format!(
            "path {} is not a regular file",
            requested.display()
        )));
    }
    Ok((file, meta))
}

fn file_too_large(path: &Path, size_bytes: u64, max_bytes: u64) -> Error {
    Error::FileTooLarge {
        path: path.to_path_buf(),
        size_bytes,
        max_bytes,
    }
}

pub(super) fn read_bytes_limited(path: &ValidatedPath, max_bytes: u64) -> Result<Vec<u8>> {
    let (file, meta) = open_regular_file_for_read(path)?;
    let requested = path.requested();
    if meta.len() > max_bytes {
        return Err(file_too_large(requested, meta.len(), max_bytes));
    }

    // The file may grow between `metadata` and `read`; never buffer more than the limit.
    let limit = max_bytes.saturating_add(1);
    let mut bytes = Vec::<u8>::new();
    file.take(limit)
        .read_to_end(&mut bytes)
        .map_err(|err| Error::io_path("read", requested, err))?;
    let read_size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if read_size > max_bytes {
        return Err(file_too_large(requested, read_size, max_bytes));
    }
    Ok(bytes)
}

pub(super) fn read_string_limited(path: &ValidatedPath, max_bytes: u64) -> Result<String> {
    let bytes = read_bytes_limited(path, max_bytes)?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(path.requested().to_path_buf()))
}

/// Replaces (or creates) the file at `path` by writing a sibling temp file and renaming it over
/// the target, so readers see either the old content or the new content and never a mix.
///
/// Permissions of an existing target are carried over. The parent directory must exist.
pub(super) fn write_bytes_atomic(path: &ValidatedPath, bytes: &[u8]) -> Result<()> {
    let requested = path.requested();
    let target = path.as_path();

    let existing_perms = match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_file() => Some(meta.permissions()),
        Ok(meta) if meta.file_type().is_symlink() => {
            return Err(Error::InvalidPath(format!(
                "path {} changed to a symlink during the operation",
                requested.display()
            )));
        }
        Ok(_) => {
            return Err(Error::InvalidPath(format!(
                "path {} is not a regular file",
                requested.display()
            )));
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => return Err(Error::io_path("metadata", requested, err)),
    };

    let parent = target.parent().ok_or_else(|| {
        Error::InvalidPath(format!(
            "invalid path {}: missing parent directory",
            requested.display()
        ))
    })?;
    let parent_meta = fs::metadata(parent).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(
            requested
                .parent()
                .map_or_else(|| requested.to_path_buf(), Path::to_path_buf),
        ),
        _ => Error::io_path("metadata", requested, err),
    })?;
    if !parent_meta.is_dir() {
        return Err(Error::InvalidPath(format!(
            "parent of {} is not a directory",
            requested.display()
        )));
    }

    let mut tmp_file = tempfile::Builder::new()
        .prefix(".secure-fs.")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|err| Error::io_path("create_temp", requested, err))?;

    tmp_file
        .as_file_mut()
        .write_all(bytes)
        .map_err(|err| Error::io_path("write", requested, err))?;
    tmp_file
        .as_file_mut()
        .sync_all()
        .map_err(|err| Error::io_path("sync", requested, err))?;

    if let Some(perms) = existing_perms {
        fs::set_permissions(tmp_file.path(), perms)
            .map_err(|err| Error::io_path("set_permissions", requested, err))?;
    }

    tmp_file
        .persist(target)
        .map_err(|err| Error::io_path("replace_file", requested, err.error))?;
    sync_parent_directory(target).map_err(|err| Error::io_path("sync_parent", requested, err))?;
    Ok(())
}

#[cfg(unix)]
pub(super) fn sync_parent_directory(path: &Path) -> std::io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    fs::File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
pub(super) fn sync_parent_directory(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
