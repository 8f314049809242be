use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

use super::Context;

// Mirrors the kernel's own symlink-follow budget; exceeding it is treated as a loop.
const MAX_SYMLINK_HOPS: usize = 40;

/// A path that has been resolved through every symlink and proven to lie inside an allowed root.
///
/// Only [`Context::validate`] constructs these. `as_path` is the real path used for filesystem
/// calls; `requested` is the absolute, lexically normalized form of what the caller sent and is
/// the only form that ever appears in messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    real: PathBuf,
    requested: PathBuf,
}

impl ValidatedPath {
    pub fn as_path(&self) -> &Path {
        &self.real
    }

    pub fn requested(&self) -> &Path {
        &self.requested
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.real
    }

    /// The caller-facing path of a direct child entry named `name`.
    pub(super) fn requested_child(&self, name: &std::ffi::OsStr) -> PathBuf {
        self.requested.join(name)
    }
}

impl AsRef<Path> for ValidatedPath {
    fn as_ref(&self) -> &Path {
        &self.real
    }
}

#[cfg(unix)]
fn is_symlink_loop_error(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(not(unix))]
fn is_symlink_loop_error(_err: &std::io::Error) -> bool {
    false
}

// NOTE: this is path-based validation (canonicalize + component-wise containment), not a
// descriptor-chain walk. A path can be retargeted between validation and use; mutating operations
// call `revalidate` right before the syscall to keep that window small.
impl Context {
    /// Resolves `raw` to a real path and checks that it lies within an allowed root.
    ///
    /// A leading `~` expands to the home directory and relative paths are joined to the working
    /// root. Paths that do not exist yet are validated through their nearest existing ancestor.
    pub fn validate(&self, raw: impl AsRef<Path>) -> Result<ValidatedPath> {
        let raw = raw.as_ref();
        if raw.as_os_str().is_empty() {
            return Err(Error::InvalidPath("path is empty".to_string()));
        }
        let requested = self.absolute_request(raw);
        let real = self.resolve_real(&requested, &requested, 0)?;
        if !self.is_within_roots(&real) {
            tracing::debug!(path = %requested.display(), "path rejected: outside allowed roots");
            return Err(Error::OutOfBounds(requested));
        }
        Ok(ValidatedPath { real, requested })
    }

    /// Runs validation again for a path validated earlier in the same request. Used immediately
    /// before a mutating syscall.
    pub(super) fn revalidate(&self, path: &ValidatedPath) -> Result<ValidatedPath> {
        self.validate(&path.requested)
    }

    /// Like [`Context::validate`], but the returned real path names the directory entry itself
    /// (real parent joined with the final name) rather than what a final symlink points at.
    /// Used by operations that act on the entry, such as rename.
    pub(super) fn validate_entry(&self, raw: impl AsRef<Path>) -> Result<ValidatedPath> {
        let resolved = self.validate(raw)?;
        let requested = resolved.requested;
        let (Some(parent), Some(name)) = (requested.parent(), requested.file_name()) else {
            return Err(Error::InvalidPath(format!(
                "path {} has no parent directory",
                requested.display()
            )));
        };
        let real_parent = self.resolve_real(parent, &requested, 0)?;
        if !self.is_within_roots(&real_parent) {
            // The entry is an allowed root itself; renaming it would change the sandbox.
            return Err(Error::OutOfBounds(requested));
        }
        let real = real_parent.join(name);
        Ok(ValidatedPath { real, requested })
    }

    pub(super) fn is_within_roots(&self, real: &Path) -> bool {
        self.roots
            .iter()
            .any(|root| crate::path_utils::starts_with_segments(real, root))
    }

    fn absolute_request(&self, raw: &Path) -> PathBuf {
        let expanded = crate::path_utils::expand_home(raw);
        let absolute = if expanded.is_absolute() {
            expanded.into_owned()
        } else {
            self.working_root().join(expanded)
        };
        crate::path_utils::normalize_path_lexical(&absolute)
    }

    fn resolve_real(&self, path: &Path, requested: &Path, hops: usize) -> Result<PathBuf> {
        match path.canonicalize() {
            Ok(real) => Ok(real),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                self.resolve_missing(path, requested, hops)
            }
            Err(err) if is_symlink_loop_error(&err) => {
                Err(Error::CycleDetected(requested.to_path_buf()))
            }
            Err(err) => Err(Error::io_path("canonicalize", requested, err)),
        }
    }

    // Walks up from `path` to the nearest ancestor that exists, resolves it, and re-appends the
    // missing segments. A dangling symlink on the way is followed through its target so that a
    // link pointing outside the roots cannot be used to create files there.
    fn resolve_missing(&self, path: &Path, requested: &Path, hops: usize) -> Result<PathBuf> {
        if hops > MAX_SYMLINK_HOPS {
            return Err(Error::CycleDetected(requested.to_path_buf()));
        }

        let mut missing = Vec::<OsString>::new();
        let mut cursor = path.to_path_buf();
        let base = loop {
            match fs::symlink_metadata(&cursor) {
                Ok(meta) if meta.file_type().is_symlink() => {
                    let target = fs::read_link(&cursor)
                        .map_err(|err| Error::io_path("read_link", requested, err))?;
                    let parent = match cursor.parent() {
                        Some(parent) => self.resolve_real(parent, requested, hops + 1)?,
                        None => PathBuf::from(Component::RootDir.as_os_str()),
                    };
                    let target = crate::path_utils::normalize_path_lexical(&parent.join(target));
                    break self.resolve_real(&target, requested, hops + 1)?;
                }
                Ok(_) => {
                    break self.resolve_real(&cursor, requested, hops + 1)?;
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    let Some(name) = cursor.file_name() else {
                        return Err(Error::InvalidPath(format!(
                            "cannot resolve {}",
                            requested.display()
                        )));
                    };
                    missing.push(name.to_os_string());
                    if !cursor.pop() {
                        return Err(Error::NotFound(requested.to_path_buf()));
                    }
                }
                Err(err) => return Err(Error::io_path("symlink_metadata", requested, err)),
            }
        };

        let mut real = base;
        for name in missing.into_iter().rev() {
            real.push(name);
        }
        Ok(real)
    }
}
