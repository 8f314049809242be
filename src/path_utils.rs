//! Lexical path helpers shared by the path guard and the traversal operations.
//!
//! Nothing here touches the filesystem, so nothing here resolves symlinks. Containment checks
//! compare whole components: `/data-other` is never treated as inside `/data`.
//!
//! Invariants of `normalize_path_lexical`:
//! - Removes `.` segments.
//! - Resolves `..` against preceding *normal* segments when possible.
//! - Preserves leading `..` for relative paths (e.g. `../../a/../b` → `../../b`).
//! - For absolute paths, `..` cannot escape the filesystem root (e.g. `/../etc` → `/etc`).
use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

pub(crate) fn normalize_path_lexical(path: &Path) -> PathBuf {
    enum Segment {
        ParentDir,
        Normal(OsString),
    }

    let mut prefix: Option<OsString> = None;
    let mut has_root = false;
    let mut segments: Vec<Segment> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(segments.last(), Some(Segment::Normal(_))) {
                    segments.pop();
                } else if !has_root {
                    segments.push(Segment::ParentDir);
                }
            }
            Component::Normal(part) => segments.push(Segment::Normal(part.to_os_string())),
            Component::RootDir => has_root = true,
            Component::Prefix(prefix_comp) => {
                prefix = Some(prefix_comp.as_os_str().to_os_string());
            }
        }
    }

    let mut out = PathBuf::new();
    if let Some(prefix) = prefix {
        out.push(prefix);
    }
    if has_root {
        out.push(Component::RootDir.as_os_str());
    }
    for segment in segments {
        match segment {
            Segment::ParentDir => out.push(".."),
            Segment::Normal(part) => out.push(part),
        }
    }
    out
}

#[cfg(windows)]
fn components_equal(a: Component<'_>, b: Component<'_>) -> bool {
    a.as_os_str()
        .to_string_lossy()
        .eq_ignore_ascii_case(&b.as_os_str().to_string_lossy())
}

#[cfg(not(windows))]
fn components_equal(a: Component<'_>, b: Component<'_>) -> bool {
    a == b
}

/// `true` when `path` equals `root` or lies beneath it, comparing whole components.
pub(crate) fn starts_with_segments(path: &Path, root: &Path) -> bool {
    strip_prefix_segments(path, root).is_some()
}

/// Returns `path` relative to `root` (empty when they are equal), comparing whole components.
pub(crate) fn strip_prefix_segments(path: &Path, root: &Path) -> Option<PathBuf> {
    let mut path_components = path.components();
    for root_component in root.components() {
        let path_component = path_components.next()?;
        if !components_equal(path_component, root_component) {
            return None;
        }
    }
    Some(path_components.as_path().to_path_buf())
}

/// Expands a leading `~` to the current user's home directory. Paths without one, or hosts
/// without a resolvable home directory, are returned unchanged.
pub(crate) fn expand_home(path: &Path) -> Cow<'_, Path> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => Cow::Owned(home.join(components.as_path())),
            None => Cow::Borrowed(path),
        },
        _ => Cow::Borrowed(path),
    }
}

/// Glob patterns always use `/`; on Windows, `\` in a caller pattern is treated as a separator.
#[cfg(windows)]
pub(crate) fn normalize_glob_pattern(pattern: &str) -> Cow<'_, str> {
    if !pattern.contains('\\') {
        return Cow::Borrowed(pattern);
    }
    Cow::Owned(pattern.replace('\\', "/"))
}

#[cfg(not(windows))]
pub(crate) fn normalize_glob_pattern(pattern: &str) -> Cow<'_, str> {
    Cow::Borrowed(pattern)
}
