use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Context, EntryKind, ValidatedPath};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DirectoryTreeRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Present only for directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryTreeResponse {
    pub path: PathBuf,
    pub entries: Vec<TreeEntry>,
    /// Entries left out because they failed path validation, at any depth.
    pub skipped_entries: u64,
}

impl DirectoryTreeResponse {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}

/// Recursively lists `path`. Symlinked directories are followed once validated; revisiting a
/// directory already on the current descent chain fails with `CycleDetected`. Entries that fail
/// validation, such as links resolving outside the roots, are neither listed nor descended.
pub fn directory_tree(ctx: &Context, request: DirectoryTreeRequest) -> Result<DirectoryTreeResponse> {
    let root = ctx.validate(&request.path)?;
    let meta = fs::metadata(root.as_path())
        .map_err(|err| Error::io_path("metadata", root.requested(), err))?;
    if !meta.is_dir() {
        return Err(Error::InvalidPath(format!(
            "path {} is not a directory",
            root.requested().display()
        )));
    }

    let mut walk = TreeWalk {
        ctx,
        on_stack: HashSet::new(),
        skipped_entries: 0,
    };
    let entries = walk.build(&root)?;
    tracing::debug!(
        path = %root.requested().display(),
        top_level = entries.len(),
        skipped = walk.skipped_entries,
        "directory_tree"
    );
    Ok(DirectoryTreeResponse {
        path: root.requested().to_path_buf(),
        entries,
        skipped_entries: walk.skipped_entries,
    })
}

struct TreeWalk<'a> {
    ctx: &'a Context,
    on_stack: HashSet<PathBuf>,
    skipped_entries: u64,
}

impl TreeWalk<'_> {
    fn build(&mut self, dir: &ValidatedPath) -> Result<Vec<TreeEntry>> {
        if !self.on_stack.insert(dir.as_path().to_path_buf()) {
            return Err(Error::CycleDetected(dir.requested().to_path_buf()));
        }

        let read_dir = fs::read_dir(dir.as_path())
            .map_err(|err| Error::io_path("read_dir", dir.requested(), err))?;
        let mut entries = Vec::<TreeEntry>::new();
        for entry in read_dir {
            let entry = entry.map_err(|err| Error::io_path("read_dir", dir.requested(), err))?;
            let name = entry.file_name();
            let requested = dir.requested_child(&name);
            let child = match self.ctx.validate(&requested) {
                Ok(child) => child,
                Err(err @ Error::CycleDetected(_)) => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        path = %requested.display(),
                        error = %err,
                        "directory_tree: skipping entry that failed validation"
                    );
                    self.skipped_entries = self.skipped_entries.saturating_add(1);
                    continue;
                }
            };

            // A dangling symlink has nothing to descend into and lists as a file.
            let is_dir = fs::metadata(child.as_path()).is_ok_and(|meta| meta.is_dir());
            let children = if is_dir {
                Some(self.build(&child)?)
            } else {
                None
            };
            entries.push(TreeEntry {
                name: name.to_string_lossy().into_owned(),
                kind: EntryKind::from_is_dir(is_dir),
                children,
            });
        }

        self.on_stack.remove(dir.as_path());
        Ok(entries)
    }
}
