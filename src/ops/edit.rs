use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

/// One literal replacement. `matchText` must occur exactly once in the content as it stands after
/// the preceding edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditOperation {
    #[serde(alias = "oldText")]
    pub match_text: String,
    #[serde(alias = "newText")]
    pub replacement_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditFileRequest {
    pub path: PathBuf,
    pub edits: Vec<EditOperation>,
    /// Compute and report the diff without writing.
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFileResponse {
    pub path: PathBuf,
    /// Whole-file unified diff with `--- original` / `+++ modified` headers, computed on
    /// `\n`-normalized text. A file that used `\r\n` is written back with `\r\n` throughout.
    pub diff: String,
    pub dry_run: bool,
    /// `true` only when new content was actually persisted.
    pub written: bool,
}

impl EditFileResponse {
    /// The diff wrapped in a Markdown `diff` code fence that no backtick run inside it can close.
    pub fn fenced_diff(&self) -> String {
        let longest_run = longest_backtick_run(&self.diff);
        let fence = "`".repeat(longest_run.saturating_add(1).max(3));
        let mut out = String::with_capacity(self.diff.len() + fence.len() * 2 + 8);
        out.push_str(&fence);
        out.push_str("diff\n");
        out.push_str(&self.diff);
        if !self.diff.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&fence);
        out.push_str("\n\n");
        out
    }
}

pub fn edit_file(ctx: &Context, request: EditFileRequest) -> Result<EditFileResponse> {
    let path = ctx.validate(&request.path)?;
    let raw = super::io::read_string_limited(&path, ctx.max_read_bytes())?;
    let original = normalize_line_endings(&raw);

    let modified = apply_edits(&original, &request.edits)?;
    let output = if raw.contains("\r\n") {
        modified.replace('\n', "\r\n")
    } else {
        modified.clone()
    };

    let output_bytes = u64::try_from(output.len()).unwrap_or(u64::MAX);
    if output_bytes > ctx.max_write_bytes() {
        return Err(Error::FileTooLarge {
            path: path.requested().to_path_buf(),
            size_bytes: output_bytes,
            max_bytes: ctx.max_write_bytes(),
        });
    }

    let diff = diffy::create_patch(&original, &modified).to_string();

    let written = !request.dry_run && modified != original;
    if written {
        let path = ctx.revalidate(&path)?;
        super::io::write_bytes_atomic(&path, output.as_bytes())?;
        tracing::info!(
            path = %path.requested().display(),
            edits = request.edits.len(),
            "edit_file"
        );
    } else {
        tracing::debug!(
            path = %path.requested().display(),
            edits = request.edits.len(),
            dry_run = request.dry_run,
            "edit_file: nothing persisted"
        );
    }

    Ok(EditFileResponse {
        path: path.requested().to_path_buf(),
        diff,
        dry_run: request.dry_run,
        written,
    })
}

/// Applies `edits` in order. Every edit sees the output of the previous one; the first edit whose
/// match text is missing or ambiguous aborts the whole batch.
pub(crate) fn apply_edits(content: &str, edits: &[EditOperation]) -> Result<String> {
    let mut current = content.to_string();
    for (index, edit) in edits.iter().enumerate() {
        let match_text = normalize_line_endings(&edit.match_text);
        let replacement = normalize_line_endings(&edit.replacement_text);
        if match_text.is_empty() {
            return Err(Error::AmbiguousOrMissingMatch {
                index,
                occurrences: 0,
            });
        }

        let occurrences = count_occurrences(&current, &match_text);
        if occurrences != 1 {
            return Err(Error::AmbiguousOrMissingMatch { index, occurrences });
        }
        current = current.replacen(match_text.as_str(), &replacement, 1);
    }
    Ok(current)
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

// Overlapping occurrences count separately: `aa` appears twice in `aaa`.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        count += 1;
        let found = start + pos;
        let step = haystack[found..].chars().next().map_or(1, char::len_utf8);
        start = found + step;
    }
    count
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
