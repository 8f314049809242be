use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Error, Result};

use super::Context;

// Joined onto a directory's relative path so that `dir/**` style excludes match the directory
// itself and the whole subtree is pruned before descent.
const EXCLUDE_PROBE_NAME: &str = ".secure-fs-probe";

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchFilesRequest {
    pub path: PathBuf,
    /// Case-insensitive match on the entry name. `*` and `?` are the only wildcards; without
    /// either it is a substring match.
    pub pattern: String,
    /// Globs on the path relative to `path`. A pattern without `*` excludes any entry or
    /// directory with that name anywhere below.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilesResponse {
    pub path: PathBuf,
    /// Depth-first pre-order, siblings sorted by name.
    pub matches: Vec<PathBuf>,
    /// Entries dropped because they could not be read or failed path validation.
    pub skipped_entries: u64,
}

impl SearchFilesResponse {
    pub fn to_text(&self) -> String {
        if self.matches.is_empty() {
            return "No matches found".to_string();
        }
        self.matches
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

// Only `*` and `?` are wildcards in a name pattern; brackets and braces match themselves.
fn escape_name_pattern(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        if matches!(ch, '[' | ']' | '{' | '}') {
            escaped.push('[');
            escaped.push(ch);
            escaped.push(']');
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

fn build_glob(pattern: &str) -> std::result::Result<Glob, globset::Error> {
    let mut builder = GlobBuilder::new(pattern);
    builder.literal_separator(true).case_insensitive(true);
    builder.build()
}

fn compile_name_pattern(pattern: &str) -> Result<GlobMatcher> {
    if pattern.is_empty() {
        return Err(Error::InvalidPattern("search pattern must not be empty".to_string()));
    }
    let escaped = escape_name_pattern(pattern);
    let pattern = if has_wildcard(pattern) {
        escaped
    } else {
        format!("*{escaped}*")
    };
    build_glob(&pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|err| Error::InvalidPattern(format!("invalid search pattern {pattern:?}: {err}")))
}

fn compile_excludes(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for raw in patterns {
        if raw.trim().is_empty() {
            return Err(Error::InvalidPattern(
                "exclude pattern must not be empty".to_string(),
            ));
        }
        let pattern = crate::path_utils::normalize_glob_pattern(raw);
        let pattern = pattern.trim_matches('/');
        let expanded = if pattern.contains('*') {
            vec![pattern.to_string()]
        } else {
            vec![format!("**/{pattern}"), format!("**/{pattern}/**")]
        };
        for glob in expanded {
            builder.add(build_glob(&glob).map_err(|err| {
                Error::InvalidPattern(format!("invalid exclude pattern {raw:?}: {err}"))
            })?);
        }
    }

    builder
        .build()
        .map(Some)
        .map_err(|err| Error::InvalidPattern(format!("invalid exclude patterns: {err}")))
}

fn is_excluded(excludes: Option<&GlobSet>, relative: &Path, is_dir: bool) -> bool {
    let Some(excludes) = excludes else {
        return false;
    };
    excludes.is_match(relative) || (is_dir && excludes.is_match(relative.join(EXCLUDE_PROBE_NAME)))
}

/// Walks the tree under `path` and returns every file or directory whose name matches `pattern`.
///
/// Symlinks are reported if they match but never followed, and every candidate is validated
/// before it is reported; entries that fail validation are skipped, not fatal.
pub fn search_files(ctx: &Context, request: SearchFilesRequest) -> Result<SearchFilesResponse> {
    let matcher = compile_name_pattern(&request.pattern)?;
    let excludes = compile_excludes(&request.exclude_patterns)?;

    let root = ctx.validate(&request.path)?;
    let meta = std::fs::metadata(root.as_path())
        .map_err(|err| Error::io_path("metadata", root.requested(), err))?;
    if !meta.is_dir() {
        return Err(Error::InvalidPath(format!(
            "path {} is not a directory",
            root.requested().display()
        )));
    }

    let root_path = root.as_path();
    let walker = WalkDir::new(root_path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            match entry.path().strip_prefix(root_path) {
                Ok(relative) => !is_excluded(excludes.as_ref(), relative, entry.file_type().is_dir()),
                Err(_) => false,
            }
        });

    let mut matches = Vec::<PathBuf>::new();
    let mut skipped_entries: u64 = 0;
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                return Err(Error::io_path("read_dir", root.requested(), source));
            }
            Err(err) => {
                tracing::warn!(error = %err, "search_files: skipping unreadable entry");
                skipped_entries = skipped_entries.saturating_add(1);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        if !matcher.is_match(entry.file_name()) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root_path) else {
            skipped_entries = skipped_entries.saturating_add(1);
            continue;
        };
        let requested = root.requested().join(relative);
        match ctx.validate(&requested) {
            Ok(_) => matches.push(requested),
            Err(err) => {
                tracing::warn!(
                    path = %requested.display(),
                    error = %err,
                    "search_files: skipping entry that failed validation"
                );
                skipped_entries = skipped_entries.saturating_add(1);
            }
        }
    }

    tracing::debug!(
        path = %root.requested().display(),
        pattern = %request.pattern,
        matches = matches.len(),
        skipped = skipped_entries,
        "search_files"
    );
    Ok(SearchFilesResponse {
        path: root.requested().to_path_buf(),
        matches,
        skipped_entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_pattern_is_case_insensitive_substring() {
        let matcher = compile_name_pattern("Report").expect("compile");
        assert!(matcher.is_match("quarterly-report.txt"));
        assert!(matcher.is_match("REPORT"));
        assert!(!matcher.is_match("summary.txt"));
    }

    #[test]
    fn wildcard_pattern_matches_whole_name() {
        let matcher = compile_name_pattern("*.RS").expect("compile");
        assert!(matcher.is_match("main.rs"));
        assert!(!matcher.is_match("main.rs.bak"));
    }

    #[test]
    fn brackets_and_braces_match_literally() {
        let matcher = compile_name_pattern("[id]").expect("compile");
        assert!(matcher.is_match("[id].tsx"));
        assert!(!matcher.is_match("i.tsx"));

        let matcher = compile_name_pattern("weird{").expect("compile");
        assert!(matcher.is_match("weird{name.txt"));

        let matcher = compile_name_pattern("*{a,b}?.txt").expect("compile");
        assert!(matcher.is_match("x{a,b}1.txt"));
        assert!(!matcher.is_match("xa1.txt"));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let err = compile_name_pattern("").expect_err("empty");
        assert_eq!(err.code(), Error::CODE_INVALID_PATTERN);
    }

    #[test]
    fn bare_exclude_matches_directory_and_its_subtree() {
        let excludes = compile_excludes(&["node_modules".to_string()])
            .expect("compile")
            .expect("non-empty");
        assert!(is_excluded(Some(&excludes), Path::new("node_modules"), true));
        assert!(is_excluded(Some(&excludes), Path::new("a/Node_Modules"), true));
        assert!(is_excluded(
            Some(&excludes),
            Path::new("node_modules/pkg/index.js"),
            false
        ));
        assert!(!is_excluded(Some(&excludes), Path::new("src/modules.rs"), false));
    }

    #[test]
    fn wildcard_exclude_prunes_directory_via_probe() {
        let excludes = compile_excludes(&["target/**".to_string()])
            .expect("compile")
            .expect("non-empty");
        assert!(is_excluded(Some(&excludes), Path::new("target"), true));
        assert!(!is_excluded(Some(&excludes), Path::new("target"), false));
    }
}
