use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Limits {
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: u64,
    #[serde(default = "default_max_write_bytes")]
    pub max_write_bytes: u64,
}

const fn default_max_read_bytes() -> u64 {
    1024 * 1024
}

const fn default_max_write_bytes() -> u64 {
    1024 * 1024
}

// Guardrails against misconfiguration; a single request never buffers more than this.
const MAX_READ_BYTES_HARD_CAP: u64 = 256 * 1024 * 1024;
const MAX_WRITE_BYTES_HARD_CAP: u64 = 256 * 1024 * 1024;

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_read_bytes: default_max_read_bytes(),
            max_write_bytes: default_max_write_bytes(),
        }
    }
}

fn validate_u64_limit(value: u64, field: &str, hard_cap: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidConfig(format!("{field} must be > 0")));
    }
    if value > hard_cap {
        return Err(Error::InvalidConfig(format!(
            "{field} must be <= {hard_cap}"
        )));
    }
    Ok(())
}

/// Startup configuration: the allowed roots and the I/O limits applied to every request.
///
/// Roots are kept as given here. `ops::Context::new` canonicalizes them and checks that each one
/// is an existing directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    pub roots: Vec<PathBuf>,
    #[serde(default)]
    pub limits: Limits,
}

impl SandboxConfig {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            limits: Limits::default(),
        }
    }

    /// Appends roots supplied from another source (e.g. command-line flags) after the ones already
    /// present, skipping exact duplicates.
    pub fn extend_roots<I, P>(&mut self, roots: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for root in roots {
            let root = root.into();
            if !self.roots.contains(&root) {
                self.roots.push(root);
            }
        }
    }

    /// Structural validation only: no filesystem IO happens here.
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one allowed root directory is required".to_string(),
            ));
        }
        validate_u64_limit(
            self.limits.max_read_bytes,
            "limits.max_read_bytes",
            MAX_READ_BYTES_HARD_CAP,
        )?;
        validate_u64_limit(
            self.limits.max_write_bytes,
            "limits.max_write_bytes",
            MAX_WRITE_BYTES_HARD_CAP,
        )?;

        let mut seen = HashSet::new();
        for root in &self.roots {
            if root.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("root path is empty".to_string()));
            }
            if !root.is_absolute() {
                return Err(Error::InvalidConfig(format!(
                    "root path must be absolute: {}",
                    root.display()
                )));
            }
            let normalized = crate::path_utils::normalize_path_lexical(root);
            if !seen.insert(normalized) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate root: {}",
                    root.display()
                )));
            }
        }
        Ok(())
    }
}
