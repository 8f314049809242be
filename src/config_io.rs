use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::{Error, Result, SandboxConfig};

const MAX_CONFIG_BYTES: u64 = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` selects JSON; `.toml` or no extension selects TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            None => Ok(Self::Toml),
            Some(other) => Err(Error::InvalidConfig(format!(
                "{}: unsupported config extension {other:?}; expected .toml or .json",
                path.display()
            ))),
        }
    }

    pub fn parse(self, raw: &str) -> Result<SandboxConfig> {
        let parsed = match self {
            Self::Json => serde_json::from_str(raw).map_err(|err| err.to_string()),
            Self::Toml => toml::from_str(raw).map_err(|err| err.to_string()),
        };
        parsed.map_err(|message| Error::InvalidConfig(format!("invalid {self:?} config: {message}")))
    }
}

/// Reads a sandbox configuration file.
///
/// Relative roots are anchored at the directory holding the file, so a config can sit next to
/// the trees it grants access to. The result is not validated yet; see [`startup_config`].
pub fn load_config(path: impl AsRef<Path>) -> Result<SandboxConfig> {
    load_config_limited(path, MAX_CONFIG_BYTES)
}

pub fn load_config_limited(path: impl AsRef<Path>, max_bytes: u64) -> Result<SandboxConfig> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let raw = read_config_text(path, max_bytes)?;
    let mut config = format.parse(&raw)?;
    anchor_relative_roots(&mut config, path)?;
    tracing::debug!(path = %path.display(), roots = config.roots.len(), "loaded config file");
    Ok(config)
}

/// Combines the optional config file with roots given on the command line.
///
/// File roots come first, so the first of them stays the working root for relative request
/// paths. Command-line roots are made absolute against the current directory. Validation and
/// canonicalization happen in `Context::new`.
pub fn startup_config(config_path: Option<&Path>, extra_roots: &[PathBuf]) -> Result<SandboxConfig> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => SandboxConfig::default(),
    };
    let extra_roots = extra_roots
        .iter()
        .map(|root| std::path::absolute(root).map_err(|err| Error::io_path("absolute", root, err)))
        .collect::<Result<Vec<_>>>()?;
    config.extend_roots(extra_roots);
    Ok(config)
}

fn anchor_relative_roots(config: &mut SandboxConfig, config_path: &Path) -> Result<()> {
    let needs_anchor = |root: &PathBuf| !root.as_os_str().is_empty() && root.is_relative();
    if !config.roots.iter().any(needs_anchor) {
        return Ok(());
    }
    let config_path = std::path::absolute(config_path)
        .map_err(|err| Error::io_path("absolute", config_path, err))?;
    let Some(base) = config_path.parent() else {
        return Ok(());
    };
    for root in &mut config.roots {
        if needs_anchor(&*root) {
            *root = crate::path_utils::normalize_path_lexical(&base.join(&*root));
        }
    }
    Ok(())
}

#[cfg(unix)]
fn open_config_file(path: &Path) -> Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = fs::OpenOptions::new();
    options
        .read(true)
        .custom_flags(libc::O_NOFOLLOW | libc::O_NONBLOCK);
    options.open(path).map_err(|err| {
        if err.raw_os_error() == Some(libc::ELOOP) {
            return symlink_config(path);
        }
        Error::io_path("open", path, err)
    })
}

#[cfg(not(unix))]
fn open_config_file(path: &Path) -> Result<fs::File> {
    let meta = fs::symlink_metadata(path).map_err(|err| Error::io_path("metadata", path, err))?;
    if meta.file_type().is_symlink() {
        return Err(symlink_config(path));
    }
    fs::File::open(path).map_err(|err| Error::io_path("open", path, err))
}

fn symlink_config(path: &Path) -> Error {
    Error::InvalidConfig(format!(
        "{} is a symlink; configuration must be a regular file",
        path.display()
    ))
}

fn read_config_text(path: &Path, max_bytes: u64) -> Result<String> {
    let file = open_config_file(path)?;
    let meta = file
        .metadata()
        .map_err(|err| Error::io_path("metadata", path, err))?;
    if !meta.is_file() {
        return Err(Error::InvalidConfig(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let mut bytes = Vec::<u8>::new();
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| Error::io_path("read", path, err))?;
    let size_bytes = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if size_bytes > max_bytes {
        return Err(Error::FileTooLarge {
            path: path.to_path_buf(),
            size_bytes,
            max_bytes,
        });
    }
    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(path.to_path_buf()))
}
