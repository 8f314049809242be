#![allow(dead_code)]

use std::path::{Path, PathBuf};

use secure_fs::{Context, SandboxConfig};

/// A temp directory with a `root/` sandbox and a sibling `outside/` directory.
pub struct Sandbox {
    _dir: tempfile::TempDir,
    pub root: PathBuf,
    pub outside: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        // Canonical so that assertions on real paths hold where the temp dir is behind a symlink.
        let base = dir.path().canonicalize().expect("canonicalize tempdir");
        let root = base.join("root");
        let outside = base.join("outside");
        std::fs::create_dir_all(&root).expect("mkdir root");
        std::fs::create_dir_all(&outside).expect("mkdir outside");
        Self {
            _dir: dir,
            root,
            outside,
        }
    }

    pub fn context(&self) -> Context {
        Context::new(test_config(&[&self.root])).expect("ctx")
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir parent");
        }
        std::fs::write(&path, content).expect("write");
        path
    }
}

pub fn test_config(roots: &[&Path]) -> SandboxConfig {
    SandboxConfig::new(roots.iter().map(|root| root.to_path_buf()))
}
