//! Throwaway shell-script executables for process-level tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temp directory holding executable `/bin/sh` scripts.
///
/// The directory (and every script in it) is deleted on drop.
pub struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Path of a (not necessarily existing) file inside the directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `body` as an executable `/bin/sh` script called `name`.
    ///
    /// Prefer `exec sleep N` over plain `sleep N` in scripts that should run
    /// "forever": the harness kills the shell, and an orphaned `sleep` would
    /// otherwise keep the output pipes open.
    pub fn script(&self, name: &str, body: &str) -> anyhow::Result<PathBuf> {
        let path = self.file(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        make_executable(&path)?;
        Ok(path)
    }

    /// Write a plain data file, e.g. a priming input.
    pub fn data(&self, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.file(name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
