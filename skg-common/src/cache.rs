// skg-common/src/cache.rs
// Layout of the on-disk artifact cache: <root>/<subdirectory>/<filename>

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::{Result, SkgError};
use crate::Config;

/// Cache rooted at a resolved directory.
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    /// Resolves the root through `config` (with the usual temp-dir fallback).
    pub fn new(config: &Config, override_dir: Option<&Path>) -> Result<Self> {
        let root = config.resolve_cache_root(override_dir)?;
        Ok(Self { root })
    }

    /// Uses `root` as is; it is created on first use.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subdir_path(&self, subdir: &str) -> PathBuf {
        self.root.join(subdir)
    }

    pub fn artifact_path(&self, subdir: &str, filename: &str) -> PathBuf {
        self.subdir_path(subdir).join(filename)
    }

    /// Creates the subdirectory if missing and returns its path.
    pub fn ensure_subdir(&self, subdir: &str) -> Result<PathBuf> {
        let dir = self.subdir_path(subdir);
        fs::create_dir_all(&dir).map_err(|e| {
            SkgError::Cache(format!(
                "Failed to create cache directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(dir)
    }

    pub fn contains(&self, subdir: &str, filename: &str) -> bool {
        self.artifact_path(subdir, filename).exists()
    }

    /// Lists the files below a subdirectory, relative to it and sorted.
    pub fn list(&self, subdir: &str) -> Result<Vec<PathBuf>> {
        let dir = self.subdir_path(subdir);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1) {
            let entry = entry.map_err(|e| {
                SkgError::Cache(format!("Failed to walk {}: {}", dir.display(), e))
            })?;
            if entry.file_type().is_file() {
                if let Ok(relative) = entry.path().strip_prefix(&dir) {
                    files.push(relative.to_path_buf());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Removes one cached file. Missing files are not an error.
    pub fn clear_file(&self, subdir: &str, filename: &str) -> Result<()> {
        let path = self.artifact_path(subdir, filename);
        tracing::debug!("Clearing cached file {}", path.display());
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    pub fn clear_subdir(&self, subdir: &str) -> Result<()> {
        let dir = self.subdir_path(subdir);
        tracing::debug!("Clearing cache subdirectory {}", dir.display());
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Clears all cache files, keeping the (empty) root.
    pub fn clear_all(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }
}
