// skg-common/src/config.rs
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::error::{Result, SkgError};

/// Name of the dotfile directory used under the home and temp directories.
pub const CACHE_DIR_NAME: &str = ".skgenome";
pub const DEFAULT_CACHE_SUBDIR: &str = "data";
const CACHE_DIR_ENV: &str = "SKGENOME_CACHE_DIR";

/// Inputs for locating the cache root.
///
/// Nothing here is probed lazily: `Config::load` reads the environment once, and
/// tests build a `Config` by hand to steer the fallback path.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
    pub temp_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading skgenome configuration");

        let cache_dir = env::var_os(CACHE_DIR_ENV)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        if let Some(dir) = &cache_dir {
            debug!("{} set, using {}", CACHE_DIR_ENV, dir.display());
        }

        let home_dir = dirs::home_dir();
        if home_dir.is_none() {
            debug!("Could not determine home directory; cache will live in the temp dir");
        }

        Ok(Self {
            cache_dir,
            home_dir,
            temp_dir: env::temp_dir(),
        })
    }

    /// Builds a config rooted at an explicit directory, leaving the fallback at the
    /// system temp dir.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: Some(cache_dir.into()),
            home_dir: dirs::home_dir(),
            temp_dir: env::temp_dir(),
        }
    }

    pub fn fallback_cache_root(&self) -> PathBuf {
        self.temp_dir.join(CACHE_DIR_NAME)
    }

    /// The root that would be used before the writability check.
    pub fn preferred_cache_root(&self, override_dir: Option<&Path>) -> Option<PathBuf> {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.cache_dir.clone())
            .map(|p| self.expand_home(&p))
            .or_else(|| self.home_dir.as_ref().map(|h| h.join(CACHE_DIR_NAME)))
    }

    /// Picks the cache root, creating it if needed.
    ///
    /// Order: `override_dir`, then `cache_dir`, then `~/.skgenome`. When the chosen
    /// directory cannot be created or written to, `<temp_dir>/.skgenome` is used
    /// instead; failure to create that one is returned as is.
    pub fn resolve_cache_root(&self, override_dir: Option<&Path>) -> Result<PathBuf> {
        if let Some(preferred) = self.preferred_cache_root(override_dir) {
            match probe_writable(&preferred) {
                Ok(()) => {
                    debug!("Using cache root {}", preferred.display());
                    return Ok(preferred);
                }
                Err(e) => {
                    warn!(
                        "Cache root {} is not writable ({}); falling back to {}",
                        preferred.display(),
                        e,
                        self.fallback_cache_root().display()
                    );
                }
            }
        }

        let fallback = self.fallback_cache_root();
        fs::create_dir_all(&fallback).map_err(|e| {
            SkgError::Config(format!(
                "Failed to create fallback cache root {}: {}",
                fallback.display(),
                e
            ))
        })?;
        debug!("Using fallback cache root {}", fallback.display());
        Ok(fallback)
    }

    fn expand_home(&self, path: &Path) -> PathBuf {
        let mut components = path.components();
        match (components.next(), &self.home_dir) {
            (Some(Component::Normal(first)), Some(home)) if first == "~" => {
                home.join(components.as_path())
            }
            _ => path.to_path_buf(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            home_dir: dirs::home_dir(),
            temp_dir: env::temp_dir(),
        }
    }
}

fn probe_writable(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    tempfile::tempfile_in(dir).map(drop)
}
