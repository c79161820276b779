// skg-core/src/fetch.rs
//! Cached retrieval of remote resources.
//!
//! `fetch` returns the path of a verified local copy of `origin`, downloading it
//! into `<cache root>/<subdir>/<filename>` when the copy is missing or fails its
//! checksum, and optionally unpacking it next to itself.

use std::fs;
use std::path::{Path, PathBuf};

use skg_common::config::DEFAULT_CACHE_SUBDIR;
use skg_common::error::{Result, SkgError};
use skg_common::{Cache, Config};
use skg_net::checksum::{self, ChecksumAlgorithm};
use skg_net::http::{download_to, ExpectedChecksum};
use skg_net::progress::DownloadProgress;
use skg_net::validation::validate_filename;
use tracing::{debug, warn};

use crate::extract::{extract_archive, ArchiveFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub filename: String,
    pub origin: String,
    pub archive_format: ArchiveFormat,
    pub cache_dir: Option<PathBuf>,
    pub cache_subdir: String,
    pub checksum: Option<String>,
    pub checksum_algorithm: ChecksumAlgorithm,
    pub extract: bool,
}

impl FetchRequest {
    pub fn new(filename: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            origin: origin.into(),
            archive_format: ArchiveFormat::Auto,
            cache_dir: None,
            cache_subdir: DEFAULT_CACHE_SUBDIR.to_string(),
            checksum: None,
            checksum_algorithm: ChecksumAlgorithm::Auto,
            extract: false,
        }
    }

    pub fn archive_format(mut self, format: ArchiveFormat) -> Self {
        self.archive_format = format;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn cache_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.cache_subdir = subdir.into();
        self
    }

    pub fn checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn checksum_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.checksum_algorithm = algorithm;
        self
    }

    pub fn extract(mut self, extract: bool) -> Self {
        self.extract = extract;
        self
    }

    fn expected_checksum(&self) -> Option<ExpectedChecksum<'_>> {
        self.checksum.as_deref().map(|digest| ExpectedChecksum {
            digest,
            algorithm: self.checksum_algorithm,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The cached artifact itself, not any extracted contents.
    pub path: PathBuf,
    pub downloaded: bool,
    pub extracted: bool,
}

/// Returns a verified local copy of `request.origin`, downloading it if needed.
pub fn fetch(
    request: &FetchRequest,
    config: &Config,
    progress: &mut dyn DownloadProgress,
) -> Result<FetchOutcome> {
    validate_filename(&request.filename)?;

    let cache = Cache::new(config, request.cache_dir.as_deref())?;
    let data_dir = cache.ensure_subdir(&request.cache_subdir)?;
    let path = data_dir.join(&request.filename);

    debug!(
        "Preparing to fetch '{}' from URL: {}",
        request.filename, request.origin
    );
    debug!("Target cache path: {}", path.display());

    let downloaded = if needs_download(&path, request)? {
        download_to(
            &request.origin,
            &path,
            request.expected_checksum(),
            progress,
        )?;
        debug!("Downloaded {} to {}", request.origin, path.display());
        true
    } else {
        false
    };

    let extracted = if request.extract {
        extract_archive(&path, &data_dir, request.archive_format)?
    } else {
        false
    };

    Ok(FetchOutcome {
        path,
        downloaded,
        extracted,
    })
}

/// A cached copy is reused when it is a regular file and, if a checksum was given, matches it.
/// A copy that fails verification is deleted here.
fn needs_download(path: &Path, request: &FetchRequest) -> Result<bool> {
    if path.is_dir() {
        return Err(SkgError::Cache(format!(
            "Cache path {} is a directory, not a file",
            path.display()
        )));
    }
    if !path.is_file() {
        debug!("File not found in cache.");
        return Ok(true);
    }

    let Some(expected) = request.checksum.as_deref() else {
        debug!(
            "Using cached file (no checksum provided): {}",
            path.display()
        );
        return Ok(false);
    };

    if checksum::verify(path, expected, request.checksum_algorithm)? {
        debug!("Using valid cached file: {}", path.display());
        return Ok(false);
    }

    debug!(
        "Cached file checksum mismatch ({}). Redownloading.",
        path.display()
    );
    if let Err(e) = fs::remove_file(path) {
        warn!(
            "Failed to remove corrupted cached file {}: {}",
            path.display(),
            e
        );
    }
    Ok(true)
}
