use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use skg_common::error::{Result, SkgError};
use tracing::{debug, error, warn};
use url::Url;

use crate::checksum::{verify_checksum, ChecksumAlgorithm};
use crate::progress::DownloadProgress;
use crate::validation::validate_url;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 10;
const CHUNK_SIZE: usize = 64 * 1024;
const USER_AGENT_STRING: &str = "skgenome (Rust; +https://github.com/scikit-genome/scikit-genome)";

/// Checksum a fresh download must match before it is moved into place.
#[derive(Debug, Clone, Copy)]
pub struct ExpectedChecksum<'a> {
    pub digest: &'a str,
    pub algorithm: ChecksumAlgorithm,
}

pub fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(None::<Duration>)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| SkgError::Generic(format!("Failed to build HTTP client: {e}")))
}

/// Streams `origin` to `final_path` and returns the number of bytes written.
///
/// Bytes land in a hidden sibling file first and are renamed onto `final_path`
/// only after the whole body arrived (and, when `expected` is given, matched the
/// checksum). Whatever goes wrong, the temporary file is removed before the error
/// is returned, so `final_path` never holds a partial download.
pub fn download_to(
    origin: &str,
    final_path: &Path,
    expected: Option<ExpectedChecksum<'_>>,
    progress: &mut dyn DownloadProgress,
) -> Result<u64> {
    let url = validate_url(origin)?;
    let temp_path = temp_path_for(final_path);
    debug!("Downloading {} to temporary path: {}", url, temp_path.display());
    if temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            warn!(
                "Could not remove existing temporary file {}: {}",
                temp_path.display(),
                e
            );
        }
    }

    let result = fetch_into(&url, final_path, &temp_path, expected, progress);
    if let Err(e) = &result {
        error!("Download failed from {}: {}", url, e);
        if temp_path.exists() {
            if let Err(remove_err) = fs::remove_file(&temp_path) {
                warn!(
                    "Failed to remove partial download {}: {}",
                    temp_path.display(),
                    remove_err
                );
            }
        }
    }
    result
}

fn fetch_into(
    url: &Url,
    final_path: &Path,
    temp_path: &Path,
    expected: Option<ExpectedChecksum<'_>>,
    progress: &mut dyn DownloadProgress,
) -> Result<u64> {
    let name = display_name(final_path);
    let written = match url.scheme() {
        "file" => stream_file(url, temp_path, &name, progress)?,
        _ => stream_http(url, temp_path, &name, progress)?,
    };
    debug!("Finished writing {} bytes to temp file.", written);

    if let Some(expected) = expected {
        verify_checksum(temp_path, expected.digest, expected.algorithm)?;
        debug!("Checksum verified for temporary file: {}", temp_path.display());
    }

    fs::rename(temp_path, final_path).map_err(|e| {
        SkgError::Io(std::sync::Arc::new(io::Error::new(
            e.kind(),
            format!(
                "Failed to move temp file {} to {}: {}",
                temp_path.display(),
                final_path.display(),
                e
            ),
        )))
    })?;
    debug!("Moved download to final location: {}", final_path.display());
    Ok(written)
}

fn stream_http(
    url: &Url,
    temp_path: &Path,
    name: &str,
    progress: &mut dyn DownloadProgress,
) -> Result<u64> {
    let client = build_http_client()?;
    let mut response = client.get(url.clone()).send().map_err(|e| {
        SkgError::DownloadError(
            name.to_string(),
            url.to_string(),
            format!("HTTP request failed: {e}"),
        )
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        let reason = match status {
            StatusCode::NOT_FOUND => "Resource not found (404)".to_string(),
            StatusCode::FORBIDDEN => "Access forbidden (403)".to_string(),
            other => format!("HTTP error {other}"),
        };
        return Err(SkgError::DownloadError(
            name.to_string(),
            url.to_string(),
            reason,
        ));
    }

    let total = response.content_length();
    copy_with_progress(&mut response, temp_path, total, name, url, progress)
}

fn stream_file(
    url: &Url,
    temp_path: &Path,
    name: &str,
    progress: &mut dyn DownloadProgress,
) -> Result<u64> {
    let source = url.to_file_path().map_err(|_| {
        SkgError::ValidationError(format!("URL '{url}' does not name a local file"))
    })?;
    let mut file = File::open(&source).map_err(|e| {
        let reason = if e.kind() == io::ErrorKind::NotFound {
            "Resource not found".to_string()
        } else {
            format!("Failed to open {}: {}", source.display(), e)
        };
        SkgError::DownloadError(name.to_string(), url.to_string(), reason)
    })?;
    let total = file.metadata().ok().map(|m| m.len());
    copy_with_progress(&mut file, temp_path, total, name, url, progress)
}

fn copy_with_progress<R: Read>(
    reader: &mut R,
    temp_path: &Path,
    total: Option<u64>,
    name: &str,
    url: &Url,
    progress: &mut dyn DownloadProgress,
) -> Result<u64> {
    let mut temp_file = File::create(temp_path).map_err(|e| {
        SkgError::Io(std::sync::Arc::new(io::Error::new(
            e.kind(),
            format!("Failed to create temp file {}: {}", temp_path.display(), e),
        )))
    })?;

    progress.start(total);
    let result = copy_chunks(reader, &mut temp_file, temp_path, name, url, progress);
    progress.finish();
    let written = result?;

    if let Some(total) = total {
        if written < total {
            return Err(SkgError::DownloadError(
                name.to_string(),
                url.to_string(),
                format!("Transfer interrupted: received {written} of {total} bytes"),
            ));
        }
    }
    Ok(written)
}

fn copy_chunks<R: Read>(
    reader: &mut R,
    temp_file: &mut File,
    temp_path: &Path,
    name: &str,
    url: &Url,
    progress: &mut dyn DownloadProgress,
) -> Result<u64> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(SkgError::DownloadError(
                    name.to_string(),
                    url.to_string(),
                    format!("Transfer interrupted after {written} bytes: {e}"),
                ))
            }
        };
        temp_file.write_all(&buffer[..n]).map_err(|e| {
            SkgError::Io(std::sync::Arc::new(io::Error::new(
                e.kind(),
                format!("Failed to write download stream to {}: {}", temp_path.display(), e),
            )))
        })?;
        written += n as u64;
        progress.advance(n as u64);
    }
    temp_file.flush()?;
    Ok(written)
}

/// `.name.download` next to the final path.
pub fn temp_path_for(final_path: &Path) -> PathBuf {
    let temp_filename = format!(
        ".{}.download",
        final_path.file_name().unwrap_or_default().to_string_lossy()
    );
    final_path.with_file_name(temp_filename)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
