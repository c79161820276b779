// skg-net/src/checksum.rs
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use md5::Md5;
use sha2::{Digest, Sha256};
use skg_common::error::{Result, SkgError};
use tracing::debug;

/// Chunk size used when hashing files.
pub const DEFAULT_CHUNK_SIZE: usize = 65535;

const SHA256_HEX_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumAlgorithm {
    /// SHA-256 for 64-character digests, MD5 otherwise.
    #[default]
    Auto,
    Sha256,
    Md5,
}

impl ChecksumAlgorithm {
    /// Resolves `Auto` against the expected digest; concrete algorithms are returned unchanged.
    pub fn resolve(self, expected: &str) -> ChecksumAlgorithm {
        match self {
            Self::Auto if expected.len() == SHA256_HEX_LEN => Self::Sha256,
            Self::Auto => Self::Md5,
            other => other,
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Sha256 => "sha256",
            Self::Md5 => "md5",
        })
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = SkgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "sha256" => Ok(Self::Sha256),
            "md5" => Ok(Self::Md5),
            other => Err(SkgError::ValidationError(format!(
                "Unknown checksum algorithm '{other}' (expected auto, sha256 or md5)"
            ))),
        }
    }
}

/// Hex digest of a file, read `chunk_size` bytes at a time.
///
/// `Auto` has no digest to look at here and hashes with SHA-256.
pub fn generate(path: &Path, algorithm: ChecksumAlgorithm, chunk_size: usize) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Md5 => digest_file::<Md5>(path, chunk_size),
        ChecksumAlgorithm::Sha256 | ChecksumAlgorithm::Auto => {
            digest_file::<Sha256>(path, chunk_size)
        }
    }
}

/// Returns whether the file's digest matches `expected`.
///
/// A mismatch is `Ok(false)`; only an unreadable file is an error.
pub fn verify(path: &Path, expected: &str, algorithm: ChecksumAlgorithm) -> Result<bool> {
    let expected = expected.trim();
    let algorithm = algorithm.resolve(expected);
    debug!(
        "Verifying {} checksum for: {}",
        algorithm,
        path.display()
    );
    let actual = generate(path, algorithm, DEFAULT_CHUNK_SIZE)?;
    debug!("Calculated {}: {}", algorithm, actual);
    debug!("Expected {}:   {}", algorithm, expected);
    Ok(actual.eq_ignore_ascii_case(expected))
}

/// Like [`verify`], but a mismatch becomes `SkgError::ChecksumMismatch`.
pub fn verify_checksum(path: &Path, expected: &str, algorithm: ChecksumAlgorithm) -> Result<()> {
    let expected = expected.trim();
    let algorithm = algorithm.resolve(expected);
    let actual = generate(path, algorithm, DEFAULT_CHUNK_SIZE)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(SkgError::ChecksumMismatch(format!(
            "{} mismatch for {}: expected {}, got {}",
            algorithm,
            path.display(),
            expected,
            actual
        )))
    }
}

fn digest_file<D: Digest>(path: &Path, chunk_size: usize) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = D::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut total_bytes_read: u64 = 0;

    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
                total_bytes_read += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    debug!(
        "Hashed {} bytes from {}",
        total_bytes_read,
        path.display()
    );
    Ok(hex::encode(hasher.finalize()))
}
