// skg-net/src/validation.rs
use std::path::Path;

use skg_common::error::{Result, SkgError};
use url::Url;

const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file"];

/// Parses an origin URL, accepting only schemes the downloader can serve.
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str)
        .map_err(|e| SkgError::ValidationError(format!("Failed to parse URL '{url_str}': {e}")))?;
    if SUPPORTED_SCHEMES.contains(&url.scheme()) {
        Ok(url)
    } else {
        Err(SkgError::ValidationError(format!(
            "Unsupported URL scheme for '{}': expected one of {}, got '{}'",
            url_str,
            SUPPORTED_SCHEMES.join(", "),
            url.scheme()
        )))
    }
}

/// Cached artifact names must be a single, non-empty path component.
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(SkgError::ValidationError(
            "Cache filename must not be empty".to_string(),
        ));
    }
    let path = Path::new(filename);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) => Ok(()),
        _ => Err(SkgError::ValidationError(format!(
            "Cache filename '{filename}' must be a plain file name"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_https_and_file() {
        assert!(validate_url("https://ftp.ensembl.org/pub/release-99/x.gff3.gz").is_ok());
        assert!(validate_url("http://localhost:8080/x").is_ok());
        assert!(validate_url("file:///tmp/x.fa").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(matches!(
            validate_url("ftp://ftp.ensembl.org/pub/x"),
            Err(SkgError::ValidationError(_))
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(SkgError::ValidationError(_))
        ));
    }

    #[test]
    fn filename_rules() {
        assert!(validate_filename("human.99.gff3.gz").is_ok());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("   ").is_err());
        assert!(validate_filename("../escape").is_err());
        assert!(validate_filename("a/b").is_err());
        assert!(validate_filename("/abs").is_err());
    }
}
