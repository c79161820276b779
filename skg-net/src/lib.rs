// skg-net/src/lib.rs
pub mod checksum;
pub mod http;
pub mod progress;
pub mod validation;

pub use checksum::{generate, verify, verify_checksum, ChecksumAlgorithm};
pub use http::{build_http_client, download_to, ExpectedChecksum};
pub use progress::{DownloadProgress, NoProgress, ProgressCounter};
pub use skg_common::{
    cache::Cache,
    error::{Result, SkgError},
    Config,
};
pub use validation::{validate_filename, validate_url};
