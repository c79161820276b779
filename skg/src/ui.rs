//! UI helpers for terminal progress output.

use indicatif::{ProgressBar, ProgressStyle};

const DOWNLOAD_TEMPLATE: &str =
    "{msg} [{bar:30.blue/white}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// Creates a byte-counting bar for one download.
///
/// The bar is drawn to stderr; its length is set by the download once the size
/// is known.
pub fn create_download_bar(name: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(DOWNLOAD_TEMPLATE) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(name.to_string());
    pb
}
