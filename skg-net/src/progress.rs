// skg-net/src/progress.rs
//! Download progress reporting.
//!
//! The caller owns the progress value and lends it to each download, so two
//! fetches never share a progress indicator.

use indicatif::{ProgressBar, ProgressStyle};

const UNKNOWN_LENGTH_TEMPLATE: &str = "{spinner:.blue.bold} {msg} {bytes} ({bytes_per_sec})";

pub trait DownloadProgress {
    /// Called once before the first chunk. `total` is `None` when the size is unknown.
    fn start(&mut self, total: Option<u64>);
    /// Called after each chunk with the number of bytes just written.
    fn advance(&mut self, bytes: u64);
    /// Called once the transfer has completed, successfully or not.
    fn finish(&mut self);
}

/// Discards all progress updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {
    fn start(&mut self, _total: Option<u64>) {}
    fn advance(&mut self, _bytes: u64) {}
    fn finish(&mut self) {}
}

/// Records what a download reported.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProgressCounter {
    pub total: Option<u64>,
    pub transferred: u64,
    pub updates: usize,
    pub started: usize,
    pub finished: usize,
}

impl DownloadProgress for ProgressCounter {
    fn start(&mut self, total: Option<u64>) {
        self.total = total;
        self.transferred = 0;
        self.started += 1;
    }

    fn advance(&mut self, bytes: u64) {
        self.transferred += bytes;
        self.updates += 1;
    }

    fn finish(&mut self) {
        self.finished += 1;
    }
}

impl DownloadProgress for ProgressBar {
    /// Without a known size the bar turns into a byte-counting spinner.
    fn start(&mut self, total: Option<u64>) {
        match total {
            Some(total) => self.set_length(total),
            None => {
                self.unset_length();
                if let Ok(style) = ProgressStyle::with_template(UNKNOWN_LENGTH_TEMPLATE) {
                    self.set_style(style);
                }
            }
        }
        self.set_position(0);
    }

    fn advance(&mut self, bytes: u64) {
        self.inc(bytes);
    }

    fn finish(&mut self) {
        self.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_tracks_known_length() {
        let mut bar = ProgressBar::hidden();
        bar.start(Some(10));
        bar.advance(4);
        assert_eq!(bar.length(), Some(10));
        assert_eq!(bar.position(), 4);
    }

    #[test]
    fn bar_without_length_has_no_total() {
        let mut bar = ProgressBar::new(0);
        bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        bar.start(None);
        bar.advance(7);
        assert_eq!(bar.length(), None);
        assert_eq!(bar.position(), 7);
    }

    #[test]
    fn counter_records_unknown_total() {
        let mut counter = ProgressCounter::default();
        counter.start(None);
        counter.advance(3);
        counter.advance(2);
        counter.finish();
        assert_eq!(counter.total, None);
        assert_eq!(counter.transferred, 5);
        assert_eq!(counter.updates, 2);
    }
}
