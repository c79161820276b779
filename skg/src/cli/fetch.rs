use clap::Args;
use colored::Colorize;
use skg_common::config::DEFAULT_CACHE_SUBDIR;
use skg_common::error::Result;
use skg_common::Config;
use skg_core::{fetch, ArchiveFormat, FetchRequest};
use skg_net::checksum::ChecksumAlgorithm;
use tracing::debug;

use crate::ui;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// File name inside the cache subdirectory
    pub filename: String,

    /// URL to download from (http, https or file)
    pub origin: String,

    /// Cache subdirectory to store the file in
    #[arg(long, default_value = DEFAULT_CACHE_SUBDIR)]
    pub subdir: String,

    /// Expected digest; a cached copy that does not match is downloaded again
    #[arg(long)]
    pub checksum: Option<String>,

    /// auto, sha256 or md5
    #[arg(long, default_value = "auto")]
    pub algorithm: ChecksumAlgorithm,

    /// Unpack the file into the cache subdirectory after fetching
    #[arg(long)]
    pub extract: bool,

    /// auto, tar, zip or none
    #[arg(long, default_value = "auto")]
    pub archive_format: ArchiveFormat,
}

impl FetchArgs {
    fn request(&self) -> FetchRequest {
        let request = FetchRequest::new(&self.filename, &self.origin)
            .cache_subdir(&self.subdir)
            .checksum_algorithm(self.algorithm)
            .extract(self.extract)
            .archive_format(self.archive_format);
        match &self.checksum {
            Some(checksum) => request.checksum(checksum),
            None => request,
        }
    }

    pub fn run(&self, config: &Config) -> Result<()> {
        let request = self.request();
        debug!("Fetch request: {:?}", request);

        let mut bar = ui::create_download_bar(&self.filename);
        let result = fetch(&request, config, &mut bar);
        bar.finish_and_clear();
        let outcome = result?;

        if outcome.downloaded {
            eprintln!("{} {}", "Downloaded".green().bold(), self.filename);
        } else {
            eprintln!("{} {}", "Using cached".blue().bold(), self.filename);
        }
        if self.extract && !outcome.extracted {
            eprintln!(
                "{} {} is not a recognised archive; nothing extracted",
                "Warning:".yellow(),
                self.filename
            );
        }
        println!("{}", outcome.path.display());
        Ok(())
    }
}
