use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use skg_common::error::Result;
use skg_net::checksum::{verify_checksum, ChecksumAlgorithm};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    pub path: PathBuf,

    /// Expected hex digest
    pub checksum: String,

    /// auto, sha256 or md5
    #[arg(long, default_value = "auto")]
    pub algorithm: ChecksumAlgorithm,
}

impl VerifyArgs {
    pub fn run(&self) -> Result<()> {
        verify_checksum(&self.path, &self.checksum, self.algorithm)?;
        println!(
            "{} {} ({})",
            "OK".green().bold(),
            self.path.display(),
            self.algorithm.resolve(&self.checksum)
        );
        Ok(())
    }
}
