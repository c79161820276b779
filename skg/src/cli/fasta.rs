use std::path::PathBuf;

use clap::Args;
use skg_common::error::Result;
use skg_core::fasta;

#[derive(Args, Debug)]
pub struct FastaArgs {
    pub path: PathBuf,

    /// Print the records as a JSON array instead of tab-separated lines
    #[arg(long)]
    pub json: bool,
}

impl FastaArgs {
    pub fn run(&self) -> Result<()> {
        let records = fasta::parse_path(&self.path)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
        } else {
            for record in records {
                let (sequence, description) = record.into_pair();
                println!("{description}\t{sequence}");
            }
        }
        Ok(())
    }
}
