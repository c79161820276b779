// skg/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use skg_common::error::Result;
use skg_common::Config;

pub mod cache;
pub mod extract;
pub mod fasta;
pub mod fetch;
pub mod verify;

use crate::cli::cache::CacheCommand;
use crate::cli::extract::ExtractArgs;
use crate::cli::fasta::FastaArgs;
use crate::cli::fetch::FetchArgs;
use crate::cli::verify::VerifyArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "skg", bin_name = "skg")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Cache root to use instead of ~/.skgenome (also read from SKGENOME_CACHE_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a file into the cache unless a valid copy is already there
    Fetch(FetchArgs),
    /// Check a file against an expected digest
    Verify(VerifyArgs),
    /// Unpack a tar or zip archive
    Extract(ExtractArgs),
    /// Print the records of a FASTA file
    Fasta(FastaArgs),
    /// Inspect or clear the cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

impl Command {
    pub fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Fetch(command) => command.run(config),
            Self::Verify(command) => command.run(),
            Self::Extract(command) => command.run(),
            Self::Fasta(command) => command.run(),
            Self::Cache(command) => command.run(config),
        }
    }
}
