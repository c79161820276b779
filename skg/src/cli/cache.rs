use clap::Subcommand;
use colored::Colorize;
use skg_common::config::DEFAULT_CACHE_SUBDIR;
use skg_common::error::Result;
use skg_common::{Cache, Config};

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print the cache root
    Path,
    /// List cached files
    List {
        #[arg(long, default_value = DEFAULT_CACHE_SUBDIR)]
        subdir: String,
    },
    /// Remove one file, one subdirectory, or everything
    Clear {
        #[arg(long)]
        subdir: Option<String>,
        #[arg(long)]
        file: Option<String>,
    },
}

impl CacheCommand {
    pub fn run(&self, config: &Config) -> Result<()> {
        let cache = Cache::new(config, None)?;
        match self {
            Self::Path => println!("{}", cache.root().display()),
            Self::List { subdir } => {
                let files = cache.list(subdir)?;
                if files.is_empty() {
                    println!("{}", format!("No files cached in '{subdir}'").yellow());
                }
                for file in files {
                    println!("{}", file.display());
                }
            }
            Self::Clear { subdir, file } => match (subdir, file) {
                (subdir, Some(file)) => {
                    let subdir = subdir.as_deref().unwrap_or(DEFAULT_CACHE_SUBDIR);
                    cache.clear_file(subdir, file)?;
                    println!("{} {}/{}", "Removed".green().bold(), subdir, file);
                }
                (Some(subdir), None) => {
                    cache.clear_subdir(subdir)?;
                    println!("{} {}", "Removed".green().bold(), subdir);
                }
                (None, None) => {
                    cache.clear_all()?;
                    println!(
                        "{} {}",
                        "Cleared".green().bold(),
                        cache.root().display()
                    );
                }
            },
        }
        Ok(())
    }
}
