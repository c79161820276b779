use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;
use skg_common::error::{Result, SkgError};
use skg_core::{extract_archive, ArchiveFormat};

const ARCHIVE_SUFFIXES: [&str; 8] = [
    ".tar.gz", ".tgz", ".tar.bz2", ".tbz2", ".tar.xz", ".txz", ".tar", ".zip",
];

#[derive(Args, Debug)]
pub struct ExtractArgs {
    pub archive: PathBuf,

    /// Destination directory; must be missing or empty (defaults to a directory
    /// named after the archive, next to it)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// auto, tar, zip or none
    #[arg(long, default_value = "auto")]
    pub archive_format: ArchiveFormat,
}

impl ExtractArgs {
    fn destination(&self) -> PathBuf {
        if let Some(dest) = &self.dest {
            return dest.clone();
        }
        let parent = self
            .archive
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = self
            .archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let lower = name.to_ascii_lowercase();
        let stem = ARCHIVE_SUFFIXES
            .iter()
            .find(|suffix| lower.ends_with(*suffix) && lower.len() > suffix.len())
            .map(|suffix| name[..name.len() - suffix.len()].to_string())
            .unwrap_or_else(|| format!("{name}.extracted"));
        parent.join(stem)
    }

    pub fn run(&self) -> Result<()> {
        let dest = self.destination();
        // A failed extraction removes the destination, so it must not hold anything
        // the extraction did not put there.
        ensure_unused(&dest)?;

        if extract_archive(&self.archive, &dest, self.archive_format)? {
            println!(
                "{} {} into {}",
                "Extracted".green().bold(),
                self.archive.display(),
                dest.display()
            );
        } else {
            println!(
                "{} {} is not a recognised archive",
                "Skipped".yellow().bold(),
                self.archive.display()
            );
        }
        Ok(())
    }
}

fn ensure_unused(dest: &Path) -> Result<()> {
    let metadata = match dest.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(_) => return Ok(()),
    };
    if metadata.is_dir() && fs::read_dir(dest)?.next().is_none() {
        return Ok(());
    }
    Err(SkgError::ValidationError(format!(
        "Destination {} already exists and is not an empty directory",
        dest.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(archive: &Path, dest: Option<&Path>) -> ExtractArgs {
        ExtractArgs {
            archive: archive.to_path_buf(),
            dest: dest.map(Path::to_path_buf),
            archive_format: ArchiveFormat::Auto,
        }
    }

    fn broken_tar() -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, size) in [("a.fa", 8usize), ("b.fa", 4096)] {
            let mut header = tar::Header::new_gnu();
            header.set_size(size as u64);
            header.set_mode(0o644);
            builder
                .append_data(&mut header, name, &vec![b'A'; size][..])
                .unwrap();
        }
        let full = builder.into_inner().unwrap();
        full[..1024 + 100].to_vec()
    }

    #[test]
    fn destination_is_named_after_the_archive() {
        let cases = [
            ("/data/bundle.tar", "/data/bundle"),
            ("/data/reads.TAR.GZ", "/data/reads"),
            ("/data/x.zip", "/data/x"),
            ("bundle.tgz", "./bundle"),
            ("/data/blob", "/data/blob.extracted"),
            ("/data/.tar", "/data/.tar.extracted"),
        ];
        for (archive, expected) in cases {
            assert_eq!(
                args(Path::new(archive), None).destination(),
                PathBuf::from(expected)
            );
        }
        assert_eq!(
            args(Path::new("bundle.tar"), Some(Path::new("/out"))).destination(),
            PathBuf::from("/out")
        );
    }

    #[test]
    fn failed_extraction_keeps_sibling_files() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = dir.path().join("downloads");
        fs::create_dir_all(&downloads).unwrap();
        let archive = downloads.join("broken.tar");
        fs::write(&archive, broken_tar()).unwrap();
        let sibling = downloads.join("thesis.docx");
        fs::write(&sibling, b"keep me").unwrap();

        assert!(args(&archive, None).run().is_err());

        assert_eq!(fs::read(&sibling).unwrap(), b"keep me");
        assert!(archive.exists());
        assert!(!downloads.join("broken").exists());
    }

    #[test]
    fn populated_destination_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.tar");
        fs::write(&archive, broken_tar()).unwrap();
        let existing = dir.path().join("existing.txt");
        fs::write(&existing, b"x").unwrap();

        let err = args(&archive, Some(dir.path())).run().unwrap_err();

        assert!(matches!(err, SkgError::ValidationError(_)));
        assert!(existing.exists());
        assert!(archive.exists());
    }

    #[test]
    fn empty_destination_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        ensure_unused(&dest).unwrap();
        ensure_unused(&dir.path().join("missing")).unwrap();
    }
}
