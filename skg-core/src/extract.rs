// Path: skg-core/src/extract.rs
//! Archive detection and extraction.
//!
//! Formats are recognised by content, never by file extension. Tar archives may
//! be wrapped in gzip, bzip2 or xz.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use skg_common::error::{Result, SkgError};
use tar::Archive;
use tracing::{debug, error, warn};
use xz2::read::XzDecoder;
use zip::read::ZipArchive;

/// A concrete archive format handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Tar,
    Zip,
}

impl ArchiveKind {
    /// Order in which formats are tried when the format is not pinned.
    pub const PRIORITY: [ArchiveKind; 2] = [ArchiveKind::Tar, ArchiveKind::Zip];

    /// Whether `path` holds an archive of this kind.
    pub fn detect(self, path: &Path) -> Result<bool> {
        match self {
            Self::Tar => is_tar(path),
            Self::Zip => is_zip(path),
        }
    }

    /// Unpacks `archive_path` into `target_dir`, creating it if needed.
    pub fn extract(self, archive_path: &Path, target_dir: &Path) -> Result<()> {
        debug!(
            "Extracting {} archive '{}' to '{}'",
            self,
            archive_path.display(),
            target_dir.display()
        );
        fs::create_dir_all(target_dir).map_err(|e| {
            SkgError::Io(std::sync::Arc::new(io::Error::new(
                e.kind(),
                format!(
                    "Failed to create target directory {}: {}",
                    target_dir.display(),
                    e
                ),
            )))
        })?;
        match self {
            Self::Tar => extract_tar_archive(open_tar_stream(archive_path)?, target_dir, archive_path),
            Self::Zip => extract_zip_archive(archive_path, target_dir),
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tar => "tar",
            Self::Zip => "zip",
        })
    }
}

/// Which formats extraction may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    /// Tar, then zip.
    #[default]
    Auto,
    Tar,
    Zip,
    /// Never extract.
    Disabled,
}

impl ArchiveFormat {
    pub fn candidates(self) -> &'static [ArchiveKind] {
        match self {
            Self::Auto => &ArchiveKind::PRIORITY,
            Self::Tar => &[ArchiveKind::Tar],
            Self::Zip => &[ArchiveKind::Zip],
            Self::Disabled => &[],
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = SkgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "tar" => Ok(Self::Tar),
            "zip" => Ok(Self::Zip),
            "none" => Ok(Self::Disabled),
            other => Err(SkgError::ValidationError(format!(
                "Unknown archive format '{other}' (expected auto, tar, zip or none)"
            ))),
        }
    }
}

/// Extracts `source` into `destination` with the first candidate format that
/// recognises it.
///
/// Returns `Ok(false)` when no candidate recognises the file. If extraction of a
/// recognised archive fails, `destination` is removed (recursively for a
/// directory) before the error is returned.
pub fn extract_archive(source: &Path, destination: &Path, format: ArchiveFormat) -> Result<bool> {
    for kind in format.candidates() {
        if !kind.detect(source)? {
            debug!("{} is not a {} archive", source.display(), kind);
            continue;
        }
        if let Err(e) = kind.extract(source, destination) {
            error!(
                "Failed to extract {} archive {}: {}",
                kind,
                source.display(),
                e
            );
            remove_destination(destination);
            return Err(e);
        }
        debug!("Extracted {} into {}", source.display(), destination.display());
        return Ok(true);
    }
    debug!(
        "No archive format recognised {}; nothing extracted",
        source.display()
    );
    Ok(false)
}

/// Best-effort removal of a file or directory tree.
fn remove_destination(path: &Path) {
    let metadata = match path.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(_) => return,
    };
    let removal = if metadata.file_type().is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match removal {
        Ok(()) => debug!("Removed extraction destination {}", path.display()),
        Err(e) => warn!(
            "Failed to remove extraction destination {}: {}",
            path.display(),
            e
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

fn sniff_compression(path: &Path) -> Result<Compression> {
    let kind = infer::get_from_path(path)?;
    Ok(match kind.map(|k| k.extension()) {
        Some("gz") => Compression::Gzip,
        Some("bz2") => Compression::Bzip2,
        Some("xz") => Compression::Xz,
        _ => Compression::None,
    })
}

fn open_tar_stream(path: &Path) -> Result<Box<dyn Read>> {
    let compression = sniff_compression(path)?;
    let file = File::open(path).map_err(|e| {
        SkgError::Io(std::sync::Arc::new(io::Error::new(
            e.kind(),
            format!("Failed to open archive {}: {}", path.display(), e),
        )))
    })?;
    debug!("Opening {} as tar stream ({:?})", path.display(), compression);
    Ok(match compression {
        Compression::None => Box::new(file),
        Compression::Gzip => Box::new(MultiGzDecoder::new(file)),
        Compression::Bzip2 => Box::new(BzDecoder::new(file)),
        Compression::Xz => Box::new(XzDecoder::new(file)),
    })
}

/// A tar archive is recognised when its first header block carries a valid checksum.
fn is_tar(path: &Path) -> Result<bool> {
    let mut archive = Archive::new(open_tar_stream(path)?);
    let mut entries = match archive.entries() {
        Ok(entries) => entries,
        Err(_) => return Ok(false),
    };
    Ok(matches!(entries.next(), Some(Ok(_))))
}

fn is_zip(path: &Path) -> Result<bool> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(file).is_ok())
}

/// Joins an archive member path onto `target_dir`, refusing anything that would
/// land outside of it.
fn member_target_path(
    target_dir: &Path,
    member: &Path,
    archive_path_for_log: &Path,
) -> Result<Option<PathBuf>> {
    let mut target = target_dir.to_path_buf();
    let mut pushed = false;
    for comp in member.components() {
        match comp {
            Component::Normal(p) => {
                target.push(p);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                return Err(SkgError::ExtractionError(format!(
                    "Unsafe path component {:?} in member {} of {}",
                    comp,
                    member.display(),
                    archive_path_for_log.display()
                )));
            }
        }
    }
    Ok(pushed.then_some(target))
}

fn extract_tar_archive<R: Read>(
    reader: R,
    target_dir: &Path,
    archive_path_for_log: &Path,
) -> Result<()> {
    let mut archive = Archive::new(reader);
    archive.set_overwrite(true);

    let entries = archive.entries().map_err(|e| {
        SkgError::ExtractionError(format!(
            "Failed to read TAR entries from {}: {}",
            archive_path_for_log.display(),
            e
        ))
    })?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| {
            SkgError::ExtractionError(format!(
                "Error reading TAR entry from {}: {}",
                archive_path_for_log.display(),
                e
            ))
        })?;

        let member: PathBuf = entry
            .path()
            .map_err(|e| {
                SkgError::ExtractionError(format!(
                    "Invalid path in TAR entry from {}: {}",
                    archive_path_for_log.display(),
                    e
                ))
            })?
            .into_owned();

        let Some(target) = member_target_path(target_dir, &member, archive_path_for_log)? else {
            continue;
        };

        let unpacked = entry.unpack_in(target_dir).map_err(|e| {
            SkgError::ExtractionError(format!(
                "Failed to unpack entry {} from {}: {}",
                member.display(),
                archive_path_for_log.display(),
                e
            ))
        })?;
        if unpacked {
            debug!("Unpacked TAR entry to: {}", target.display());
        } else {
            warn!("Skipped TAR entry {}", member.display());
        }
    }
    Ok(())
}

fn extract_zip_archive(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        SkgError::ExtractionError(format!(
            "Failed to open ZIP {}: {}",
            archive_path.display(),
            e
        ))
    })?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| {
            SkgError::ExtractionError(format!(
                "Failed to access ZIP entry {} in {}: {}",
                i,
                archive_path.display(),
                e
            ))
        })?;
        let member = PathBuf::from(file.name());
        if file.enclosed_name().is_none() {
            return Err(SkgError::ExtractionError(format!(
                "Unsafe path {} in {}",
                member.display(),
                archive_path.display()
            )));
        }
        let Some(outpath) = member_target_path(target_dir, &member, archive_path)? else {
            continue;
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        io::copy(&mut file, &mut outfile).map_err(|e| {
            SkgError::ExtractionError(format!(
                "Failed to write ZIP entry {} from {}: {}",
                member.display(),
                archive_path.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                if let Err(e) = fs::set_permissions(&outpath, fs::Permissions::from_mode(mode)) {
                    warn!(
                        "Failed to set permissions on ZIP entry {}: {}",
                        outpath.display(),
                        e
                    );
                }
            }
        }
        debug!("Extracted ZIP entry to: {}", outpath.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use flate2::write::GzEncoder;
    use flate2::Compression as GzLevel;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn tar_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn zip_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in members {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), GzLevel::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn write(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn detects_by_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let tar = write(dir.path(), "looks.zip", &tar_bytes(&[("a.txt", b"a")]));
        let zip = write(dir.path(), "looks.tar", &zip_bytes(&[("a.txt", b"a")]));
        let text = write(dir.path(), "plain.tar.gz", &[b'>'; 2048]);

        assert!(ArchiveKind::Tar.detect(&tar).unwrap());
        assert!(!ArchiveKind::Zip.detect(&tar).unwrap());
        assert!(ArchiveKind::Zip.detect(&zip).unwrap());
        assert!(!ArchiveKind::Tar.detect(&zip).unwrap());
        assert!(!ArchiveKind::Tar.detect(&text).unwrap());
        assert!(!ArchiveKind::Zip.detect(&text).unwrap());
    }

    #[test]
    fn gzip_without_tar_inside_is_not_a_tar() {
        let dir = tempfile::tempdir().unwrap();
        let gff = write(
            dir.path(),
            "annotations.gff3.gz",
            &gzip(&b"##gff-version 3\nchr1\t.\tgene\t1\t100\t.\t+\t.\tID=g1\n".repeat(20)),
        );
        assert!(!ArchiveKind::Tar.detect(&gff).unwrap());
        assert!(!extract_archive(&gff, &dir.path().join("out"), ArchiveFormat::Auto).unwrap());
    }

    #[test]
    fn extracts_plain_and_gzipped_tar() {
        let dir = tempfile::tempdir().unwrap();
        let raw = tar_bytes(&[("genome/chr1.fa", b">chr1\nACGT\n")]);
        for (name, data) in [("plain.tar", raw.clone()), ("packed.tgz", gzip(&raw))] {
            let archive = write(dir.path(), name, &data);
            let out = dir.path().join(format!("out-{name}"));
            assert!(extract_archive(&archive, &out, ArchiveFormat::Auto).unwrap());
            assert_eq!(
                fs::read(out.join("genome").join("chr1.fa")).unwrap(),
                b">chr1\nACGT\n"
            );
        }
    }

    #[test]
    fn extracts_zip_with_auto() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write(
            dir.path(),
            "bundle.zip",
            &zip_bytes(&[("reads/a.fa", b">a\nAC\n"), ("b.fa", b">b\nGT\n")]),
        );
        let out = dir.path().join("out");
        assert!(extract_archive(&archive, &out, ArchiveFormat::Auto).unwrap());
        assert_eq!(fs::read(out.join("reads").join("a.fa")).unwrap(), b">a\nAC\n");
        assert_eq!(fs::read(out.join("b.fa")).unwrap(), b">b\nGT\n");
    }

    #[test]
    fn pinned_format_only_tries_that_format() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write(dir.path(), "bundle.zip", &zip_bytes(&[("a", b"a")]));
        let out = dir.path().join("out");
        assert!(!extract_archive(&archive, &out, ArchiveFormat::Tar).unwrap());
        assert!(!extract_archive(&archive, &out, ArchiveFormat::Disabled).unwrap());
        assert!(!out.exists());
        assert!(extract_archive(&archive, &out, ArchiveFormat::Zip).unwrap());
    }

    #[test]
    fn non_archive_is_not_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write(dir.path(), "x.fa", b">A\nACGT\n");
        let out = dir.path().join("out");
        assert!(!extract_archive(&fasta, &out, ArchiveFormat::Auto).unwrap());
        assert!(!out.exists());
    }

    #[test]
    fn truncated_tar_removes_destination() {
        let dir = tempfile::tempdir().unwrap();
        // First member intact, second header cut short.
        let full = tar_bytes(&[("a.fa", &b">a\nAC\n"[..]), ("b.fa", &[b'A'; 4096][..])]);
        let archive = write(dir.path(), "broken.tar", &full[..1024 + 100]);
        let out = dir.path().join("out");

        assert!(ArchiveKind::Tar.detect(&archive).unwrap());
        let err = extract_archive(&archive, &out, ArchiveFormat::Auto).unwrap_err();
        assert!(matches!(err, SkgError::ExtractionError(_)));
        assert!(!out.exists());
        assert!(archive.exists());
    }

    #[test]
    fn zip_member_escaping_destination_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write(dir.path(), "evil.zip", &zip_bytes(&[("../evil.txt", b"x")]));
        let out = dir.path().join("out");
        let err = extract_archive(&archive, &out, ArchiveFormat::Auto).unwrap_err();
        assert!(matches!(err, SkgError::ExtractionError(_)));
        assert!(!out.exists());
        assert!(!dir.path().join("evil.txt").exists());
    }

    #[test]
    fn parse_archive_format_names() {
        assert_eq!("auto".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Auto);
        assert_eq!("TAR".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Tar);
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert_eq!("none".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Disabled);
        assert!("rar".parse::<ArchiveFormat>().is_err());
        assert_eq!(
            ArchiveFormat::Auto.candidates(),
            &[ArchiveKind::Tar, ArchiveKind::Zip]
        );
    }
}
