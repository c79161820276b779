// skg-core/src/lib.rs
pub mod extract;
pub mod fasta;
pub mod fetch;

pub use extract::{extract_archive, ArchiveFormat, ArchiveKind};
pub use fasta::FastaRecord;
pub use fetch::{fetch, FetchOutcome, FetchRequest};
