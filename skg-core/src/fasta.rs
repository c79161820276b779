//! FASTA parsing.
//!
//! The format is read with three rules over classified lines:
//!
//! ```text
//! unit        := blank* section*
//! section     := description sequences
//! sequences   := (sequence | blank)*
//! ```
//!
//! A description line starts with `>`; its text has the leading markers removed
//! and surrounding whitespace trimmed. Sequence lines are trimmed and joined.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use skg_common::error::{Result, SkgError};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastaRecord {
    pub description: String,
    pub sequence: String,
}

impl FastaRecord {
    /// First whitespace-separated word of the description.
    pub fn id(&self) -> &str {
        self.description.split_whitespace().next().unwrap_or("")
    }

    /// `(sequence, description)`.
    pub fn into_pair(self) -> (String, String) {
        (self.sequence, self.description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Description(&'a str),
    Sequence(&'a str),
    Blank,
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Line::Blank
    } else if let Some(rest) = trimmed.strip_prefix('>') {
        Line::Description(rest.trim_start_matches('>').trim())
    } else {
        Line::Sequence(trimmed)
    }
}

pub fn parse_path(path: impl AsRef<Path>) -> Result<Vec<FastaRecord>> {
    let path = path.as_ref();
    debug!("Parsing FASTA file {}", path.display());
    let file = File::open(path)?;
    parse_reader(BufReader::new(file))
}

pub fn parse_str(text: &str) -> Result<Vec<FastaRecord>> {
    parse_reader(text.as_bytes())
}

/// Parses a whole FASTA document (the `unit` rule).
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<FastaRecord>> {
    let mut records = Vec::new();
    let mut current: Option<FastaRecord> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        match classify(&line) {
            Line::Blank => {}
            Line::Description(description) => {
                records.extend(current.take());
                current = Some(FastaRecord {
                    description: description.to_string(),
                    sequence: String::new(),
                });
            }
            Line::Sequence(sequence) => match current.as_mut() {
                Some(record) => record.sequence.push_str(sequence),
                None => {
                    return Err(SkgError::ParseError(
                        "FASTA",
                        format!(
                            "line {}: sequence data before the first '>' header",
                            index + 1
                        ),
                    ))
                }
            },
        }
    }
    records.extend(current);

    debug!("Parsed {} FASTA records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_records_round_trip_to_pairs() {
        let pairs: Vec<(String, String)> = parse_str(">A desc1\nACGT\n>B desc2\nTTTT\n")
            .unwrap()
            .into_iter()
            .map(FastaRecord::into_pair)
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("ACGT".to_string(), "A desc1".to_string()),
                ("TTTT".to_string(), "B desc2".to_string()),
            ]
        );
    }

    #[test]
    fn wrapped_lines_are_trimmed_and_joined() {
        let records = parse_str(">chr1  first chromosome  \n  ACGT \r\nGG\n\nTT\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "chr1  first chromosome");
        assert_eq!(records[0].sequence, "ACGTGGTT");
        assert_eq!(records[0].id(), "chr1");
    }

    #[test]
    fn header_without_sequence() {
        let records = parse_str(">empty\n>full\nAC").unwrap();
        assert_eq!(records[0].sequence, "");
        assert_eq!(records[1].sequence, "AC");
    }

    #[test]
    fn leading_markers_are_stripped() {
        let records = parse_str(">> nested\nA\n").unwrap();
        assert_eq!(records[0].description, "nested");
    }

    #[test]
    fn empty_input_has_no_records() {
        assert!(parse_str("").unwrap().is_empty());
        assert!(parse_str("\n  \n").unwrap().is_empty());
    }

    #[test]
    fn sequence_before_header_is_rejected() {
        let err = parse_str("\nACGT\n>A\nAC\n").unwrap_err();
        match err {
            SkgError::ParseError("FASTA", msg) => assert!(msg.starts_with("line 2")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parses_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.fasta");
        std::fs::write(&path, ">A desc1\nACGT\n>B desc2\nTTTT\n").unwrap();
        let records = parse_path(&path).unwrap();
        assert_eq!(records[1].id(), "B");
        assert_eq!(records[1].sequence, "TTTT");
    }
}
