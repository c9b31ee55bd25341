//! Tab-separated input parsing
//!
//! Alignment and query files are headerless TSV, either plain text or
//! BGZF-compressed (`.gz` / `.bgz`).

use crate::alignment_record::AlignmentRow;
use crate::error::TranslateError;
use crate::query::Query;
use log::debug;
use noodles::bgzf;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::num::NonZeroUsize;

/// Field values treated as absent.
const MISSING_VALUES: [&str; 7] = ["", "NA", "NaN", "nan", "N/A", "NULL", "null"];

const BGZF_HEADER_SIZE: usize = 18;

/// Check whether a file starts with a valid BGZF header.
/// Returns `Ok(false)` for regular gzip, too-small files, or plain text.
fn is_bgzf<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    let mut header = [0u8; BGZF_HEADER_SIZE];
    let result = match reader.read_exact(&mut header) {
        Ok(()) => {
            Ok(header[0..2] == [0x1f, 0x8b]      // gzip magic
                && header[2] == 0x08              // DEFLATE
                && header[3] == 0x04              // FEXTRA
                && header[10..12] == [0x06, 0x00] // XLEN=6
                && header[12..14] == [b'B', b'C'] // BC subfield
                && header[14..16] == [0x02, 0x00]) // SLEN=2
        }
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    };
    reader.seek(SeekFrom::Start(0))?;
    result
}

fn is_compressed_path(path: &str) -> bool {
    [".gz", ".bgz"].iter().any(|extension| path.ends_with(extension))
}

/// Open a plain or BGZF-compressed text file for line reading.
pub fn open_input(path: &str, threads: NonZeroUsize) -> io::Result<Box<dyn BufRead>> {
    let mut file = File::open(path)
        .map_err(|e| io::Error::new(e.kind(), format!("Failed to open '{}': {}", path, e)))?;

    if is_compressed_path(path) {
        if !is_bgzf(&mut file)? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "'{}' is regular gzip, not BGZF. Convert with: zcat '{}' | bgzip > {}",
                    path, path, path
                ),
            ));
        }
        debug!("Reading {} as BGZF with {} workers", path, threads);
        let reader = bgzf::io::MultithreadedReader::with_worker_count(threads, file);
        Ok(Box::new(BufReader::new(reader)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Non-empty lines with their 1-based line numbers and any `\r` stripped.
fn numbered_lines<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = (usize, io::Result<String>)> {
    reader
        .lines()
        .enumerate()
        .map(|(idx, line)| {
            let line = line.map(|mut l| {
                if l.ends_with('\r') {
                    l.pop();
                }
                l
            });
            (idx + 1, line)
        })
        .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()))
}

fn field(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !MISSING_VALUES.contains(&v.trim()))
}

/// Parse one alignment line: `transcript_id, chromosome, genomic_start, cigar`.
fn parse_alignment_line(line: &str, line_no: usize) -> Result<AlignmentRow, TranslateError> {
    let malformed = |reason: String| TranslateError::MalformedAlignmentFile {
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() > 4 {
        return Err(malformed(format!(
            "expected at most 4 columns, found {}",
            fields.len()
        )));
    }

    let transcript_id = field(fields.first().copied())
        .ok_or_else(|| malformed("missing transcript id".to_string()))?;
    let chromosome = field(fields.get(1).copied());
    let genomic_start = field(fields.get(2).copied())
        .map(|start| {
            start
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|s| *s >= 0)
                .ok_or_else(|| {
                    malformed(format!(
                        "genomic start '{}' is not a non-negative integer",
                        start
                    ))
                })
        })
        .transpose()?;
    let cigar = field(fields.get(3).copied());

    Ok(AlignmentRow {
        line: line_no,
        transcript_id: transcript_id.to_string(),
        chromosome: chromosome.map(|c| c.trim().to_string()),
        genomic_start,
        cigar: cigar.map(|c| c.trim().to_string()),
    })
}

pub fn parse_alignments<R: BufRead>(reader: R) -> Result<Vec<AlignmentRow>, TranslateError> {
    let mut rows = Vec::new();
    for (line_no, line) in numbered_lines(reader) {
        rows.push(parse_alignment_line(&line?, line_no)?);
    }
    Ok(rows)
}

/// Parse one query line: `transcript_id, position`.
fn parse_query_line(line: &str, line_no: usize) -> Result<Query, TranslateError> {
    let malformed = |reason: String| TranslateError::MalformedQueryFile {
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 2 {
        return Err(malformed(format!(
            "expected 2 columns, found {}",
            fields.len()
        )));
    }

    let transcript_id =
        field(Some(fields[0])).ok_or_else(|| malformed("missing transcript id".to_string()))?;
    let position = field(Some(fields[1]))
        .ok_or_else(|| malformed("missing query position".to_string()))?;
    let position = position
        .trim()
        .parse::<i64>()
        .map_err(|_| malformed(format!("query position '{}' is not an integer", position)))?;

    Ok(Query {
        transcript_id: transcript_id.to_string(),
        position,
    })
}

pub fn parse_queries<R: BufRead>(reader: R) -> Result<Vec<Query>, TranslateError> {
    let mut queries = Vec::new();
    for (line_no, line) in numbered_lines(reader) {
        queries.push(parse_query_line(&line?, line_no)?);
    }
    Ok(queries)
}

pub fn read_alignment_file(
    path: &str,
    threads: NonZeroUsize,
) -> Result<Vec<AlignmentRow>, TranslateError> {
    parse_alignments(open_input(path, threads)?)
}

pub fn read_query_file(path: &str, threads: NonZeroUsize) -> Result<Vec<Query>, TranslateError> {
    parse_queries(open_input(path, threads)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_alignments() {
        let data = "TR1\tCHR1\t3\t8M7D6M2I2M11D7M\nTR2\tCHR2\t10\t20M\r\n\n";
        let rows = parse_alignments(Cursor::new(data)).unwrap();
        assert_eq!(
            rows,
            vec![
                AlignmentRow {
                    line: 1,
                    transcript_id: "TR1".to_string(),
                    chromosome: Some("CHR1".to_string()),
                    genomic_start: Some(3),
                    cigar: Some("8M7D6M2I2M11D7M".to_string()),
                },
                AlignmentRow {
                    line: 2,
                    transcript_id: "TR2".to_string(),
                    chromosome: Some("CHR2".to_string()),
                    genomic_start: Some(10),
                    cigar: Some("20M".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_parse_alignments_missing_fields() {
        let data = "TR1\tCHR1\t3\t8M\nTR2\tCHR2\t10\t\nTR3\tCHR2\nTR4\tNA\t5\t5M\n";
        let rows = parse_alignments(Cursor::new(data)).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_complete());
        assert_eq!(rows[1].missing_fields(), vec!["cigar"]);
        assert_eq!(rows[2].missing_fields(), vec!["genomic_start", "cigar"]);
        assert_eq!(rows[3].missing_fields(), vec!["chromosome"]);
    }

    #[test]
    fn test_parse_alignments_trims_fields() {
        let rows = parse_alignments(Cursor::new("TR1\t CHR1 \t 3\t 8M \n")).unwrap();
        assert_eq!(rows[0].chromosome.as_deref(), Some("CHR1"));
        assert_eq!(rows[0].genomic_start, Some(3));
        assert_eq!(rows[0].cigar.as_deref(), Some("8M"));
    }

    #[test]
    fn test_parse_alignments_malformed() {
        for data in [
            "TR1\tCHR1\tthree\t8M\n",
            "TR1\tCHR1\t-3\t8M\n",
            "\tCHR1\t3\t8M\n",
            "TR1\tCHR1\t3\t8M\textra\n",
        ] {
            assert!(
                matches!(
                    parse_alignments(Cursor::new(data)),
                    Err(TranslateError::MalformedAlignmentFile { line: 1, .. })
                ),
                "{:?} should be rejected",
                data
            );
        }
    }

    #[test]
    fn test_parse_queries() {
        let data = "TR1\t4\nTR2\t0\n\nTR1\t 13\nTR2\t10\n";
        let queries = parse_queries(Cursor::new(data)).unwrap();
        let pairs: Vec<(&str, i64)> = queries
            .iter()
            .map(|q| (q.transcript_id.as_str(), q.position))
            .collect();
        assert_eq!(pairs, vec![("TR1", 4), ("TR2", 0), ("TR1", 13), ("TR2", 10)]);
    }

    #[test]
    fn test_parse_queries_malformed_is_fatal() {
        for (data, bad_line) in [
            ("TR1\t4\nTR2\t\n", 2),
            ("TR1\t4\nTR2\tNaN\n", 2),
            ("TR1\t4.5\n", 1),
            ("TR1\n", 1),
            ("TR1\t4\t5\n", 1),
            ("TR1\t4\n\n\tfive\n", 3),
        ] {
            match parse_queries(Cursor::new(data)) {
                Err(TranslateError::MalformedQueryFile { line, .. }) => {
                    assert_eq!(line, bad_line, "{:?}", data)
                }
                other => panic!("{:?} should be rejected, got {:?}", data, other),
            }
        }
    }

    #[test]
    fn test_plain_text_is_not_bgzf() {
        let mut cursor = Cursor::new(b"TR1\tCHR1\t3\t8M\n".to_vec());
        assert!(!is_bgzf(&mut cursor).unwrap());
        assert_eq!(cursor.position(), 0);
    }
}
