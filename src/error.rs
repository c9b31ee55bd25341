use crate::cigar::CigarError;
use std::fmt;
use std::io::Error as IoError;

/// Errors that abort a translation run.
#[derive(Debug)]
pub enum TranslateError {
    MalformedCigar {
        transcript_id: String,
        cigar: String,
        reason: String,
    },
    UnsupportedCigarOperator {
        transcript_id: String,
        cigar: String,
        op: char,
    },
    DuplicateTranscript {
        transcript_id: String,
        first_line: usize,
        line: usize,
    },
    MalformedAlignmentFile {
        line: usize,
        reason: String,
    },
    MalformedQueryFile {
        line: usize,
        reason: String,
    },
    InvalidIndex(String),
    Io(IoError),
}

impl TranslateError {
    /// Attach the transcript and CIGAR text to a parser error.
    pub fn from_cigar(transcript_id: &str, cigar: &str, err: CigarError) -> Self {
        match err {
            CigarError::Malformed(reason) => TranslateError::MalformedCigar {
                transcript_id: transcript_id.to_string(),
                cigar: cigar.to_string(),
                reason,
            },
            CigarError::UnsupportedOperator(op) => TranslateError::UnsupportedCigarOperator {
                transcript_id: transcript_id.to_string(),
                cigar: cigar.to_string(),
                op,
            },
        }
    }
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::MalformedCigar {
                transcript_id,
                cigar,
                reason,
            } => write!(
                f,
                "Malformed CIGAR '{}' for transcript {}: {}",
                cigar, transcript_id, reason
            ),
            TranslateError::UnsupportedCigarOperator {
                transcript_id,
                cigar,
                op,
            } => write!(
                f,
                "Unsupported CIGAR operator '{}' in '{}' for transcript {} (only M, I and D are supported)",
                op, cigar, transcript_id
            ),
            TranslateError::DuplicateTranscript {
                transcript_id,
                first_line,
                line,
            } => write!(
                f,
                "Duplicate transcript {} on line {} (first seen on line {}); use --allow-duplicates to keep the last record",
                transcript_id, line, first_line
            ),
            TranslateError::MalformedAlignmentFile { line, reason } => {
                write!(f, "Malformed alignment file, line {}: {}", line, reason)
            }
            TranslateError::MalformedQueryFile { line, reason } => {
                write!(f, "Malformed query file, line {}: {}", line, reason)
            }
            TranslateError::InvalidIndex(msg) => write!(f, "Invalid index: {}", msg),
            TranslateError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for TranslateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranslateError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IoError> for TranslateError {
    fn from(e: IoError) -> Self {
        TranslateError::Io(e)
    }
}
