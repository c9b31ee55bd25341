use crate::cigar::{parse_cigar, CigarOp};
use crate::error::TranslateError;

/// One line of the alignment file as read, before any validation beyond
/// splitting. Absent fields are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRow {
    /// 1-based line number in the alignment file
    pub line: usize,
    pub transcript_id: String,
    pub chromosome: Option<String>,
    pub genomic_start: Option<i64>,
    pub cigar: Option<String>,
}

/// A row with every field present. The CIGAR is still unparsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteRow {
    pub line: usize,
    pub transcript_id: String,
    pub chromosome: String,
    pub genomic_start: i64,
    pub cigar: String,
}

/// A row that lacks at least one field and is excluded from mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct IncompleteRow {
    pub line: usize,
    pub transcript_id: String,
    pub missing: Vec<&'static str>,
}

impl AlignmentRow {
    /// Names of the absent fields, in column order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.chromosome.is_none() {
            missing.push("chromosome");
        }
        if self.genomic_start.is_none() {
            missing.push("genomic_start");
        }
        if self.cigar.is_none() {
            missing.push("cigar");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.chromosome.is_some() && self.genomic_start.is_some() && self.cigar.is_some()
    }

    /// Split a row into its complete form, or report what it lacks.
    pub fn into_complete(self) -> Result<CompleteRow, IncompleteRow> {
        let missing = self.missing_fields();
        match (self.chromosome, self.genomic_start, self.cigar) {
            (Some(chromosome), Some(genomic_start), Some(cigar)) => Ok(CompleteRow {
                line: self.line,
                transcript_id: self.transcript_id,
                chromosome,
                genomic_start,
                cigar,
            }),
            _ => Err(IncompleteRow {
                line: self.line,
                transcript_id: self.transcript_id,
                missing,
            }),
        }
    }
}

/// A validated alignment of one transcript against one chromosome.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    pub line: usize,
    pub transcript_id: String,
    pub chromosome: String,
    pub genomic_start: i64,
    pub cigar: Vec<CigarOp>,
}

impl AlignmentRecord {
    /// Parse the CIGAR of a complete row. Malformed or unsupported CIGARs are fatal.
    pub fn from_row(row: CompleteRow) -> Result<Self, TranslateError> {
        if row.genomic_start < 0 {
            return Err(TranslateError::MalformedAlignmentFile {
                line: row.line,
                reason: format!(
                    "negative genomic start {} for transcript {}",
                    row.genomic_start, row.transcript_id
                ),
            });
        }
        let cigar = parse_cigar(&row.cigar)
            .map_err(|e| TranslateError::from_cigar(&row.transcript_id, &row.cigar, e))?;
        Ok(Self {
            line: row.line,
            transcript_id: row.transcript_id,
            chromosome: row.chromosome,
            genomic_start: row.genomic_start,
            cigar,
        })
    }
}
