use crate::cigar::{transcript_length, CigarKind, CigarOp};
use serde::{Deserialize, Serialize};

/// Genomic coordinates of every transcript base, indexed by the 0-based
/// transcript position. Built once by [`transcript_to_genome`] and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoordinateTable {
    genomic: Vec<i64>,
}

impl CoordinateTable {
    /// Genomic position of a transcript position, `None` when out of range.
    pub fn get(&self, position: i64) -> Option<i64> {
        usize::try_from(position)
            .ok()
            .and_then(|idx| self.genomic.get(idx).copied())
    }

    /// Transcript length covered by the table.
    pub fn len(&self) -> usize {
        self.genomic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomic.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, i64> {
        self.genomic.iter()
    }
}

/// Walk the CIGAR operations left to right and record the genomic position of
/// each transcript base, starting from a non-negative 0-based genomic start.
///
/// Deletions only shift the offset. Inside an insertion run the offset is first
/// lowered by the run length and each inserted base then adds back a term that
/// shrinks as the transcript cursor grows, so every inserted base lands on the
/// genomic position the next aligned base would have had. `transcript_pos +
/// offset` never drops below `genomic_start`, so every mapped position is
/// non-negative.
///
/// Returns `None` when a genomic position does not fit in an `i64`.
pub fn transcript_to_genome(ops: &[CigarOp], genomic_start: i64) -> Option<CoordinateTable> {
    let mut genomic = Vec::with_capacity(transcript_length(ops));
    let mut offset = genomic_start;
    let mut transcript_pos: i64 = 0;

    for op in ops {
        let len = i64::from(op.len());
        match op.kind() {
            CigarKind::Match => {
                for _ in 0..len {
                    genomic.push(transcript_pos.checked_add(offset)?);
                    transcript_pos += 1;
                }
            }
            CigarKind::Deletion => offset = offset.checked_add(len)?,
            CigarKind::Insertion => {
                offset = offset.checked_sub(len)?;
                for p in 0..len {
                    genomic.push(transcript_pos.checked_add(offset)?.checked_add(len - p)?);
                    transcript_pos += 1;
                }
            }
        }
    }

    Some(CoordinateTable { genomic })
}
