//! CIGAR parsing
//!
//! Only the original SAM alignment operators `M`, `I` and `D` are supported.
//! The remaining SAM operators are recognised so they can be rejected with a
//! precise error instead of being reported as garbage.

use std::fmt;

/// Lengths are packed into the low 29 bits of a `CigarOp`.
pub const MAX_OP_LEN: u32 = (1 << 29) - 1;

/// SAM operators that are valid CIGAR but not handled by the translator.
const UNSUPPORTED_OPS: [char; 6] = ['N', 'S', 'H', 'P', '=', 'X'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarKind {
    Match,
    Insertion,
    Deletion,
}

impl CigarKind {
    fn code(self) -> u32 {
        match self {
            CigarKind::Match => 0,
            CigarKind::Insertion => 1,
            CigarKind::Deletion => 2,
        }
    }

    fn from_code(code: u32) -> Self {
        match code {
            0 => CigarKind::Match,
            1 => CigarKind::Insertion,
            _ => CigarKind::Deletion,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            CigarKind::Match => 'M',
            CigarKind::Insertion => 'I',
            CigarKind::Deletion => 'D',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CigarError {
    Malformed(String),
    UnsupportedOperator(char),
}

impl fmt::Display for CigarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CigarError::Malformed(reason) => write!(f, "{}", reason),
            CigarError::UnsupportedOperator(op) => {
                write!(f, "unsupported CIGAR operator '{}'", op)
            }
        }
    }
}

impl std::error::Error for CigarError {}

/// A single CIGAR operation. The three most significant bits hold the
/// operator, the rest the run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    val: u32,
}

impl CigarOp {
    pub fn new(len: u32, kind: CigarKind) -> Result<Self, CigarError> {
        if len == 0 {
            return Err(CigarError::Malformed(format!(
                "zero-length '{}' operation",
                kind.symbol()
            )));
        }
        if len > MAX_OP_LEN {
            return Err(CigarError::Malformed(format!(
                "operation length {} exceeds the maximum of {}",
                len, MAX_OP_LEN
            )));
        }
        Ok(Self {
            val: (kind.code() << 29) | len,
        })
    }

    pub fn kind(&self) -> CigarKind {
        CigarKind::from_code(self.val >> 29)
    }

    pub fn len(&self) -> u32 {
        self.val & MAX_OP_LEN
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bases consumed on the transcript side.
    pub fn transcript_delta(&self) -> u32 {
        match self.kind() {
            CigarKind::Match | CigarKind::Insertion => self.len(),
            CigarKind::Deletion => 0,
        }
    }

    /// Bases consumed on the genome side.
    pub fn genome_delta(&self) -> u32 {
        match self.kind() {
            CigarKind::Match | CigarKind::Deletion => self.len(),
            CigarKind::Insertion => 0,
        }
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len(), self.kind().symbol())
    }
}

/// Number of transcript bases described by the operations.
pub fn transcript_length(ops: &[CigarOp]) -> usize {
    ops.iter().map(|op| op.transcript_delta() as usize).sum()
}

pub fn cigar_to_string(ops: &[CigarOp]) -> String {
    ops.iter().map(|op| op.to_string()).collect()
}

/// Parse a CIGAR string such as `8M7D6M2I2M11D7M` into its operations.
pub fn parse_cigar(cigar: &str) -> Result<Vec<CigarOp>, CigarError> {
    if cigar.is_empty() {
        return Err(CigarError::Malformed("empty CIGAR string".to_string()));
    }

    let mut ops = Vec::new();
    let mut len: u32 = 0;
    let mut has_len = false;

    for (offset, c) in cigar.char_indices() {
        if let Some(digit) = c.to_digit(10) {
            len = len
                .checked_mul(10)
                .and_then(|l| l.checked_add(digit))
                .filter(|&l| l <= MAX_OP_LEN)
                .ok_or_else(|| {
                    CigarError::Malformed(format!(
                        "operation length at offset {} exceeds the maximum of {}",
                        offset, MAX_OP_LEN
                    ))
                })?;
            has_len = true;
            continue;
        }

        let kind = match c {
            'M' => CigarKind::Match,
            'I' => CigarKind::Insertion,
            'D' => CigarKind::Deletion,
            c if UNSUPPORTED_OPS.contains(&c) => {
                return Err(CigarError::UnsupportedOperator(c));
            }
            c => {
                return Err(CigarError::Malformed(format!(
                    "unknown operator '{}' at offset {}",
                    c, offset
                )));
            }
        };
        if !has_len {
            return Err(CigarError::Malformed(format!(
                "operator '{}' at offset {} has no length",
                c, offset
            )));
        }

        ops.push(CigarOp::new(len, kind)?);
        len = 0;
        has_len = false;
    }

    if has_len {
        return Err(CigarError::Malformed(format!(
            "dangling length {} without an operator",
            len
        )));
    }

    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(len: u32, kind: CigarKind) -> CigarOp {
        CigarOp::new(len, kind).unwrap()
    }

    #[test]
    fn test_parse_cigar_basic() {
        let ops = parse_cigar("8M7D6M2I2M11D7M").unwrap();
        assert_eq!(
            ops,
            vec![
                op(8, CigarKind::Match),
                op(7, CigarKind::Deletion),
                op(6, CigarKind::Match),
                op(2, CigarKind::Insertion),
                op(2, CigarKind::Match),
                op(11, CigarKind::Deletion),
                op(7, CigarKind::Match),
            ]
        );
        assert_eq!(transcript_length(&ops), 25);
        assert_eq!(cigar_to_string(&ops), "8M7D6M2I2M11D7M");
    }

    #[test]
    fn test_op_deltas() {
        let m = op(5, CigarKind::Match);
        let i = op(3, CigarKind::Insertion);
        let d = op(4, CigarKind::Deletion);
        assert_eq!((m.transcript_delta(), m.genome_delta()), (5, 5));
        assert_eq!((i.transcript_delta(), i.genome_delta()), (3, 0));
        assert_eq!((d.transcript_delta(), d.genome_delta()), (0, 4));
        assert_eq!(op(MAX_OP_LEN, CigarKind::Deletion).len(), MAX_OP_LEN);
        assert_eq!(op(MAX_OP_LEN, CigarKind::Deletion).kind(), CigarKind::Deletion);
    }

    #[test]
    fn test_parse_cigar_unsupported_operators() {
        for cigar in ["10M5S", "5H10M", "3M2N3M", "4=", "4X", "2P2M"] {
            assert!(
                matches!(parse_cigar(cigar), Err(CigarError::UnsupportedOperator(_))),
                "{} should be rejected as unsupported",
                cigar
            );
        }
        assert_eq!(
            parse_cigar("10M5S"),
            Err(CigarError::UnsupportedOperator('S'))
        );
    }

    #[test]
    fn test_parse_cigar_malformed() {
        // empty, unknown operator, zero length, missing length,
        // doubled operator, dangling length, overflow
        for cigar in ["", "10Q", "0M", "M", "10MM", "10M5", "1000000000M", "5m"] {
            assert!(
                matches!(parse_cigar(cigar), Err(CigarError::Malformed(_))),
                "{} should be malformed",
                cigar
            );
        }
    }

    #[test]
    fn test_zero_length_op_rejected() {
        assert!(CigarOp::new(0, CigarKind::Match).is_err());
        assert!(CigarOp::new(MAX_OP_LEN + 1, CigarKind::Match).is_err());
    }
}
