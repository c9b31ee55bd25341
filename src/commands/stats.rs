use crate::commands::{load_or_build_registry, RegistryOptions};
use crate::error::TranslateError;
use crate::registry::TranscriptRegistry;
use rustc_hash::FxHashMap;
use std::io::{self, Write};

/// Transcripts per chromosome, chromosomes in natural order (chr2 before chr10).
pub fn transcripts_per_chromosome(registry: &TranscriptRegistry) -> Vec<(&str, usize)> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for transcript in registry.iter() {
        *counts.entry(transcript.chromosome).or_insert(0) += 1;
    }
    let mut entries: Vec<(&str, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| natord::compare(a.0, b.0));
    entries
}

pub fn write_stats<W: Write>(writer: &mut W, registry: &TranscriptRegistry) -> io::Result<()> {
    writeln!(writer, "Number of transcripts: {}", registry.len())?;
    writeln!(
        writer,
        "Transcripts missing alignment: {}",
        registry.missing_alignment().len()
    )?;
    writeln!(writer, "Number of chromosomes: {}", registry.chromosomes().len())?;
    writeln!(writer, "Total mapped bases: {}", registry.total_bases())?;

    let per_chromosome = transcripts_per_chromosome(registry);
    if !per_chromosome.is_empty() {
        writeln!(writer, "\nTranscripts per chromosome:")?;
        for (chromosome, count) in per_chromosome {
            writeln!(writer, "{}\t{}", chromosome, count)?;
        }
    }
    Ok(())
}

/// Print registry statistics to stdout.
pub fn run_stats(registry_options: &RegistryOptions) -> Result<(), TranslateError> {
    let registry = load_or_build_registry(registry_options)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_stats(&mut handle, &registry)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_record::AlignmentRow;
    use crate::registry::DuplicatePolicy;

    fn row(line: usize, id: &str, chrom: &str, cigar: Option<&str>) -> AlignmentRow {
        AlignmentRow {
            line,
            transcript_id: id.to_string(),
            chromosome: Some(chrom.to_string()),
            genomic_start: Some(0),
            cigar: cigar.map(str::to_string),
        }
    }

    #[test]
    fn test_write_stats() {
        let rows = vec![
            row(1, "TR1", "chr10", Some("5M")),
            row(2, "TR2", "chr2", Some("3M2D3M")),
            row(3, "TR3", "chr10", Some("2M1I")),
            row(4, "TR4", "chr1", None),
        ];
        let registry = TranscriptRegistry::build(rows, DuplicatePolicy::Reject).unwrap();
        assert_eq!(
            transcripts_per_chromosome(&registry),
            vec![("chr2", 1), ("chr10", 2)]
        );

        let mut out = Vec::new();
        write_stats(&mut out, &registry).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Number of transcripts: 3\n\
             Transcripts missing alignment: 1\n\
             Number of chromosomes: 2\n\
             Total mapped bases: 14\n\
             \n\
             Transcripts per chromosome:\n\
             chr2\t1\n\
             chr10\t2\n"
        );
    }

    #[test]
    fn test_stats_after_overwrite() {
        let rows = vec![row(1, "TR1", "CHR1", Some("5M")), row(2, "TR1", "CHR3", Some("5M"))];
        let registry = TranscriptRegistry::build(rows, DuplicatePolicy::Overwrite).unwrap();

        let mut out = Vec::new();
        write_stats(&mut out, &registry).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Number of transcripts: 1\n"));
        assert!(out.contains("Number of chromosomes: 1\n"));
        assert!(out.ends_with("Transcripts per chromosome:\nCHR3\t1\n"));
    }
}
