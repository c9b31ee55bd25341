use crate::query::{Resolution, ResolvedQuery, SkipReason};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Write `transcript_id, query_position, chromosome, genomic_position` rows.
pub fn write_resolved<W: Write>(writer: &mut W, resolved: &[ResolvedQuery]) -> io::Result<()> {
    for r in resolved {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            r.transcript_id, r.position, r.chromosome, r.genomic_position
        )?;
    }
    Ok(())
}

/// Path of the output file for an output base name.
pub fn output_path(output_base: &str) -> PathBuf {
    PathBuf::from(format!("{}.tsv", output_base))
}

/// Write the resolved rows to `<output_base>.tsv` and return its path.
pub fn write_output_file(output_base: &str, resolved: &[ResolvedQuery]) -> io::Result<PathBuf> {
    let path = output_path(output_base);
    let file = File::create(&path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to create {:?}: {}", path, e))
    })?;
    let mut writer = BufWriter::new(file);
    write_resolved(&mut writer, resolved)?;
    writer.flush()?;
    Ok(path)
}

/// Log each distinct skip cause once, followed by a summary.
pub fn emit_diagnostics(resolution: &Resolution) {
    for diagnostic in resolution.diagnostics() {
        warn!("{}", diagnostic);
    }
    info!(
        "Resolved {} queries; skipped {} (missing alignment: {}, unknown transcript: {}, out of range: {})",
        resolution.resolved.len(),
        resolution.skipped.len(),
        resolution.skipped_count(SkipReason::TranscriptMissingAlignment),
        resolution.skipped_count(SkipReason::TranscriptUnknown),
        resolution.skipped_count(SkipReason::PositionOutOfRange)
    );
}
