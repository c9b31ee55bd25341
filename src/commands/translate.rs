use crate::commands::{load_or_build_registry, RegistryOptions};
use crate::error::TranslateError;
use crate::query::{resolve_all, Resolution};
use crate::report;
use crate::tsv;
use log::info;
use std::path::PathBuf;

/// Summary of a finished translation run.
#[derive(Debug)]
pub struct TranslateSummary {
    pub output_file: PathBuf,
    pub resolution: Resolution,
}

/// Translate every query in `query_file` and write `<output_base>.tsv`.
///
/// All inputs are read and every query resolved before the output file is
/// created, so a fatal error never leaves a partial output behind.
pub fn run_translate(
    registry_options: &RegistryOptions,
    query_file: &str,
    output_base: &str,
) -> Result<TranslateSummary, TranslateError> {
    let registry = load_or_build_registry(registry_options)?;

    let queries = tsv::read_query_file(query_file, registry_options.threads)?;
    info!("Read {} queries from {}", queries.len(), query_file);

    let resolution = resolve_all(&registry, &queries);
    report::emit_diagnostics(&resolution);

    let output_file = report::write_output_file(output_base, &resolution.resolved)?;
    info!(
        "Wrote {} rows to {}",
        resolution.resolved.len(),
        output_file.display()
    );

    Ok(TranslateSummary {
        output_file,
        resolution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DuplicatePolicy;
    use std::fs;
    use std::num::NonZeroUsize;

    fn options(alignment_file: &str) -> RegistryOptions {
        RegistryOptions {
            alignment_file: alignment_file.to_string(),
            index_file: None,
            force_reindex: false,
            threads: NonZeroUsize::new(2).unwrap(),
            duplicates: DuplicatePolicy::Reject,
        }
    }

    #[test]
    fn test_run_translate() {
        let dir = tempfile::tempdir().unwrap();
        let alignments = dir.path().join("file1.tsv");
        let queries = dir.path().join("file2.tsv");
        fs::write(&alignments, "TR1\tCHR1\t3\t8M7D6M2I2M11D7M\nTR2\tCHR2\t10\t20M\n").unwrap();
        fs::write(&queries, "TR1\t4\nTR2\t0\nTR1\t13\nTR2\t10\n").unwrap();
        let output_base = dir.path().join("output_test");

        let summary = run_translate(
            &options(alignments.to_str().unwrap()),
            queries.to_str().unwrap(),
            output_base.to_str().unwrap(),
        )
        .unwrap();

        assert_eq!(summary.output_file, dir.path().join("output_test.tsv"));
        assert_eq!(
            fs::read_to_string(&summary.output_file).unwrap(),
            "TR1\t4\tCHR1\t7\nTR2\t0\tCHR2\t10\nTR1\t13\tCHR1\t23\nTR2\t10\tCHR2\t20\n"
        );
    }

    #[test]
    fn test_fatal_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let alignments = dir.path().join("file1.tsv");
        let queries = dir.path().join("file2.tsv");
        fs::write(&alignments, "TR1\tCHR1\t3\t8M\n").unwrap();
        fs::write(&queries, "TR1\t4\nTR1\tfour\n").unwrap();
        let output_base = dir.path().join("out");

        let result = run_translate(
            &options(alignments.to_str().unwrap()),
            queries.to_str().unwrap(),
            output_base.to_str().unwrap(),
        );
        assert!(matches!(
            result,
            Err(TranslateError::MalformedQueryFile { line: 2, .. })
        ));
        assert!(!dir.path().join("out.tsv").exists());
    }

    #[test]
    fn test_index_is_written_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let alignments = dir.path().join("file1.tsv");
        let queries = dir.path().join("file2.tsv");
        let index = dir.path().join("file1.t2g");
        fs::write(&alignments, "TR1\tCHR1\t3\t8M7D6M2I2M11D7M\n").unwrap();
        fs::write(&queries, "TR1\t8\n").unwrap();

        let mut opts = options(alignments.to_str().unwrap());
        opts.index_file = Some(index.to_str().unwrap().to_string());
        let output_base = dir.path().join("out");
        run_translate(&opts, queries.to_str().unwrap(), output_base.to_str().unwrap()).unwrap();
        assert!(index.exists());

        // an emptied alignment file would resolve nothing, so this answer comes from the index
        fs::write(&alignments, "").unwrap();
        let summary =
            run_translate(&opts, queries.to_str().unwrap(), output_base.to_str().unwrap())
                .unwrap();
        assert_eq!(summary.resolution.resolved[0].genomic_position, 18);
    }
}
