pub mod stats;
pub mod translate;

use crate::error::TranslateError;
use crate::registry::{DuplicatePolicy, TranscriptRegistry};
use crate::tsv;
use log::{info, warn};
use std::num::NonZeroUsize;
use std::path::Path;

/// Where the transcript registry comes from.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub alignment_file: String,
    pub index_file: Option<String>,
    pub force_reindex: bool,
    pub threads: NonZeroUsize,
    pub duplicates: DuplicatePolicy,
}

/// Load the registry from its index when one is usable, otherwise build it
/// from the alignment file (and write the index if one was requested).
pub fn load_or_build_registry(
    options: &RegistryOptions,
) -> Result<TranscriptRegistry, TranslateError> {
    if let Some(index_file) = options.index_file.as_deref() {
        if !options.force_reindex && Path::new(index_file).exists() {
            let registry = load_index(&options.alignment_file, index_file)?;
            if registry.policy() == options.duplicates {
                return Ok(registry);
            }
            info!(
                "Index {} was built with duplicate policy {:?}, rebuilding with {:?}",
                index_file,
                registry.policy(),
                options.duplicates
            );
        }
    }

    let registry = build_registry(options)?;
    if let Some(index_file) = options.index_file.as_deref() {
        registry.save(Path::new(index_file))?;
        info!("Wrote index {}", index_file);
    }
    Ok(registry)
}

fn build_registry(options: &RegistryOptions) -> Result<TranscriptRegistry, TranslateError> {
    let rows = tsv::read_alignment_file(&options.alignment_file, options.threads)?;
    info!(
        "Read {} alignment records from {}",
        rows.len(),
        options.alignment_file
    );
    TranscriptRegistry::build(rows, options.duplicates)
}

fn load_index(alignment_file: &str, index_file: &str) -> Result<TranscriptRegistry, TranslateError> {
    let alignment_metadata = std::fs::metadata(alignment_file)?;
    let index_metadata = std::fs::metadata(index_file)?;
    if let (Ok(alignment_ts), Ok(index_ts)) =
        (alignment_metadata.modified(), index_metadata.modified())
    {
        if alignment_ts > index_ts {
            warn!(
                "Alignment file {} has been modified since index {} was created",
                alignment_file, index_file
            );
        }
    } else {
        warn!("Unable to compare timestamps of {} and {}; the alignment file may have been modified since the index was created", alignment_file, index_file);
    }

    let registry = TranscriptRegistry::load(Path::new(index_file))?;
    info!(
        "Loaded {} transcripts from index {}",
        registry.len(),
        index_file
    );
    Ok(registry)
}
