use crate::alignment_record::{AlignmentRecord, AlignmentRow};
use crate::cigar::cigar_to_string;
use crate::error::TranslateError;
use crate::mapper::{transcript_to_genome, CoordinateTable};
use crate::seqidx::SequenceIndex;
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const INDEX_MAGIC: &[u8; 8] = b"T2GIDX01";

/// What to do when the same transcript id appears on more than one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Abort with `DuplicateTranscript`.
    #[default]
    Reject,
    /// Keep the last complete record.
    Overwrite,
}

#[derive(Debug, Clone, PartialEq)]
struct TranscriptEntry {
    chromosome_id: u32,
    table: CoordinateTable,
}

/// Borrowed view of one registered transcript.
#[derive(Debug, Clone, Copy)]
pub struct Transcript<'a> {
    pub transcript_id: &'a str,
    pub chromosome: &'a str,
    pub table: &'a CoordinateTable,
}

#[derive(Serialize)]
struct SerializableRegistryRef<'a> {
    policy: DuplicatePolicy,
    chromosomes: &'a [String],
    transcripts: Vec<(&'a str, u32, &'a CoordinateTable)>,
    missing_alignment: &'a [String],
}

#[derive(Deserialize)]
struct SerializableRegistry {
    policy: DuplicatePolicy,
    chromosomes: Vec<String>,
    transcripts: Vec<(String, u32, CoordinateTable)>,
    missing_alignment: Vec<String>,
}

/// Coordinate tables of every transcript with a complete alignment record,
/// keyed by transcript id, plus the ids excluded for missing fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRegistry {
    chromosomes: SequenceIndex,
    transcript_ids: Vec<String>,
    entries: Vec<TranscriptEntry>,
    lookup: FxHashMap<String, u32>,
    missing_alignment: Vec<String>,
    missing_lookup: FxHashSet<String>,
    policy: DuplicatePolicy,
}

impl TranscriptRegistry {
    fn empty(policy: DuplicatePolicy) -> Self {
        Self {
            chromosomes: SequenceIndex::new(),
            transcript_ids: Vec::new(),
            entries: Vec::new(),
            lookup: FxHashMap::default(),
            missing_alignment: Vec::new(),
            missing_lookup: FxHashSet::default(),
            policy,
        }
    }

    /// Build the registry from every row of an alignment file.
    ///
    /// Rows lacking a field are excluded before their CIGAR is looked at. The
    /// remaining rows are parsed and mapped in parallel; if several fail, the
    /// error of the earliest row is returned.
    pub fn build(rows: Vec<AlignmentRow>, policy: DuplicatePolicy) -> Result<Self, TranslateError> {
        if policy == DuplicatePolicy::Reject {
            check_duplicates(&rows)?;
        }

        let total_rows = rows.len();
        let mut registry = Self::empty(policy);
        let mut complete = Vec::with_capacity(total_rows);
        for row in rows {
            match row.into_complete() {
                Ok(row) => complete.push(row),
                Err(incomplete) => {
                    if registry.missing_lookup.insert(incomplete.transcript_id.clone()) {
                        warn!(
                            "Transcript {} cannot be mapped: missing {} (line {})",
                            incomplete.transcript_id,
                            incomplete.missing.join(", "),
                            incomplete.line
                        );
                        registry.missing_alignment.push(incomplete.transcript_id);
                    }
                }
            }
        }

        let built: Vec<Result<(AlignmentRecord, CoordinateTable), TranslateError>> = complete
            .into_par_iter()
            .map(|row| {
                let record = AlignmentRecord::from_row(row)?;
                let table = transcript_to_genome(&record.cigar, record.genomic_start)
                    .ok_or_else(|| TranslateError::MalformedAlignmentFile {
                        line: record.line,
                        reason: format!(
                            "genomic positions of transcript {} overflow from start {}",
                            record.transcript_id, record.genomic_start
                        ),
                    })?;
                Ok((record, table))
            })
            .collect();
        let built = built.into_iter().collect::<Result<Vec<_>, _>>()?;

        // Later records replace earlier ones before any chromosome is interned.
        let mut merged: Vec<(AlignmentRecord, CoordinateTable)> = Vec::with_capacity(built.len());
        let mut slots: FxHashMap<String, usize> = FxHashMap::default();
        for (record, table) in built {
            debug!(
                "{}: {} bases on {} from {} ({})",
                record.transcript_id,
                table.len(),
                record.chromosome,
                record.genomic_start,
                cigar_to_string(&record.cigar)
            );
            match slots.entry(record.transcript_id.clone()) {
                Entry::Occupied(slot) => {
                    debug!(
                        "Transcript {} redefined on line {}, keeping the later record",
                        record.transcript_id, record.line
                    );
                    merged[*slot.get()] = (record, table);
                }
                Entry::Vacant(slot) => {
                    slot.insert(merged.len());
                    merged.push((record, table));
                }
            }
        }

        for (record, table) in merged {
            registry.insert(record, table);
        }

        info!(
            "Built coordinate tables for {} transcripts from {} rows ({} excluded for missing fields)",
            registry.len(),
            total_rows,
            registry.missing_alignment.len()
        );
        Ok(registry)
    }

    fn insert(&mut self, record: AlignmentRecord, table: CoordinateTable) {
        let chromosome_id = self.chromosomes.get_or_insert_id(&record.chromosome);
        let idx = self.entries.len() as u32;
        self.lookup.insert(record.transcript_id.clone(), idx);
        self.transcript_ids.push(record.transcript_id);
        self.entries.push(TranscriptEntry {
            chromosome_id,
            table,
        });
    }

    pub fn get(&self, transcript_id: &str) -> Option<Transcript<'_>> {
        let idx = *self.lookup.get(transcript_id)? as usize;
        self.transcript(idx)
    }

    fn transcript(&self, idx: usize) -> Option<Transcript<'_>> {
        let entry = self.entries.get(idx)?;
        Some(Transcript {
            transcript_id: self.transcript_ids.get(idx)?,
            chromosome: self.chromosomes.get_name(entry.chromosome_id)?,
            table: &entry.table,
        })
    }

    /// Whether the id was excluded because its alignment record lacked a field.
    pub fn is_missing_alignment(&self, transcript_id: &str) -> bool {
        self.missing_lookup.contains(transcript_id)
    }

    /// Excluded transcript ids, in the order they were first seen.
    pub fn missing_alignment(&self) -> &[String] {
        &self.missing_alignment
    }

    /// Registered transcripts in input order.
    pub fn iter(&self) -> impl Iterator<Item = Transcript<'_>> + '_ {
        (0..self.entries.len()).filter_map(move |idx| self.transcript(idx))
    }

    pub fn chromosomes(&self) -> &SequenceIndex {
        &self.chromosomes
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of transcript bases with a genomic position.
    pub fn total_bases(&self) -> usize {
        self.entries.iter().map(|entry| entry.table.len()).sum()
    }

    fn to_serializable(&self) -> SerializableRegistryRef<'_> {
        SerializableRegistryRef {
            policy: self.policy,
            chromosomes: self.chromosomes.names(),
            transcripts: self
                .transcript_ids
                .iter()
                .zip(&self.entries)
                .map(|(id, entry)| (id.as_str(), entry.chromosome_id, &entry.table))
                .collect(),
            missing_alignment: &self.missing_alignment,
        }
    }

    fn from_serializable(serializable: SerializableRegistry) -> Result<Self, TranslateError> {
        let mut registry = Self::empty(serializable.policy);
        let chromosome_count = serializable.chromosomes.len();
        registry.chromosomes = SequenceIndex::from_names(serializable.chromosomes);
        if registry.chromosomes.len() != chromosome_count {
            return Err(TranslateError::InvalidIndex(
                "duplicate chromosome names".to_string(),
            ));
        }

        for (transcript_id, chromosome_id, table) in serializable.transcripts {
            if registry.chromosomes.get_name(chromosome_id).is_none() {
                return Err(TranslateError::InvalidIndex(format!(
                    "transcript {} refers to unknown chromosome id {}",
                    transcript_id, chromosome_id
                )));
            }
            if registry.lookup.contains_key(&transcript_id) {
                return Err(TranslateError::InvalidIndex(format!(
                    "transcript {} is stored twice",
                    transcript_id
                )));
            }
            registry
                .lookup
                .insert(transcript_id.clone(), registry.entries.len() as u32);
            registry.transcript_ids.push(transcript_id);
            registry.entries.push(TranscriptEntry {
                chromosome_id,
                table,
            });
        }

        for transcript_id in serializable.missing_alignment {
            if registry.missing_lookup.insert(transcript_id.clone()) {
                registry.missing_alignment.push(transcript_id);
            }
        }
        Ok(registry)
    }

    /// Canonical binary form of the registry, identical for identical input.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranslateError> {
        let body = bincode::serde::encode_to_vec(self.to_serializable(), bincode::config::standard())
            .map_err(|e| TranslateError::InvalidIndex(format!("Failed to serialize registry: {e}")))?;
        let mut bytes = Vec::with_capacity(INDEX_MAGIC.len() + body.len());
        bytes.extend_from_slice(INDEX_MAGIC);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TranslateError> {
        let body = bytes
            .strip_prefix(INDEX_MAGIC.as_slice())
            .ok_or_else(|| TranslateError::InvalidIndex("invalid magic bytes".to_string()))?;
        let (serializable, _): (SerializableRegistry, usize) =
            bincode::serde::decode_from_slice(body, bincode::config::standard()).map_err(|e| {
                TranslateError::InvalidIndex(format!("Failed to deserialize registry: {e}"))
            })?;
        Self::from_serializable(serializable)
    }

    /// Write the registry to an index file.
    pub fn save(&self, path: &Path) -> Result<(), TranslateError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(INDEX_MAGIC)?;
        bincode::serde::encode_into_std_write(
            self.to_serializable(),
            &mut writer,
            bincode::config::standard(),
        )
        .map_err(|e| TranslateError::InvalidIndex(format!("Failed to serialize registry: {e}")))?;
        writer.flush()?;
        Ok(())
    }

    /// Read a registry written by [`TranscriptRegistry::save`].
    pub fn load(path: &Path) -> Result<Self, TranslateError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic_buf = [0u8; 8];
        reader.read_exact(&mut magic_buf)?;
        if &magic_buf != INDEX_MAGIC {
            return Err(TranslateError::InvalidIndex(format!(
                "Invalid magic bytes in {:?}",
                path
            )));
        }

        let serializable: SerializableRegistry =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
                .map_err(|e| {
                    TranslateError::InvalidIndex(format!(
                        "Failed to load registry from {:?}: {e}",
                        path
                    ))
                })?;
        Self::from_serializable(serializable)
    }
}

/// Reject the second occurrence of any transcript id, in line order.
fn check_duplicates(rows: &[AlignmentRow]) -> Result<(), TranslateError> {
    let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
    for row in rows {
        match seen.entry(row.transcript_id.as_str()) {
            Entry::Occupied(first) => {
                return Err(TranslateError::DuplicateTranscript {
                    transcript_id: row.transcript_id.clone(),
                    first_line: *first.get(),
                    line: row.line,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(row.line);
            }
        }
    }
    Ok(())
}
