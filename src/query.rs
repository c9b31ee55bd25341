//! Query resolution
//!
//! Each query either resolves to a genomic position or is skipped with a
//! reason. Resolution only reads the registry, so queries are resolved in
//! parallel and collected back in input order.

use crate::registry::TranscriptRegistry;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub transcript_id: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub transcript_id: String,
    pub position: i64,
    pub chromosome: String,
    pub genomic_position: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The transcript's alignment record lacked a field and was excluded.
    TranscriptMissingAlignment,
    TranscriptUnknown,
    PositionOutOfRange,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TranscriptMissingAlignment => write!(f, "transcript has no alignment"),
            SkipReason::TranscriptUnknown => write!(f, "transcript unknown"),
            SkipReason::PositionOutOfRange => write!(f, "position out of range"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Resolved(ResolvedQuery),
    Skipped { query: Query, reason: SkipReason },
}

/// A skipped query, reported once per distinct cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub transcript_id: String,
    /// Set only for out-of-range positions; transcript-level causes are
    /// reported once per transcript.
    pub position: Option<i64>,
    pub reason: SkipReason,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.reason, self.position) {
            (SkipReason::PositionOutOfRange, Some(position)) => write!(
                f,
                "{}:{}: query position out of range and will be ignored",
                self.transcript_id, position
            ),
            (reason, _) => write!(
                f,
                "{}: {}, cannot be mapped and will be ignored",
                self.transcript_id, reason
            ),
        }
    }
}

/// Resolve one query against the registry.
pub fn resolve(registry: &TranscriptRegistry, query: &Query) -> Outcome {
    let skip = |reason| Outcome::Skipped {
        query: query.clone(),
        reason,
    };

    let Some(transcript) = registry.get(&query.transcript_id) else {
        return if registry.is_missing_alignment(&query.transcript_id) {
            skip(SkipReason::TranscriptMissingAlignment)
        } else {
            skip(SkipReason::TranscriptUnknown)
        };
    };

    match transcript.table.get(query.position) {
        Some(genomic_position) => Outcome::Resolved(ResolvedQuery {
            transcript_id: query.transcript_id.clone(),
            position: query.position,
            chromosome: transcript.chromosome.to_string(),
            genomic_position,
        }),
        None => skip(SkipReason::PositionOutOfRange),
    }
}

/// Outcome of a whole batch of queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved queries in input order.
    pub resolved: Vec<ResolvedQuery>,
    /// Skipped queries in input order.
    pub skipped: Vec<(Query, SkipReason)>,
}

impl Resolution {
    /// One entry per distinct cause, in the order first encountered.
    ///
    /// Transcripts excluded for a missing alignment field were already reported
    /// when the registry was built, so their queries produce no entry here.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut seen: FxHashSet<(&str, Option<i64>, SkipReason)> = FxHashSet::default();
        let mut diagnostics = Vec::new();
        for (query, reason) in &self.skipped {
            if *reason == SkipReason::TranscriptMissingAlignment {
                continue;
            }
            let position = match reason {
                SkipReason::PositionOutOfRange => Some(query.position),
                _ => None,
            };
            if seen.insert((query.transcript_id.as_str(), position, *reason)) {
                diagnostics.push(Diagnostic {
                    transcript_id: query.transcript_id.clone(),
                    position,
                    reason: *reason,
                });
            }
        }
        diagnostics
    }

    pub fn skipped_count(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|(_, r)| *r == reason).count()
    }
}

/// Resolve every query. The order of `resolved` follows the input order.
pub fn resolve_all(registry: &TranscriptRegistry, queries: &[Query]) -> Resolution {
    let outcomes: Vec<Outcome> = queries
        .par_iter()
        .map(|query| resolve(registry, query))
        .collect();

    let mut resolution = Resolution::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Resolved(resolved) => resolution.resolved.push(resolved),
            Outcome::Skipped { query, reason } => resolution.skipped.push((query, reason)),
        }
    }
    resolution
}
