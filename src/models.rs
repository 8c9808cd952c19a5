//! Core data models for title matching.
//!
//! This module contains the entities that move through the pools, the
//! per-round ranking entries, the committed match provenance and the run
//! statistics.

use serde::Serialize;
use std::path::PathBuf;

use crate::fuzz::Metric;
use crate::normalize::{process, ContentKey};

/// Rank levels visited by the resolver, in order.
pub const RANKS: [usize; 3] = [0, 1, 2];

/// Maximum proposals remembered per candidate within a round.
pub const MAX_PROPOSALS: usize = 5;

// ============================================================================
// Pool entities
// ============================================================================

/// Anything that lives in a `Pool`.
pub trait Keyed {
    fn key(&self) -> ContentKey;
}

/// An input row that still needs (or has received) a candidate.
#[derive(Clone, Debug)]
pub struct Title {
    pub text: String,
    /// Processed comparison text
    pub processed: String,
    pub key: ContentKey,
    /// Row position in the input table, the only join key back to it
    pub row_index: usize,
    pub match_result: Option<MatchRecord>,
}

impl Title {
    pub fn new(text: &str, row_index: usize, fold_ascii: bool) -> Self {
        let processed = process(text, fold_ascii);
        Self {
            text: text.to_string(),
            key: ContentKey::of(&processed),
            processed,
            row_index,
            match_result: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.match_result.is_some()
    }
}

impl Keyed for Title {
    fn key(&self) -> ContentKey {
        self.key
    }
}

/// A directory entry eligible to be matched.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub path: PathBuf,
    /// Full file name for files, directory name for directories
    pub display_name: String,
    /// Stem for files, directory name for directories
    pub title_text: String,
    pub processed: String,
    pub key: ContentKey,
    pub is_file: bool,
}

impl Candidate {
    pub fn new(
        path: PathBuf,
        display_name: &str,
        title_text: &str,
        is_file: bool,
        fold_ascii: bool,
    ) -> Self {
        let processed = process(title_text, fold_ascii);
        Self {
            path,
            display_name: display_name.to_string(),
            title_text: title_text.to_string(),
            key: ContentKey::of(&processed),
            processed,
            is_file,
        }
    }
}

impl Keyed for Candidate {
    fn key(&self) -> ContentKey {
        self.key
    }
}

// ============================================================================
// Round buffers entries
// ============================================================================

/// One of a title's top-3 guesses for the current metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankedMatch {
    pub candidate: ContentKey,
    pub score: u8,
}

/// A title that named this candidate among its top-3 guesses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub title: ContentKey,
    pub score: u8,
}

// ============================================================================
// Provenance
// ============================================================================

/// Immutable record of a committed title–candidate pairing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub candidate_name: String,
    pub candidate_path: PathBuf,
    pub is_file: bool,
    pub score: u8,
    pub rank: usize,
    #[serde(serialize_with = "serialize_metric")]
    pub metric: Metric,
    /// 1-based escalation stage
    pub stage: usize,
    pub threshold: u8,
}

fn serialize_metric<S: serde::Serializer>(metric: &Metric, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(metric.as_str())
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Outcome of one escalation stage.
#[derive(Default, Debug, Clone, Serialize)]
pub struct StageStats {
    pub stage: usize,
    pub metric: String,
    pub matches_by_rank: [usize; 3],
    pub titles_remaining: usize,
    pub candidates_remaining: usize,
}

impl StageStats {
    pub fn matches(&self) -> usize {
        self.matches_by_rank.iter().sum()
    }
}

/// Run-wide counters, printed at the end and optionally written as JSON.
#[derive(Default, Debug, Clone, Serialize)]
pub struct MatchingStats {
    // Input
    pub input_rows: usize,
    pub prematched_rows: usize,
    pub blank_titles: usize,
    pub duplicate_titles: usize,

    // Candidates
    pub directory_entries: usize,
    pub excluded_candidates: usize,
    pub duplicate_candidates: usize,

    // Pools at engine start
    pub title_pool: usize,
    pub candidate_pool: usize,

    pub stages: Vec<StageStats>,

    // Final totals
    pub total_matches: usize,
    pub unmatched_titles: usize,
    pub unmatched_candidates: usize,

    pub threshold: u8,
    pub elapsed_seconds: f64,
}

impl MatchingStats {
    /// Matched titles as a percentage of the title pool
    pub fn match_rate(&self) -> f64 {
        if self.title_pool == 0 {
            0.0
        } else {
            100.0 * self.total_matches as f64 / self.title_pool as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
