//! Round scorer: ranks the live candidates for every live title under one metric.
//!
//! Results land in `RoundBuffers`, two maps keyed by content key:
//! - title → its top-3 ranked candidates
//! - candidate → the (at most 5) best titles that ranked it
//!
//! The resolver reads both maps and performs the cross-check itself, so the
//! entities never point at each other.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::fuzz::{extract, Metric, TOP_K};
use crate::models::{Candidate, Proposal, RankedMatch, Title, MAX_PROPOSALS};
use crate::normalize::ContentKey;
use crate::pool::Pool;
use crate::progress::{create_progress_bar, log_progress};

/// Per-metric scratch state. Scores from different metrics are not
/// comparable, so the engine clears this between stages.
#[derive(Debug, Default)]
pub struct RoundBuffers {
    rankings: FxHashMap<ContentKey, Vec<RankedMatch>>,
    proposals: FxHashMap<ContentKey, Vec<Proposal>>,
}

impl RoundBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.rankings.clear();
        self.proposals.clear();
    }

    /// The title's guess at `rank`, if it has that many.
    pub fn ranked(&self, title: &ContentKey, rank: usize) -> Option<&RankedMatch> {
        self.rankings.get(title).and_then(|r| r.get(rank))
    }

    /// Everyone who ranked the candidate, best score first, ties in arrival order.
    pub fn proposals_for(&self, candidate: &ContentKey) -> &[Proposal] {
        self.proposals.get(candidate).map_or(&[], Vec::as_slice)
    }

    /// Store a title's ranked list and fan each entry out to the candidate side.
    pub fn record(&mut self, title: ContentKey, ranked: Vec<RankedMatch>) {
        for m in &ranked {
            let list = self.proposals.entry(m.candidate).or_default();
            insert_proposal(
                list,
                Proposal {
                    title,
                    score: m.score,
                },
            );
        }
        self.rankings.insert(title, ranked);
    }
}

/// Insert keeping descending score order; equal scores keep arrival order.
/// Lists never grow past `MAX_PROPOSALS`.
fn insert_proposal(list: &mut Vec<Proposal>, proposal: Proposal) {
    let pos = list
        .iter()
        .position(|p| p.score < proposal.score)
        .unwrap_or(list.len());
    if pos >= MAX_PROPOSALS {
        return;
    }
    list.insert(pos, proposal);
    list.truncate(MAX_PROPOSALS);
}

/// Score every live title against every live candidate with `metric`.
///
/// Titles are scored in parallel; the buffers are filled afterwards in title
/// pool order so the outcome does not depend on thread scheduling.
pub fn score_round(titles: &Pool<Title>, candidates: &Pool<Candidate>, metric: Metric, stage: usize) -> RoundBuffers {
    let candidate_keys: Vec<ContentKey> = candidates.keys();
    let candidate_texts: Vec<&str> = candidates.iter().map(|c| c.processed.as_str()).collect();
    let title_refs: Vec<&Title> = titles.iter().collect();

    let phase = format!("Stage {} ({})", stage, metric);
    let total = title_refs.len() as u64;
    let pb = create_progress_bar(total, &format!("{}: scoring", phase));
    let done = AtomicU64::new(0);

    let scored: Vec<(ContentKey, Vec<RankedMatch>)> = title_refs
        .par_iter()
        .map(|title| {
            let ranked = extract(&title.processed, &candidate_texts, metric, TOP_K)
                .into_iter()
                .map(|(idx, score)| RankedMatch {
                    candidate: candidate_keys[idx],
                    score,
                })
                .collect();
            pb.inc(1);
            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            log_progress(&phase, current, total, 1_000);
            (title.key, ranked)
        })
        .collect();

    pb.finish_with_message(format!("{}: scored {} titles", phase, scored.len()));

    let mut buffers = RoundBuffers::new();
    for (title, ranked) in scored {
        buffers.record(title, ranked);
    }
    buffers
}
