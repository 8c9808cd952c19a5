//! Greedy resolver: commits mutually consistent pairs at one rank level.
//!
//! Candidates are visited in pool order, not score order. For a candidate C at
//! rank R, the eligible titles are the live, unmatched proposers of C whose own
//! R-th guess is C. The first of them in C's proposal order (best score, ties
//! by arrival) is committed to C when that guess scores at least the threshold.
//!
//! Committed titles and candidates leave their pools immediately, so a later
//! rank or metric can never see them again.

use log::debug;

use crate::fuzz::Metric;
use crate::models::{Candidate, MatchRecord, Title};
use crate::pool::Pool;
use crate::scorer::RoundBuffers;

/// The two live pools, handed from stage to stage by value.
#[derive(Debug, Default)]
pub struct Pools {
    pub titles: Pool<Title>,
    pub candidates: Pool<Candidate>,
}

impl Pools {
    pub fn new(titles: Pool<Title>, candidates: Pool<Candidate>) -> Self {
        Self { titles, candidates }
    }

    /// Either side empty means nothing more can be paired.
    pub fn exhausted(&self) -> bool {
        self.titles.is_empty() || self.candidates.is_empty()
    }
}

/// Settings that hold for a whole escalation stage.
#[derive(Debug, Clone, Copy)]
pub struct PassContext {
    pub metric: Metric,
    pub stage: usize,
    pub threshold: u8,
}

/// Pools after a rank pass, plus the titles it committed (match set).
#[derive(Debug)]
pub struct RankOutcome {
    pub pools: Pools,
    pub committed: Vec<Title>,
}

pub fn resolve_rank(pools: Pools, buffers: &RoundBuffers, ctx: &PassContext, rank: usize) -> RankOutcome {
    let Pools {
        mut titles,
        mut candidates,
    } = pools;
    let mut committed = Vec::new();

    for candidate_key in candidates.keys() {
        let eligible = buffers.proposals_for(&candidate_key).iter().find_map(|proposal| {
            let title = titles.get(&proposal.title)?;
            if title.is_matched() {
                return None;
            }
            let guess = buffers.ranked(&proposal.title, rank)?;
            (guess.candidate == candidate_key).then_some((proposal.title, *guess))
        });
        let Some((title_key, guess)) = eligible else {
            continue;
        };
        // Proposals are sorted by score, so nobody further down can pass either
        if guess.score < ctx.threshold {
            debug!(
                "rank {}: best proposer of {} scores {} < {}",
                rank,
                candidate_key.short(),
                guess.score,
                ctx.threshold
            );
            continue;
        }

        let (Some(candidate), Some(mut title)) = (candidates.remove(&candidate_key), titles.remove(&title_key)) else {
            continue;
        };

        debug!(
            "stage {} ({}) rank {}: '{}' -> '{}' score {}",
            ctx.stage, ctx.metric, rank, title.text, candidate.display_name, guess.score
        );

        title.match_result = Some(MatchRecord {
            candidate_name: candidate.display_name,
            candidate_path: candidate.path,
            is_file: candidate.is_file,
            score: guess.score,
            rank,
            metric: ctx.metric,
            stage: ctx.stage,
            threshold: ctx.threshold,
        });
        committed.push(title);
    }

    RankOutcome {
        pools: Pools::new(titles, candidates),
        committed,
    }
}
