//! Escalation loop: scoring and resolving across the metric sequence.
//!
//! ```text
//! Scoring(i) -> Resolving(i, 0) -> Resolving(i, 1) -> Resolving(i, 2) -> Draining(i)
//! Draining(i) -> Scoring(i + 1)   when both pools are non-empty and i is not last
//! Draining(i) -> Done             otherwise
//! ```
//!
//! Only the unmatched remainder is rescored at each stage; committed pairs
//! are gone from the pools and cannot be revisited.

use log::{debug, info};

use crate::config::MatchConfig;
use crate::fuzz::Metric;
use crate::models::{Candidate, StageStats, Title, RANKS};
use crate::pool::Pool;
use crate::resolver::{resolve_rank, PassContext, Pools};
use crate::scorer::{score_round, RoundBuffers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Scoring { metric_idx: usize },
    Resolving { metric_idx: usize, rank: usize },
    Draining { metric_idx: usize },
    Done,
}

/// Everything the loop produced.
#[derive(Debug)]
pub struct MatchOutcome {
    /// Titles carrying a match record, in commit order
    pub matched: Vec<Title>,
    pub unmatched_titles: Pool<Title>,
    pub unmatched_candidates: Pool<Candidate>,
    pub stages: Vec<StageStats>,
}

impl MatchOutcome {
    pub fn total_matches(&self) -> usize {
        self.matched.len()
    }
}

pub struct MatchEngine {
    metrics: Vec<Metric>,
    threshold: u8,
}

impl MatchEngine {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            metrics: config.metrics.sequence(),
            threshold: config.threshold,
        }
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn run(&self, titles: Pool<Title>, candidates: Pool<Candidate>) -> MatchOutcome {
        let mut pools = Pools::new(titles, candidates);
        let mut buffers = RoundBuffers::new();
        let mut matched: Vec<Title> = Vec::new();
        let mut stages: Vec<StageStats> = Vec::new();

        let mut state = if pools.exhausted() || self.metrics.is_empty() {
            State::Done
        } else {
            State::Scoring { metric_idx: 0 }
        };

        loop {
            state = match state {
                State::Scoring { metric_idx } => {
                    let metric = self.metrics[metric_idx];
                    let stage = metric_idx + 1;
                    info!(
                        "Stage {} ({}): {} titles x {} candidates",
                        stage,
                        metric,
                        pools.titles.len(),
                        pools.candidates.len()
                    );
                    buffers = score_round(&pools.titles, &pools.candidates, metric, stage);
                    stages.push(StageStats {
                        stage,
                        metric: metric.as_str().to_string(),
                        ..Default::default()
                    });
                    State::Resolving { metric_idx, rank: 0 }
                }
                State::Resolving { metric_idx, rank } => {
                    let ctx = PassContext {
                        metric: self.metrics[metric_idx],
                        stage: metric_idx + 1,
                        threshold: self.threshold,
                    };
                    let outcome = resolve_rank(pools, &buffers, &ctx, rank);
                    pools = outcome.pools;
                    if let Some(current) = stages.last_mut() {
                        current.matches_by_rank[rank] += outcome.committed.len();
                    }
                    debug!("Stage {} rank {}: {} committed", ctx.stage, rank, outcome.committed.len());
                    matched.extend(outcome.committed);

                    match RANKS.iter().position(|&r| r == rank) {
                        Some(i) if i + 1 < RANKS.len() => State::Resolving {
                            metric_idx,
                            rank: RANKS[i + 1],
                        },
                        _ => State::Draining { metric_idx },
                    }
                }
                State::Draining { metric_idx } => {
                    if let Some(current) = stages.last_mut() {
                        current.titles_remaining = pools.titles.len();
                        current.candidates_remaining = pools.candidates.len();
                        info!(
                            "Stage {} ({}): matched {} (ranks {:?}), {} titles / {} candidates left",
                            current.stage,
                            current.metric,
                            current.matches(),
                            current.matches_by_rank,
                            current.titles_remaining,
                            current.candidates_remaining
                        );
                    }
                    buffers.clear();

                    let next = metric_idx + 1;
                    if pools.exhausted() || next >= self.metrics.len() {
                        State::Done
                    } else {
                        State::Scoring { metric_idx: next }
                    }
                }
                State::Done => break,
            };
        }

        MatchOutcome {
            matched,
            unmatched_titles: pools.titles,
            unmatched_candidates: pools.candidates,
            stages,
        }
    }
}
