//! Similarity engine: the six metrics used by the escalation loop.
//!
//! All functions take already-processed text (see `normalize::process`) and
//! return an integer score 0-100. Any comparison involving an empty string
//! scores 0.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Number of ranked matches kept per title.
pub const TOP_K: usize = 3;

// ============================================================================
// Metric identifiers
// ============================================================================

/// String-similarity metric, ordered from strictest to most permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Ratio,
    PartialRatio,
    TokenSortRatio,
    PartialTokenSortRatio,
    TokenSetRatio,
    PartialTokenSetRatio,
}

impl Metric {
    /// Escalation order.
    pub const ALL: [Metric; 6] = [
        Metric::Ratio,
        Metric::PartialRatio,
        Metric::TokenSortRatio,
        Metric::PartialTokenSortRatio,
        Metric::TokenSetRatio,
        Metric::PartialTokenSetRatio,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Ratio => "ratio",
            Metric::PartialRatio => "partial_ratio",
            Metric::TokenSortRatio => "token_sort_ratio",
            Metric::PartialTokenSortRatio => "partial_token_sort_ratio",
            Metric::TokenSetRatio => "token_set_ratio",
            Metric::PartialTokenSetRatio => "partial_token_set_ratio",
        }
    }

    pub fn score(self, a: &str, b: &str) -> u8 {
        match self {
            Metric::Ratio => ratio(a, b),
            Metric::PartialRatio => partial_ratio(a, b),
            Metric::TokenSortRatio => token_sort_ratio(a, b),
            Metric::PartialTokenSortRatio => partial_token_sort_ratio(a, b),
            Metric::TokenSetRatio => token_set_ratio(a, b),
            Metric::PartialTokenSetRatio => partial_token_set_ratio(a, b),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownMetric(s.to_string()))
    }
}

// ============================================================================
// Core ratios
// ============================================================================

/// Length of the longest common subsequence.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Indel similarity (0.0 to 1.0): 2·LCS / (|a| + |b|).
fn indel_similarity(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    2.0 * lcs_len(a, b) as f64 / (a.len() + b.len()) as f64
}

fn to_score(similarity: f64) -> u8 {
    (similarity * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Full-string edit-distance ratio.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    to_score(indel_similarity(&a, &b))
}

/// Best alignment of the shorter string against every same-length window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut best = 0.0f64;
    for window in longer.windows(shorter.len()) {
        let sim = indel_similarity(shorter, window);
        if sim > best {
            best = sim;
            if best >= 1.0 {
                break;
            }
        }
    }
    to_score(best)
}

// ============================================================================
// Token ratios
// ============================================================================

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

pub fn partial_token_sort_ratio(a: &str, b: &str) -> u8 {
    partial_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn token_set_with(a: &str, b: &str, scorer: fn(&str, &str) -> u8) -> u8 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0;
    }

    let join = |set: Vec<&str>| set.join(" ");
    let sect = join(tokens_a.intersection(&tokens_b).copied().collect());
    let diff_ab = join(tokens_a.difference(&tokens_b).copied().collect());
    let diff_ba = join(tokens_b.difference(&tokens_a).copied().collect());

    let combined_ab = format!("{} {}", sect, diff_ab).trim().to_string();
    let combined_ba = format!("{} {}", sect, diff_ba).trim().to_string();

    scorer(&sect, &combined_ab)
        .max(scorer(&sect, &combined_ba))
        .max(scorer(&combined_ab, &combined_ba))
}

pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    token_set_with(a, b, ratio)
}

pub fn partial_token_set_ratio(a: &str, b: &str) -> u8 {
    token_set_with(a, b, partial_ratio)
}

// ============================================================================
// Extraction
// ============================================================================

/// Score `query` against every choice and return the best `limit` as
/// (choice index, score), descending, ties kept in input order.
pub fn extract<S: AsRef<str>>(query: &str, choices: &[S], metric: Metric, limit: usize) -> Vec<(usize, u8)> {
    let mut scored: Vec<(usize, u8)> = choices
        .iter()
        .enumerate()
        .map(|(idx, choice)| (idx, metric.score(query, choice.as_ref())))
        .collect();
    // Stable sort keeps input order among equal scores
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(limit);
    scored
}

// ============================================================================
// TESTS
// ============================================================================
