//! Candidate discovery: one candidate per direct entry of the files directory.

use log::warn;
use rustc_hash::FxHashSet;
use std::fs;
use std::path::Path;

use crate::error::ScanError;
use crate::models::{Candidate, MatchingStats};
use crate::pool::Pool;

/// List the directory's direct entries as candidates, sorted by file name.
///
/// Files are compared by their stem and displayed by their full name;
/// directories use their name for both. Names that are not valid UTF-8 are
/// read lossily; the entry keeps its real path.
pub fn scan_directory(dir: &Path, fold_ascii: bool) -> Result<Vec<Candidate>, ScanError> {
    let io_err = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy().into_owned();
        if file_name.to_str().is_none() {
            warn!("Entry name is not UTF-8, comparing as '{}': {}", name, path.display());
        }
        // Follows symlinks, like Path::is_file
        let is_file = path.is_file();
        entries.push((name, path, is_file));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let candidates = entries
        .into_iter()
        .map(|(name, path, is_file)| {
            let title_text = match path.file_stem() {
                Some(stem) if is_file => stem.to_string_lossy().into_owned(),
                _ => name.clone(),
            };
            Candidate::new(path, &name, &title_text, is_file, fold_ascii)
        })
        .collect();
    Ok(candidates)
}

/// Build the candidate pool, leaving out entries already claimed by a
/// pre-known path and entries whose comparison text duplicates an earlier one.
pub fn build_candidate_pool(
    candidates: Vec<Candidate>,
    prematched: &FxHashSet<String>,
    stats: &mut MatchingStats,
) -> Pool<Candidate> {
    stats.directory_entries = candidates.len();
    let mut pool = Pool::new();
    for candidate in candidates {
        if prematched.contains(&candidate.display_name) {
            stats.excluded_candidates += 1;
            continue;
        }
        if let Err(dup) = pool.insert(candidate) {
            warn!(
                "Candidate '{}' compares equal to an earlier entry; skipping it",
                dup.display_name
            );
            stats.duplicate_candidates += 1;
        }
    }
    stats.candidate_pool = pool.len();
    pool
}
