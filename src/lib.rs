//! Title matcher library - multi-round fuzzy matching of titles to directory entries.

pub mod candidates;
pub mod config;
pub mod engine;
pub mod error;
pub mod fuzz;
pub mod models;
pub mod normalize;
pub mod pool;
pub mod preflight;
pub mod progress;
pub mod resolver;
pub mod scorer;
pub mod table;
