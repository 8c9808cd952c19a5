//! Error types for the matcher library.
//!
//! The binary wraps these in `anyhow` with context; the library keeps them
//! typed so callers can tell a bad path from a bad table.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("unknown metric '{0}' (expected one of: ratio, partial_ratio, token_sort_ratio, partial_token_sort_ratio, token_set_ratio, partial_token_set_ratio, all)")]
    UnknownMetric(String),
}

/// A single failed precondition, detected before any matching work begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("the input file at \"{}\" does not exist", .0.display())]
    MissingInput(PathBuf),
    #[error("the input path at \"{}\" is not a file", .0.display())]
    InputNotAFile(PathBuf),
    #[error("the input directory at \"{}\" does not exist", .0.display())]
    MissingDirectory(PathBuf),
    #[error("the input path at \"{}\" is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("the input directory at \"{}\" is empty", .0.display())]
    EmptyDirectory(PathBuf),
    #[error("the output directory at \"{}\" does not exist", .0.display())]
    MissingOutputDirectory(PathBuf),
    #[error("the output file \"{}\" cannot be the same as the input file", .0.display())]
    OutputIsInput(PathBuf),
}

/// Every precondition failure found by a preflight pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightError(pub Vec<PreconditionError>);

impl fmt::Display for PreflightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} precondition(s) failed:", self.0.len())?;
        for problem in &self.0 {
            writeln!(f, "  - {}", problem)?;
        }
        Ok(())
    }
}

impl std::error::Error for PreflightError {}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("the file at \"{}\" couldn't be read: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("the file at \"{}\" couldn't be written: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("the csv writer for \"{}\" failed: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("row {row} of \"{}\" has no columns", path.display())]
    Malformed { path: PathBuf, row: usize },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("the directory at \"{}\" couldn't be listed: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
