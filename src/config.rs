//! Run configuration: artifact paths, threshold and metric selection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::fuzz::Metric;

/// Minimum score a pair needs to be committed
pub const DEFAULT_THRESHOLD: u8 = 90;

pub const DEFAULT_INPUT_CSV: &str = "titles.csv";
pub const DEFAULT_FILES_DIR: &str = "files";
pub const DEFAULT_OUTPUT_CSV: &str = "matched.csv";

/// Which metrics the escalation loop walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricSelector {
    /// Every metric, strictest first
    #[default]
    All,
    /// Exactly one scoring + resolving pass
    Single(Metric),
}

impl MetricSelector {
    pub fn sequence(self) -> Vec<Metric> {
        match self {
            MetricSelector::All => Metric::ALL.to_vec(),
            MetricSelector::Single(metric) => vec![metric],
        }
    }
}

impl fmt::Display for MetricSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricSelector::All => f.write_str("all"),
            MetricSelector::Single(metric) => write!(f, "{}", metric),
        }
    }
}

impl FromStr for MetricSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "all" {
            Ok(MetricSelector::All)
        } else {
            s.parse().map(MetricSelector::Single)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    pub threshold: u8,
    pub metrics: MetricSelector,
    /// Fold comparison text to ASCII before scoring
    pub fold_ascii: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            metrics: MetricSelector::All,
            fold_ascii: false,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold > 100 {
            return Err(ConfigError::InvalidValue {
                field: "threshold",
                reason: format!("{} is outside 0-100", self.threshold),
            });
        }
        Ok(())
    }
}

/// The three artifacts a run touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub input_csv: PathBuf,
    pub files_dir: PathBuf,
    pub output_csv: PathBuf,
}

impl RunPaths {
    /// Fill in the defaults (`titles.csv`, `files/`, `matched.csv`) relative to `cwd`.
    pub fn resolve(
        input_csv: Option<PathBuf>,
        files_dir: Option<PathBuf>,
        output_csv: Option<PathBuf>,
        cwd: &Path,
    ) -> Self {
        Self {
            input_csv: input_csv.unwrap_or_else(|| cwd.join(DEFAULT_INPUT_CSV)),
            files_dir: files_dir.unwrap_or_else(|| cwd.join(DEFAULT_FILES_DIR)),
            output_csv: output_csv.unwrap_or_else(|| cwd.join(DEFAULT_OUTPUT_CSV)),
        }
    }
}
