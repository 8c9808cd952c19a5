//! Record tables: the two-column input, the result materializer and the
//! BOM-prefixed output writer.
//!
//! Row identity is the 0-based position in the input file. It is the only key
//! used to join matches back, so the output always has the input's row order.

use csv::{ReaderBuilder, WriterBuilder};
use log::warn;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::TableError;
use crate::fuzz::Metric;
use crate::models::{MatchingStats, Title};
use crate::pool::Pool;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const OUTPUT_HEADERS: [&str; 6] = ["Title", "Path", "Score", "Metric", "Stage", "Rank"];

// ============================================================================
// Input
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputRow {
    pub index: usize,
    pub title: String,
    /// Pre-known path; these rows are never matched
    pub path: Option<String>,
}

#[derive(Clone, Debug)]
pub struct InputTable {
    pub source: PathBuf,
    pub rows: Vec<InputRow>,
}

impl InputTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read a headerless csv whose first column is the title and whose second
/// (optional) column is an already-known path.
pub fn read_input_table(path: &Path) -> Result<InputTable, TableError> {
    let read_err = |source| TableError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(read_err)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(read_err)?;
        let Some(raw_title) = record.get(0) else {
            return Err(TableError::Malformed {
                path: path.to_path_buf(),
                row: index,
            });
        };
        let title = if index == 0 {
            raw_title.trim_start_matches('\u{feff}')
        } else {
            raw_title
        };
        let known = record
            .get(1)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        rows.push(InputRow {
            index,
            title: title.to_string(),
            path: known,
        });
    }

    Ok(InputTable {
        source: path.to_path_buf(),
        rows,
    })
}

/// Split the table into the title pool (rows without a path) and the set of
/// pre-known paths used to exclude candidates.
pub fn build_title_pool(
    table: &InputTable,
    fold_ascii: bool,
    stats: &mut MatchingStats,
) -> (Pool<Title>, FxHashSet<String>) {
    stats.input_rows = table.len();
    let mut pool = Pool::new();
    let mut prematched = FxHashSet::default();

    for row in &table.rows {
        if let Some(known) = &row.path {
            prematched.insert(known.clone());
            stats.prematched_rows += 1;
            continue;
        }
        let title = Title::new(&row.title, row.index, fold_ascii);
        if title.processed.is_empty() {
            stats.blank_titles += 1;
            continue;
        }
        if let Err(dup) = pool.insert(title) {
            warn!(
                "Row {} title '{}' compares equal to an earlier title; it will stay unmatched",
                dup.row_index, dup.text
            );
            stats.duplicate_titles += 1;
        }
    }

    stats.title_pool = pool.len();
    (pool, prematched)
}

// ============================================================================
// Result materializer
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRow {
    pub index: usize,
    pub title: String,
    pub path: Option<String>,
    pub score: Option<u8>,
    pub metric: Option<Metric>,
    pub stage: Option<usize>,
    pub rank: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultTable {
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn matched_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.score.is_some()).count()
    }
}

/// Copy the input table and fill the augmentation columns of every row whose
/// title carries a match record. Matches are joined by row index.
pub fn materialize(table: &InputTable, matched: &[Title]) -> ResultTable {
    let mut rows: Vec<ResultRow> = table
        .rows
        .iter()
        .map(|row| ResultRow {
            index: row.index,
            title: row.title.clone(),
            path: row.path.clone(),
            score: None,
            metric: None,
            stage: None,
            rank: None,
        })
        .collect();

    for title in matched {
        let Some(record) = &title.match_result else {
            continue;
        };
        let Some(row) = rows.get_mut(title.row_index) else {
            warn!("Match for unknown row {} dropped", title.row_index);
            continue;
        };
        row.path = Some(record.candidate_name.clone());
        row.score = Some(record.score);
        row.metric = Some(record.metric);
        row.stage = Some(record.stage);
        row.rank = Some(record.rank);
    }

    ResultTable { rows }
}

// ============================================================================
// Output
// ============================================================================

/// Write the result table as a UTF-8 csv with a byte-order mark and header.
pub fn write_result_table(table: &ResultTable, path: &Path) -> Result<(), TableError> {
    let write_err = |source| TableError::Write {
        path: path.to_path_buf(),
        source,
    };
    let encode_err = |source| TableError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut buf_writer = BufWriter::with_capacity(64 * 1024, file);
    buf_writer.write_all(UTF8_BOM).map_err(write_err)?;

    let mut w = WriterBuilder::new().from_writer(buf_writer);
    w.write_record(OUTPUT_HEADERS).map_err(encode_err)?;
    for row in &table.rows {
        w.write_record([
            row.title.clone(),
            row.path.clone().unwrap_or_default(),
            opt_to_string(row.score),
            row.metric.map(|m| m.as_str().to_string()).unwrap_or_default(),
            opt_to_string(row.stage),
            opt_to_string(row.rank),
        ])
        .map_err(encode_err)?;
    }
    w.flush().map_err(write_err)?;
    Ok(())
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchRecord;
    use std::fs;

    fn write_input(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("titles.csv");
        fs::write(&path, content).unwrap();
        path
    }

    fn matched_title(text: &str, row: usize, candidate: &str) -> Title {
        let mut title = Title::new(text, row, false);
        title.match_result = Some(MatchRecord {
            candidate_name: candidate.to_string(),
            candidate_path: PathBuf::from(candidate),
            is_file: true,
            score: 93,
            rank: 1,
            metric: Metric::TokenSortRatio,
            stage: 3,
            threshold: 90,
        });
        title
    }

    #[test]
    fn test_read_input_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), "\u{feff}Alpha Episode 1,\nBeta Part Two\n\"Gamma, the Sequel\",Gamma Folder\n");

        let table = read_input_table(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].title, "Alpha Episode 1");
        assert_eq!(table.rows[0].path, None);
        assert_eq!(table.rows[1].path, None);
        assert_eq!(table.rows[2].title, "Gamma, the Sequel");
        assert_eq!(table.rows[2].path.as_deref(), Some("Gamma Folder"));
        assert_eq!(table.rows[2].index, 2);
    }

    #[test]
    fn test_read_invalid_utf8_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("titles.csv");
        fs::write(&path, b"Alpha,\n\xFF\xFE broken,\n").unwrap();
        assert!(matches!(read_input_table(&path), Err(TableError::Read { .. })));
    }

    #[test]
    fn test_build_title_pool_skips_known_blank_and_duplicates() {
        let table = InputTable {
            source: PathBuf::from("titles.csv"),
            rows: vec![
                InputRow { index: 0, title: "Alpha".into(), path: None },
                InputRow { index: 1, title: "Gamma".into(), path: Some("Gamma Folder".into()) },
                InputRow { index: 2, title: "  ".into(), path: None },
                InputRow { index: 3, title: "alpha!".into(), path: None },
            ],
        };
        let mut stats = MatchingStats::default();
        let (pool, prematched) = build_title_pool(&table, false, &mut stats);

        assert_eq!(pool.len(), 1);
        assert!(prematched.contains("Gamma Folder"));
        assert_eq!(stats.input_rows, 4);
        assert_eq!(stats.prematched_rows, 1);
        assert_eq!(stats.blank_titles, 1);
        assert_eq!(stats.duplicate_titles, 1);
        assert_eq!(stats.title_pool, 1);
    }

    #[test]
    fn test_materialize_joins_by_row_index() {
        let table = InputTable {
            source: PathBuf::from("titles.csv"),
            rows: vec![
                InputRow { index: 0, title: "Alpha".into(), path: None },
                InputRow { index: 1, title: "Gamma".into(), path: Some("Gamma Folder".into()) },
                InputRow { index: 2, title: "Beta".into(), path: None },
            ],
        };
        let matched = vec![matched_title("Beta", 2, "beta.txt")];

        let result = materialize(&table, &matched);
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0].path, None);
        assert_eq!(result.rows[0].score, None);
        assert_eq!(result.rows[1].path.as_deref(), Some("Gamma Folder"));
        assert_eq!(result.rows[1].metric, None);
        assert_eq!(result.rows[2].path.as_deref(), Some("beta.txt"));
        assert_eq!(result.rows[2].score, Some(93));
        assert_eq!(result.rows[2].metric, Some(Metric::TokenSortRatio));
        assert_eq!(result.rows[2].stage, Some(3));
        assert_eq!(result.rows[2].rank, Some(1));
        assert_eq!(result.matched_rows(), 1);

        // Same committed state, same table
        assert_eq!(materialize(&table, &matched), result);
    }

    #[test]
    fn test_write_result_table_has_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("matched.csv");
        let table = ResultTable {
            rows: vec![
                ResultRow {
                    index: 0,
                    title: "Alpha, Part 1".into(),
                    path: Some("alpha.mkv".into()),
                    score: Some(97),
                    metric: Some(Metric::Ratio),
                    stage: Some(1),
                    rank: Some(0),
                },
                ResultRow {
                    index: 1,
                    title: "Beta".into(),
                    path: None,
                    score: None,
                    metric: None,
                    stage: None,
                    rank: None,
                },
            ],
        };
        write_result_table(&table, &out).unwrap();

        let bytes = fs::read(&out).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Title,Path,Score,Metric,Stage,Rank");
        assert_eq!(lines[1], "\"Alpha, Part 1\",alpha.mkv,97,ratio,1,0");
        assert_eq!(lines[2], "Beta,,,,,");
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nope").join("matched.csv");
        let err = write_result_table(&ResultTable { rows: vec![] }, &out).unwrap_err();
        assert!(matches!(err, TableError::Write { .. }));
    }
}
