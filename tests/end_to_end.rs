use std::fs;
use std::path::Path;
use std::process::Command;

use title_matcher::candidates::{build_candidate_pool, scan_directory};
use title_matcher::config::{MatchConfig, MetricSelector};
use title_matcher::engine::MatchEngine;
use title_matcher::fuzz::Metric;
use title_matcher::models::MatchingStats;
use title_matcher::table::{build_title_pool, materialize, read_input_table, write_result_table};

const BOM: &str = "\u{feff}";

fn setup(root: &Path) {
    fs::write(
        root.join("titles.csv"),
        "Alpha Episode 1,\nBeta Part Two,\nGamma,\nDelta,Delta Notes.txt\n",
    )
    .unwrap();
    let files = root.join("files");
    fs::create_dir(&files).unwrap();
    fs::write(files.join("Alpha_Ep01.mkv"), b"").unwrap();
    fs::write(files.join("Beta_Pt2"), b"").unwrap();
    fs::write(files.join("Delta Notes.txt"), b"").unwrap();
    fs::create_dir(files.join("Gamma Folder")).unwrap();
}

fn run_pipeline(root: &Path, config: &MatchConfig) -> String {
    let mut stats = MatchingStats::default();
    let table = read_input_table(&root.join("titles.csv")).unwrap();
    let (titles, prematched) = build_title_pool(&table, config.fold_ascii, &mut stats);
    let scanned = scan_directory(&root.join("files"), config.fold_ascii).unwrap();
    let candidates = build_candidate_pool(scanned, &prematched, &mut stats);
    assert_eq!(stats.excluded_candidates, 1);

    let outcome = MatchEngine::new(config).run(titles, candidates);
    let result = materialize(&table, &outcome.matched);
    let out = root.join("matched.csv");
    write_result_table(&result, &out).unwrap();
    fs::read_to_string(out).unwrap()
}

#[test]
fn test_escalation_pipeline_writes_augmented_table() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());

    let config = MatchConfig {
        threshold: 95,
        metrics: MetricSelector::All,
        fold_ascii: false,
    };
    let written = run_pipeline(dir.path(), &config);

    assert!(written.starts_with(BOM));
    let lines: Vec<&str> = written.trim_start_matches(BOM).lines().collect();
    assert_eq!(
        lines,
        vec![
            "Title,Path,Score,Metric,Stage,Rank",
            "Alpha Episode 1,Alpha_Ep01.mkv,100,partial_token_set_ratio,6,0",
            "Beta Part Two,Beta_Pt2,100,partial_token_set_ratio,6,0",
            "Gamma,Gamma Folder,100,partial_ratio,2,0",
            "Delta,Delta Notes.txt,,,,",
        ]
    );
}

#[test]
fn test_strict_single_metric_leaves_table_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());

    let config = MatchConfig {
        threshold: 95,
        metrics: MetricSelector::Single(Metric::Ratio),
        fold_ascii: false,
    };
    let written = run_pipeline(dir.path(), &config);
    let lines: Vec<&str> = written.trim_start_matches(BOM).lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "Alpha Episode 1,,,,,");
    assert_eq!(lines[3], "Gamma,,,,,");
    assert_eq!(lines[4], "Delta,Delta Notes.txt,,,,");
}

#[test]
fn test_cli_matches_and_writes_stats() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());
    let stats_path = dir.path().join("stats.json");

    let status = Command::new(env!("CARGO_BIN_EXE_title-matcher"))
        .current_dir(dir.path())
        .args(["--threshold", "95", "--log-only", "--stats"])
        .arg(&stats_path)
        .status()
        .unwrap();
    assert!(status.success());

    let written = fs::read_to_string(dir.path().join("matched.csv")).unwrap();
    assert!(written.contains("Gamma,Gamma Folder,100,partial_ratio,2,0"));

    let stats: serde_json::Value = serde_json::from_str(&fs::read_to_string(stats_path).unwrap()).unwrap();
    assert_eq!(stats["total_matches"], 3);
    assert_eq!(stats["prematched_rows"], 1);
    assert_eq!(stats["stages"].as_array().unwrap().len(), 6);
}

#[test]
fn test_cli_rejects_bad_paths_before_writing() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_title-matcher"))
        .current_dir(dir.path())
        .args(["-c", "missing.csv", "-f", "nowhere"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2 precondition(s) failed"));
    assert!(!dir.path().join("matched.csv").exists());
}

#[test]
fn test_cli_rejects_out_of_range_threshold() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());

    let status = Command::new(env!("CARGO_BIN_EXE_title-matcher"))
        .current_dir(dir.path())
        .args(["-t", "150"])
        .status()
        .unwrap();
    assert!(!status.success());
    assert!(!dir.path().join("matched.csv").exists());
}
