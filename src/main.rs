use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

use title_matcher::candidates::{build_candidate_pool, scan_directory};
use title_matcher::config::{MatchConfig, MetricSelector, RunPaths};
use title_matcher::engine::MatchEngine;
use title_matcher::models::MatchingStats;
use title_matcher::preflight::check_paths;
use title_matcher::progress::{create_spinner, format_duration, set_log_only};
use title_matcher::table::{build_title_pool, materialize, read_input_table, write_result_table};

#[derive(Parser)]
#[command(name = "title-matcher")]
#[command(about = "Match a csv column of titles to the entries of a directory")]
struct Args {
    /// Headerless csv: title, optional known path
    #[arg(short = 'c', long)]
    csv_path: Option<PathBuf>,

    /// Directory whose direct entries are the candidates
    #[arg(short = 'f', long)]
    files_path: Option<PathBuf>,

    #[arg(short = 'o', long)]
    output_path: Option<PathBuf>,

    /// Minimum score (0-100) for a match to be committed
    #[arg(short = 't', long, default_value = "90", value_parser = clap::value_parser!(u8).range(0..=100))]
    threshold: u8,

    /// Metric id, or "all" to escalate through every metric
    #[arg(short = 'm', long, default_value = "all")]
    metric: MetricSelector,

    /// Fold accented letters to ASCII before scoring
    #[arg(long)]
    fold_ascii: bool,

    #[arg(long, default_value = "0")]
    workers: usize,

    /// Write run statistics as JSON
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Disable progress bars (for background runs)
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let start = Instant::now();

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let paths = RunPaths::resolve(args.csv_path, args.files_path, args.output_path, &cwd);

    if let Err(problems) = check_paths(&paths) {
        for problem in &problems.0 {
            error!("{}", problem);
        }
        bail!(problems);
    }

    let config = MatchConfig {
        threshold: args.threshold,
        metrics: args.metric,
        fold_ascii: args.fold_ascii,
    };
    config.validate()?;

    let mut stats = MatchingStats {
        threshold: config.threshold,
        ..Default::default()
    };

    let table = read_input_table(&paths.input_csv)?;
    info!("Read {} rows from {:?}", table.len(), table.source);
    let (titles, prematched) = build_title_pool(&table, config.fold_ascii, &mut stats);
    info!(
        "{} rows: {} to match, {} with a known path, {} blank, {} duplicate",
        stats.input_rows,
        stats.title_pool,
        stats.prematched_rows,
        stats.blank_titles,
        stats.duplicate_titles
    );

    let spinner = create_spinner("Scanning files directory...");
    let scanned = scan_directory(&paths.files_dir, config.fold_ascii)?;
    spinner.finish_and_clear();
    let candidates = build_candidate_pool(scanned, &prematched, &mut stats);
    info!(
        "{} entries in {:?}: {} candidates, {} already claimed, {} duplicate",
        stats.directory_entries,
        paths.files_dir,
        stats.candidate_pool,
        stats.excluded_candidates,
        stats.duplicate_candidates
    );

    if titles.is_empty() || candidates.is_empty() {
        warn!("Nothing to match; the output will be a copy of the input");
    }

    let engine = MatchEngine::new(&config);
    info!(
        "Matching with threshold {} over {} metric(s): {}",
        config.threshold,
        engine.metrics().len(),
        config.metrics
    );
    let outcome = engine.run(titles, candidates);

    stats.total_matches = outcome.total_matches();
    stats.unmatched_titles = outcome.unmatched_titles.len();
    stats.unmatched_candidates = outcome.unmatched_candidates.len();
    stats.stages = outcome.stages.clone();

    let result = materialize(&table, &outcome.matched);
    write_result_table(&result, &paths.output_csv)
        .with_context(|| format!("Failed to write results to {:?}", paths.output_csv))?;

    let elapsed = start.elapsed();
    stats.elapsed_seconds = elapsed.as_secs_f64();

    if args.log_only {
        stats.log_phase("final");
    }

    if let Some(stats_path) = &args.stats {
        stats
            .write_to_file(stats_path)
            .with_context(|| format!("Failed to write stats to {:?}", stats_path))?;
    }

    println!("\n{:=<60}", "");
    println!("Matching complete!");
    println!("  Rows: {}", stats.input_rows);
    println!(
        "  Matched: {}/{} ({:.1}%)",
        stats.total_matches,
        stats.title_pool,
        stats.match_rate()
    );
    for stage in &stats.stages {
        println!(
            "    Stage {} {:<26} {:>6} (ranks {}/{}/{})",
            stage.stage,
            stage.metric,
            stage.matches(),
            stage.matches_by_rank[0],
            stage.matches_by_rank[1],
            stage.matches_by_rank[2]
        );
    }
    println!("  Unmatched titles: {}", stats.unmatched_titles);
    println!("  Unused candidates: {}", stats.unmatched_candidates);
    println!("  Output: {:?}", paths.output_csv);
    println!("  Elapsed: {}", format_duration(elapsed));
    println!("{:=<60}", "");

    Ok(())
}
