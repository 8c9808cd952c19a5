//! Terminal feedback for scoring rounds and the directory scan.
//!
//! Interactive runs get an indicatif bar per escalation stage. With
//! `--log-only` the bars are hidden and scoring progress goes through the
//! `log` facade instead, so a redirected run still shows how far each stage got.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// "4.2s" under a minute, "1.5m" above.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Bar counting scored titles within one stage. Hidden in log-only mode.
pub fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} titles ({per_sec}, ETA: {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(msg.to_string());
    pb
}

fn should_report(current: u64, total: u64, interval: u64) -> bool {
    total > 0 && (current % interval.max(1) == 0 || current == total)
}

/// Log-only counterpart of the stage bar: one line every `interval` titles
/// and one at the end.
pub fn log_progress(stage: &str, current: u64, total: u64, interval: u64) {
    if is_log_only() && should_report(current, total, interval) {
        let pct = 100.0 * current as f64 / total as f64;
        info!("[{}] scored {}/{} titles ({:.1}%)", stage, current, total, pct);
    }
}

/// Spinner shown while the files directory is listed.
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg} {spinner} [{elapsed_precise}]") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(msg.to_string());
    pb
}
