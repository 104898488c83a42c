//! Progress monitor for a long-running fetch job that logs `[n/total]` lines.
//!
//! Every poll re-reads the whole log, so nothing is kept between cycles and a
//! truncated or rotated log simply shows fresh counts.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use vntour_core::AppConfig;

static PROGRESS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[(\d+)/(\d+)\]").expect("valid progress regex"));

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

#[derive(Debug, clap::Args)]
pub struct MonitorArgs {
    /// Log file written by the job being watched
    #[arg(long, default_value = "weather_fetch.log")]
    pub log_file: PathBuf,
    /// Items the job will process in total (default from `VNTOUR_MONITOR_EXPECTED_TOTAL`)
    #[arg(long)]
    pub expected_total: Option<u64>,
    /// Seconds between polls (default from `VNTOUR_MONITOR_POLL_SECS`)
    #[arg(long)]
    pub interval_secs: Option<u64>,
    /// Log lines shown under the counters
    #[arg(long, default_value_t = 10)]
    pub tail_lines: usize,
    #[arg(long, default_value = "✅")]
    pub success_marker: String,
    #[arg(long, default_value = "❌")]
    pub failure_marker: String,
    /// Render a single snapshot and exit
    #[arg(long)]
    pub once: bool,
}

/// Counters derived from one read of the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub progress_lines: usize,
    pub success: usize,
    pub failure: usize,
    /// `(n, total)` from the last progress line.
    pub last_position: Option<(u64, u64)>,
    pub tail: Vec<String>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn completed(&self) -> usize {
        self.success + self.failure
    }

    /// Completed items as a percentage of `expected_total`; 0 when the total is 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self, expected_total: u64) -> f64 {
        if expected_total == 0 {
            return 0.0;
        }
        self.completed() as f64 / expected_total as f64 * 100.0
    }
}

/// Last `n` lines of `text`, oldest first.
#[must_use]
pub fn tail(text: &str, n: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].iter().map(|l| (*l).to_owned()).collect()
}

/// Counts progress lines carrying the success or failure marker.
#[must_use]
pub fn summarize_log(
    text: &str,
    success_marker: &str,
    failure_marker: &str,
    tail_lines: usize,
) -> ProgressSnapshot {
    let mut snapshot = ProgressSnapshot {
        tail: tail(text, tail_lines),
        ..ProgressSnapshot::default()
    };

    for line in text.lines() {
        let Some(caps) = PROGRESS_LINE.captures(line) else {
            continue;
        };
        snapshot.progress_lines += 1;
        if let (Ok(n), Ok(total)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) {
            snapshot.last_position = Some((n, total));
        }
        if !success_marker.is_empty() && line.contains(success_marker) {
            snapshot.success += 1;
        } else if !failure_marker.is_empty() && line.contains(failure_marker) {
            snapshot.failure += 1;
        }
    }
    snapshot
}

/// Terminal screen for one snapshot.
#[must_use]
pub fn render(
    snapshot: &ProgressSnapshot,
    expected_total: u64,
    log_file: &Path,
    now: &str,
) -> String {
    let rule = "=".repeat(70);
    let mut lines = vec![
        rule.clone(),
        format!("PROGRESS MONITOR  {}  ({now})", log_file.display()),
        rule.clone(),
        format!(
            "completed: {}/{} ({:.1}%)",
            snapshot.completed(),
            expected_total,
            snapshot.percent(expected_total)
        ),
        format!("success:   {}", snapshot.success),
        format!("failed:    {}", snapshot.failure),
    ];
    if let Some((n, total)) = snapshot.last_position {
        lines.push(format!("current:   [{n}/{total}]"));
    }
    lines.push("-".repeat(70));
    lines.extend(snapshot.tail.iter().cloned());
    lines.push(rule);
    lines.push("Ctrl-C to stop".to_owned());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Screen shown while the log file does not exist yet.
#[must_use]
pub fn render_waiting(log_file: &Path, now: &str) -> String {
    format!(
        "waiting for {} to appear... ({now})\nCtrl-C to stop\n",
        log_file.display()
    )
}

fn screen(args: &MonitorArgs, expected_total: u64) -> String {
    let now = chrono::Local::now().format("%H:%M:%S").to_string();
    // The job may be mid-write on a multi-byte marker.
    match std::fs::read(&args.log_file) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            let snapshot = summarize_log(
                &text,
                &args.success_marker,
                &args.failure_marker,
                args.tail_lines,
            );
            render(&snapshot, expected_total, &args.log_file, &now)
        }
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %args.log_file.display(), error = %e, "cannot read log file");
            }
            render_waiting(&args.log_file, &now)
        }
    }
}

/// Polls the log until Ctrl-C (or once with `--once`).
///
/// # Errors
///
/// Returns an error only if the Ctrl-C handler cannot be installed.
pub(crate) async fn run(config: &AppConfig, args: MonitorArgs) -> anyhow::Result<()> {
    let expected_total = args.expected_total.unwrap_or(config.monitor_expected_total);
    let poll_secs = args.interval_secs.unwrap_or(config.monitor_poll_secs).max(1);
    let interval = Duration::from_secs(poll_secs);

    if args.once {
        print!("{}", screen(&args, expected_total));
        return Ok(());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        print!("{CLEAR_SCREEN}{}", screen(&args, expected_total));
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                println!("\nmonitor stopped");
                return Ok(());
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}
