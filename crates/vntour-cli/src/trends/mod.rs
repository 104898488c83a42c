//! Google Trends command handlers for the CLI.
//!
//! `fetch` turns the keyword mapping into anchored groups and writes one raw
//! CSV per group; `analyze` reads those files back and writes the monthly and
//! summary outputs.

mod analyze;
mod fetch;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;
use vntour_core::AppConfig;

pub(crate) use analyze::run_trends_analyze;
pub(crate) use fetch::run_trends_fetch;
#[cfg(test)]
pub(crate) use fetch::resolve_timeframe;

/// Anchor term shared by every group unless overridden.
pub(crate) const DEFAULT_ANCHOR: &str = "Rau má";

/// Sub-commands available under `trends`.
#[derive(Debug, Subcommand)]
pub enum TrendsCommands {
    /// Fetch interest over time for every keyword group
    Fetch(FetchArgs),
    /// Normalize raw group files and compute monthly trends and summary stats
    Analyze(AnalyzeArgs),
}

#[derive(Debug, clap::Args)]
pub struct FetchArgs {
    /// Keyword mapping CSV (`normalized_name`, `verified_keyword` or `keyword` column)
    #[arg(long, default_value = "keyword_mapping.csv")]
    pub keywords_file: PathBuf,
    /// Raw tourism CSV to normalize into `--keywords-file` before fetching
    #[arg(long)]
    pub source_csv: Option<PathBuf>,
    /// Field delimiter of `--source-csv`
    #[arg(long, default_value_t = ';')]
    pub delimiter: char,
    /// Preset timeframe such as "today 12-m" or "today 5-y"
    #[arg(long, conflicts_with_all = ["start_date", "end_date"])]
    pub timeframe: Option<String>,
    /// Start of an explicit date range (YYYY-MM-DD); requires --end-date
    #[arg(long, requires = "end_date")]
    pub start_date: Option<NaiveDate>,
    /// End of an explicit date range (YYYY-MM-DD); requires --start-date
    #[arg(long, requires = "start_date")]
    pub end_date: Option<NaiveDate>,
    /// Destinations per request (capped at 4 with an anchor)
    #[arg(long)]
    pub group_size: Option<usize>,
    /// Pause between groups in milliseconds
    #[arg(long)]
    pub group_delay_ms: Option<u64>,
    /// Back-off between rate-limited attempts in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,
    /// Extra attempts per group on rate limiting (0 = one call per group)
    #[arg(long)]
    pub max_retries: Option<u32>,
    /// Anchor keyword placed first in every group
    #[arg(long, default_value = DEFAULT_ANCHOR)]
    pub anchor: String,
    /// Query destinations without an anchor
    #[arg(long)]
    pub no_anchor: bool,
    /// Re-fetch groups whose raw file already exists
    #[arg(long)]
    pub no_resume: bool,
    /// Directory for `dest_group_NNN.csv` files and `failed_groups.txt`
    #[arg(long, default_value = "dest_trends_raw")]
    pub raw_dir: PathBuf,
    /// First group to fetch (1-based, inclusive)
    #[arg(long)]
    pub start_group: Option<usize>,
    /// Last group to fetch (1-based, inclusive)
    #[arg(long)]
    pub end_group: Option<usize>,
}

#[derive(Debug, clap::Args)]
pub struct AnalyzeArgs {
    /// Directory holding `dest_group_*.csv` files
    #[arg(long, default_value = "dest_trends_raw")]
    pub raw_dir: PathBuf,
    /// Keyword mapping CSV to check for keywords that collapse together
    #[arg(long)]
    pub keywords_file: Option<PathBuf>,
    /// Anchor keyword used when fetching
    #[arg(long, default_value = DEFAULT_ANCHOR)]
    pub anchor: String,
    /// Rescale every group by its anchor
    #[arg(long)]
    pub normalize: bool,
    /// Value the anchor is scaled to (default from `VNTOUR_TRENDS_REFERENCE`)
    #[arg(long)]
    pub reference: Option<f64>,
    #[arg(long, default_value = "destination_monthly_trends.csv")]
    pub monthly_output: PathBuf,
    #[arg(long, default_value = "destination_summary_stats.csv")]
    pub summary_output: PathBuf,
    /// Optional row-level output of the (normalized) raw data
    #[arg(long)]
    pub rows_output: Option<PathBuf>,
    /// Rows in the printed ranking table
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}

pub(crate) async fn run(config: &AppConfig, command: TrendsCommands) -> anyhow::Result<()> {
    match command {
        TrendsCommands::Fetch(args) => run_trends_fetch(config, &args).await,
        TrendsCommands::Analyze(args) => run_trends_analyze(config, &args),
    }
}
