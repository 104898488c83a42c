//! YouTube command handlers for the CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Subcommand;
use vntour_core::{AppConfig, ProvinceMatcher, ProvinceRecord};
use vntour_youtube::{
    fetch_hashtag, fetch_provinces, write_rows, HashtagOptions, ProvinceOptions, YoutubeClient,
    PROVINCE_DELAY,
};

/// Longest `--days` window accepted by `youtube provinces`.
pub(crate) const MAX_DAYS: i64 = 36_500;

/// Sub-commands available under `youtube`.
#[derive(Debug, Subcommand)]
pub enum YoutubeCommands {
    /// Collect recent videos for one hashtag and count them per province
    Hashtag {
        /// Hashtag to search, with or without the leading '#'
        #[arg(long)]
        hashtag: String,
        /// Maximum videos to collect (each search page costs quota)
        #[arg(long, default_value_t = 100)]
        max_results: usize,
        /// Per-province count CSV (default: youtube_<hashtag>_counts.csv)
        #[arg(long)]
        counts_output: Option<PathBuf>,
        /// Per-video detail CSV (default: youtube_<hashtag>.csv)
        #[arg(long, conflicts_with = "no_details")]
        output: Option<PathBuf>,
        /// Skip the per-video detail CSV
        #[arg(long)]
        no_details: bool,
        /// Province table CSV (`id,name,region`); built-in table when omitted
        #[arg(long)]
        provinces: Option<PathBuf>,
    },
    /// Count recent videos for every province
    Provinces {
        /// Maximum videos counted per province
        #[arg(long, default_value_t = 50)]
        max_results_per_province: usize,
        /// Only count videos published within the last N days (0-36500)
        #[arg(
            long,
            default_value_t = 7,
            value_parser = clap::value_parser!(i64).range(0..=MAX_DAYS)
        )]
        days: i64,
        #[arg(long, default_value = "youtube_province_counts.csv")]
        output: PathBuf,
        /// Optional per-video CSV (costs one extra call per 50 videos)
        #[arg(long)]
        details_output: Option<PathBuf>,
        /// Province table CSV (`id,name,region`); built-in table when omitted
        #[arg(long)]
        provinces: Option<PathBuf>,
    },
}

pub(crate) async fn run(
    config: &AppConfig,
    api_key: Option<&str>,
    command: YoutubeCommands,
) -> anyhow::Result<()> {
    let client = build_client(config, api_key)?;
    let page_delay = Duration::from_millis(config.youtube_page_delay_ms);

    match command {
        YoutubeCommands::Hashtag {
            hashtag,
            max_results,
            counts_output,
            output,
            no_details,
            provinces,
        } => {
            let matcher = load_matcher(provinces.as_deref())?;
            let outputs = HashtagOutputs::resolve(&hashtag, counts_output, output, no_details);
            let options = HashtagOptions {
                hashtag,
                max_results,
                page_delay,
            };
            run_youtube_hashtag(&client, &matcher, &options, &outputs).await
        }
        YoutubeCommands::Provinces {
            max_results_per_province,
            days,
            output,
            details_output,
            provinces,
        } => {
            let matcher = load_matcher(provinces.as_deref())?;
            let options = ProvinceOptions {
                max_results_per_province,
                days,
                page_delay,
                province_delay: PROVINCE_DELAY,
                with_details: details_output.is_some(),
            };
            run_youtube_provinces(&client, &matcher, &options, &output, details_output.as_deref())
                .await
        }
    }
}

/// Builds the API client from `--api-key` or `YOUTUBE_API_KEY`.
///
/// # Errors
///
/// Returns an error if neither source provides a key.
fn build_client(config: &AppConfig, api_key: Option<&str>) -> anyhow::Result<YoutubeClient> {
    let key = api_key
        .filter(|k| !k.trim().is_empty())
        .or(config.youtube_api_key.as_deref())
        .ok_or_else(|| {
            anyhow::anyhow!("YOUTUBE_API_KEY is not set; pass --api-key or set the env var")
        })?;
    YoutubeClient::new(key, config.http_timeout_secs, &config.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build YouTube client: {e}"))
}

fn load_matcher(path: Option<&Path>) -> anyhow::Result<ProvinceMatcher> {
    let records = match path {
        Some(path) => ProvinceRecord::load_csv(path)?,
        None => ProvinceRecord::builtin(),
    };
    tracing::debug!(provinces = records.len(), "province table loaded");
    Ok(ProvinceMatcher::new(records))
}

/// Default detail CSV name for a hashtag run.
pub(crate) fn default_hashtag_output(hashtag: &str) -> PathBuf {
    PathBuf::from(format!("youtube_{}.csv", vntour_youtube::clean_hashtag(hashtag)))
}

/// Default count CSV name for a hashtag run.
pub(crate) fn default_counts_output(hashtag: &str) -> PathBuf {
    PathBuf::from(format!("youtube_{}_counts.csv", vntour_youtube::clean_hashtag(hashtag)))
}

/// Files a hashtag run writes. The count CSV is always written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HashtagOutputs {
    pub counts: PathBuf,
    pub details: Option<PathBuf>,
}

impl HashtagOutputs {
    pub(crate) fn resolve(
        hashtag: &str,
        counts: Option<PathBuf>,
        details: Option<PathBuf>,
        no_details: bool,
    ) -> Self {
        Self {
            counts: counts.unwrap_or_else(|| default_counts_output(hashtag)),
            details: (!no_details)
                .then(|| details.unwrap_or_else(|| default_hashtag_output(hashtag))),
        }
    }
}

/// Collects one hashtag and writes the count CSV plus the optional detail CSV.
///
/// # Errors
///
/// Returns an error if the first search page fails, the quota runs out, or an
/// output cannot be written.
pub(crate) async fn run_youtube_hashtag(
    client: &YoutubeClient,
    matcher: &ProvinceMatcher,
    options: &HashtagOptions,
    outputs: &HashtagOutputs,
) -> anyhow::Result<()> {
    let report = fetch_hashtag(client, matcher, options).await?;
    if report.videos.is_empty() {
        println!("no videos found for #{}", report.hashtag);
    }

    let counts = report.count_rows();
    write_rows(&outputs.counts, &counts)?;
    for row in &counts {
        println!("  {:<30} {:>5}", row.province, row.video_count);
    }
    println!("saved province counts to {}", outputs.counts.display());

    if let Some(path) = &outputs.details {
        write_rows(path, &report.detail_rows())?;
        println!("saved {} videos to {}", report.videos.len(), path.display());
    }
    Ok(())
}

async fn run_youtube_provinces(
    client: &YoutubeClient,
    matcher: &ProvinceMatcher,
    options: &ProvinceOptions,
    output: &Path,
    details_output: Option<&Path>,
) -> anyhow::Result<()> {
    let report = fetch_provinces(client, matcher, options, chrono::Utc::now()).await?;

    write_rows(output, &report.counts)?;
    let total: usize = report.counts.iter().map(|c| c.video_count).sum();
    println!(
        "saved counts for {} provinces ({} videos) to {}",
        report.counts.len(),
        total,
        output.display()
    );
    if let Some(path) = details_output {
        write_rows(path, &report.details)?;
        println!("saved {} video rows to {}", report.details.len(), path.display());
    }
    if !report.failed.is_empty() {
        println!(
            "{} province searches failed and were counted as zero: {}",
            report.failed.len(),
            report.failed.join(", ")
        );
    }
    Ok(())
}
