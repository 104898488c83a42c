use std::time::Duration;

use vntour_core::AppConfig;
use vntour_trends::{
    build_groups, fetch_groups, prepare_keywords, select_groups, FetchOptions, Timeframe,
    TrendsClient,
};

use super::FetchArgs;
use crate::keywords::run_keywords_normalize;

const KEYWORD_COLUMNS: &[&str] = &["normalized_name", "verified_keyword", "keyword"];

/// Picks the query timeframe: an explicit date range, a preset, or the default.
///
/// # Errors
///
/// Returns an error if the range is inverted.
pub(crate) fn resolve_timeframe(args: &FetchArgs) -> anyhow::Result<Timeframe> {
    match (args.start_date, args.end_date, &args.timeframe) {
        (Some(start), Some(end), _) => Timeframe::range(start, end).map_err(anyhow::Error::msg),
        (Some(_), None, _) | (None, Some(_), _) => {
            anyhow::bail!("--start-date and --end-date must be given together")
        }
        (None, None, Some(preset)) => Ok(Timeframe::Preset(preset.trim().to_owned())),
        (None, None, None) => Ok(Timeframe::default()),
    }
}

/// Fetches every selected keyword group and prints a run summary.
///
/// # Errors
///
/// Returns an error if the keyword file is unreadable or has no keyword
/// column, the client cannot be built, or the raw directory cannot be written.
/// Per-group failures are recorded in `failed_groups.txt` instead.
pub(crate) async fn run_trends_fetch(config: &AppConfig, args: &FetchArgs) -> anyhow::Result<()> {
    if let Some(source) = &args.source_csv {
        run_keywords_normalize(source, args.delimiter, &args.keywords_file)?;
    }

    let timeframe = resolve_timeframe(args)?;
    let raw = vntour_core::read_keyword_column(&args.keywords_file, b',', KEYWORD_COLUMNS)?;
    let anchor = (!args.no_anchor).then_some(args.anchor.trim()).filter(|a| !a.is_empty());
    let keywords = prepare_keywords(&raw, anchor);
    if keywords.is_empty() {
        anyhow::bail!("no usable keywords in {}", args.keywords_file.display());
    }

    let group_size = args.group_size.unwrap_or(config.trends_group_size);
    let groups = build_groups(&keywords, anchor, group_size);
    let selected = select_groups(&groups, args.start_group, args.end_group);
    tracing::info!(
        keywords = keywords.len(),
        groups = groups.len(),
        selected = selected.len(),
        anchor = anchor.unwrap_or("none"),
        timeframe = %timeframe,
        "prepared keyword groups"
    );
    if selected.is_empty() {
        println!("no groups in the requested range (1..={})", groups.len());
        return Ok(());
    }

    let client = TrendsClient::new(
        config.http_timeout_secs,
        &config.user_agent,
        &config.trends_hl,
        config.trends_tz,
        &config.trends_geo,
    )
    .map_err(|e| anyhow::anyhow!("failed to build trends client: {e}"))?;

    let options = FetchOptions {
        raw_dir: args.raw_dir.clone(),
        timeframe,
        group_delay: Duration::from_millis(args.group_delay_ms.unwrap_or(config.trends_group_delay_ms)),
        retry_delay: Duration::from_millis(args.retry_delay_ms.unwrap_or(config.trends_retry_delay_ms)),
        max_retries: args.max_retries.unwrap_or(config.trends_max_retries),
        resume: !args.no_resume,
    };
    let summary = fetch_groups(&client, selected, &options).await?;

    println!(
        "groups: {} selected, {} fetched, {} resumed, {} failed",
        summary.selected,
        summary.fetched.len(),
        summary.resumed.len(),
        summary.failed.len()
    );
    if !summary.failed.is_empty() {
        let failed: Vec<String> = summary.failed.iter().map(ToString::to_string).collect();
        println!(
            "failed groups: {} (listed in {})",
            failed.join(", "),
            args.raw_dir.join(vntour_trends::raw::FAILED_GROUPS_FILE).display()
        );
        println!("re-run with --start-group/--end-group to retry them");
    }
    Ok(())
}
