//! Group-by-group trends fetching with resume and a failed-groups list.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::TrendsClient;
use crate::error::TrendsError;
use crate::raw::{
    append_failed_group, group_path, read_failed_groups, write_failed_groups, write_group_csv,
};
use crate::retry::retry_fixed;
use crate::types::{RawTrendRow, Timeframe, TimelinePoint, TrendGroup};

/// Knobs for one fetch run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub raw_dir: PathBuf,
    pub timeframe: Timeframe,
    /// Pause between consecutive API calls for different groups.
    pub group_delay: Duration,
    /// Fixed back-off between attempts for the same group.
    pub retry_delay: Duration,
    /// Extra attempts per group on rate limiting; `0` means one call per group.
    pub max_retries: u32,
    /// Skip groups whose raw CSV already exists.
    pub resume: bool,
}

/// Outcome of a fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub selected: usize,
    pub fetched: Vec<usize>,
    pub resumed: Vec<usize>,
    pub failed: Vec<usize>,
    /// Groups listed as failed by an earlier run that now have a raw file.
    pub cleared: Vec<usize>,
}

/// Fetches each group in order, writing one raw CSV per successful group.
///
/// A group that fails (after any retries) is logged, appended to the
/// failed-groups list, and skipped; the run always continues to the next
/// group after `group_delay`. Once all groups are processed the list is
/// rewritten without the groups that were fetched or resumed.
///
/// # Errors
///
/// Returns [`TrendsError::Io`] only if the raw directory cannot be created or
/// the failed-groups list cannot be written. Per-group API and write failures
/// are recorded in the summary instead.
pub async fn fetch_groups(
    client: &TrendsClient,
    groups: &[TrendGroup],
    options: &FetchOptions,
) -> Result<FetchSummary, TrendsError> {
    std::fs::create_dir_all(&options.raw_dir).map_err(|e| TrendsError::Io {
        path: options.raw_dir.display().to_string(),
        source: e,
    })?;

    let mut summary = FetchSummary {
        selected: groups.len(),
        ..FetchSummary::default()
    };
    let previously_failed: BTreeSet<usize> =
        read_failed_groups(&options.raw_dir).into_iter().collect();
    if !previously_failed.is_empty() {
        tracing::info!(
            groups = ?previously_failed,
            "earlier run recorded failed groups; retrying those in range"
        );
    }
    let mut called_api = false;

    for group in groups {
        let path = group_path(&options.raw_dir, group.index);
        if options.resume && path.exists() {
            tracing::info!(group = group.index, path = %path.display(), "resume: raw file exists");
            summary.resumed.push(group.index);
            continue;
        }

        if called_api && !options.group_delay.is_zero() {
            tracing::debug!(delay_ms = options.group_delay.as_millis(), "waiting between groups");
            tokio::time::sleep(options.group_delay).await;
        }
        called_api = true;

        let keywords = group.keywords();
        tracing::info!(
            group = group.index,
            keywords = %keywords.join(", "),
            "fetching group"
        );

        let result = retry_fixed(options.max_retries, options.retry_delay, || {
            client.interest_over_time(&keywords, &options.timeframe)
        })
        .await
        .and_then(|points| {
            let rows = points_to_rows(group, &keywords, &points);
            write_group_csv(&path, &rows).map(|()| rows.len())
        });

        match result {
            Ok(rows) => {
                tracing::info!(group = group.index, rows, path = %path.display(), "saved group");
                summary.fetched.push(group.index);
            }
            Err(e) => {
                tracing::error!(
                    group = group.index,
                    destinations = %group.destinations.join(", "),
                    error = %e,
                    "group failed; recorded for retry"
                );
                append_failed_group(&options.raw_dir, group.index)?;
                summary.failed.push(group.index);
            }
        }
    }

    let present: BTreeSet<usize> =
        summary.fetched.iter().chain(&summary.resumed).copied().collect();
    summary.cleared = previously_failed.intersection(&present).copied().collect();
    let remaining: Vec<usize> = previously_failed
        .iter()
        .chain(&summary.failed)
        .filter(|index| !present.contains(*index))
        .copied()
        .collect();
    write_failed_groups(&options.raw_dir, &remaining)?;

    tracing::info!(
        selected = summary.selected,
        fetched = summary.fetched.len(),
        resumed = summary.resumed.len(),
        failed = summary.failed.len(),
        cleared = summary.cleared.len(),
        "fetch complete"
    );
    Ok(summary)
}

/// Flattens timeline points into long-format rows, pairing each value with
/// the keyword at the same position in the query.
#[must_use]
pub fn points_to_rows(
    group: &TrendGroup,
    keywords: &[String],
    points: &[TimelinePoint],
) -> Vec<RawTrendRow> {
    let mut rows = Vec::with_capacity(points.len() * keywords.len());
    for point in points {
        if point.values.len() != keywords.len() {
            tracing::warn!(
                group = group.index,
                date = %point.date,
                values = point.values.len(),
                keywords = keywords.len(),
                "timeline entry width does not match keyword count"
            );
        }
        for (keyword, value) in keywords.iter().zip(&point.values) {
            rows.push(RawTrendRow {
                date: point.date,
                keyword: keyword.clone(),
                interest: *value,
                group: group.index,
            });
        }
    }
    rows
}
