//! Anchor normalization and monthly aggregation of raw trends files.
//!
//! Each raw group file holds batch-relative scores: 100 is the busiest term of
//! that request, not of the whole keyword list. Dividing every destination by
//! the anchor's score on the same date (and group) puts all groups on one
//! scale, expressed in multiples of `reference`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;
use vntour_core::text::{collapse_whitespace, trim_trailing_punctuation};
use vntour_core::{fold_accents, KeywordMappingEntry};

use crate::error::TrendsError;
use crate::raw::{list_group_files, read_group_csv};
use crate::types::{NormalizedTrendRow, RawTrendRow};

/// Reference constant the anchor is scaled to.
pub const DEFAULT_REFERENCE: f64 = 100.0;

/// Destinations above this peak/avg ratio are listed as strongly seasonal.
pub const HIGH_SEASONALITY: f64 = 2.0;

const SCALE_RAW: &str = "raw";
const DUPLICATE_KEY_CHARS: usize = 60;

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthesized regex"));

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub raw_dir: PathBuf,
    /// Anchor keyword; its rows are never reported as destinations.
    pub anchor: Option<String>,
    /// Rescale by the anchor instead of passing raw scores through.
    pub normalize: bool,
    pub reference: f64,
}

/// Mean interest of one destination in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrendRow {
    pub destination: String,
    /// `YYYY-MM`.
    pub year_month: String,
    /// Empty when no date in the month had a defined value.
    pub interest: Option<f64>,
    pub observations: usize,
    pub scale: String,
}

/// Summary statistics of one destination over all its months.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationStats {
    pub destination: String,
    pub avg_interest: f64,
    pub peak_interest: f64,
    pub peak_month: String,
    pub min_interest: f64,
    pub min_month: String,
    /// `peak / avg`, or 0 when the average is 0.
    pub seasonality: f64,
    /// Least-squares slope of monthly means per month.
    pub trend_slope: f64,
    pub months: usize,
    pub scale: String,
}

/// Everything derived from one raw directory.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// `raw` or `anchor:<name>`.
    pub scale: String,
    pub files_loaded: usize,
    pub rows: Vec<NormalizedTrendRow>,
    pub monthly: Vec<MonthlyTrendRow>,
    /// Sorted by `avg_interest`, descending.
    pub stats: Vec<DestinationStats>,
}

/// Keywords that collapse to the same query after sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKeyword {
    pub keyword: String,
    pub originals: Vec<String>,
}

#[derive(Serialize)]
struct ScaledRow<'a> {
    date: NaiveDate,
    keyword: &'a str,
    group: usize,
    interest: Option<f64>,
    scale: &'a str,
}

/// Loads every raw group file in `options.raw_dir` and derives normalized
/// rows, monthly means, and per-destination statistics.
///
/// Files that fail to parse are logged and skipped.
///
/// # Errors
///
/// - [`TrendsError::Io`] if the directory cannot be listed.
/// - [`TrendsError::NoRawFiles`] if it holds no `dest_group_*.csv` files.
pub fn analyze(options: &AnalyzeOptions) -> Result<Analysis, TrendsError> {
    let files = list_group_files(&options.raw_dir)?;
    if files.is_empty() {
        return Err(TrendsError::NoRawFiles(options.raw_dir.display().to_string()));
    }

    let mut raw = Vec::new();
    let mut files_loaded = 0usize;
    for path in &files {
        match read_group_csv(path) {
            Ok(rows) => {
                files_loaded += 1;
                raw.extend(rows);
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable raw file"),
        }
    }
    tracing::info!(files = files_loaded, rows = raw.len(), "loaded raw trends");

    let anchor = options.anchor.as_deref();
    let normalize = match (options.normalize, anchor) {
        (true, Some(_)) => true,
        (true, None) => {
            tracing::warn!("normalization requested without an anchor; keeping raw scores");
            false
        }
        (false, _) => false,
    };
    let scale = match anchor {
        Some(name) if normalize => format!("anchor:{name}"),
        _ => SCALE_RAW.to_owned(),
    };

    let rows = if normalize {
        normalize_rows(&raw, anchor.unwrap_or_default(), options.reference)
    } else {
        passthrough_rows(&raw, anchor)
    };
    let monthly = monthly_means(&rows, &scale);
    let stats = destination_stats(&monthly, &scale);

    Ok(Analysis {
        scale,
        files_loaded,
        rows,
        monthly,
        stats,
    })
}

/// `value / anchor * reference`, or `None` when the anchor is zero or absent.
#[must_use]
pub fn rescale(value: f64, anchor: Option<f64>, reference: f64) -> Option<f64> {
    match anchor {
        Some(a) if a > 0.0 => Some(value / a * reference),
        _ => None,
    }
}

fn is_anchor(keyword: &str, anchor_key: Option<&str>) -> bool {
    anchor_key.is_some_and(|key| fold_accents(keyword) == key)
}

/// Rescales every non-anchor row by the anchor of the same group and date.
#[must_use]
pub fn normalize_rows(raw: &[RawTrendRow], anchor: &str, reference: f64) -> Vec<NormalizedTrendRow> {
    let anchor_key = fold_accents(anchor);
    let anchor_values: HashMap<(usize, NaiveDate), f64> = raw
        .iter()
        .filter(|r| is_anchor(&r.keyword, Some(&anchor_key)))
        .map(|r| ((r.group, r.date), f64::from(r.interest)))
        .collect();

    let anchored: HashSet<usize> = anchor_values.keys().map(|(group, _)| *group).collect();
    let mut groups_without_anchor: Vec<usize> = raw
        .iter()
        .map(|r| r.group)
        .filter(|g| !anchored.contains(g))
        .collect();
    groups_without_anchor.sort_unstable();
    groups_without_anchor.dedup();
    if !groups_without_anchor.is_empty() {
        tracing::warn!(
            anchor,
            groups = ?groups_without_anchor,
            "anchor missing from groups; their values are undefined"
        );
    }

    let mut undefined = 0usize;
    let rows: Vec<NormalizedTrendRow> = raw
        .iter()
        .filter(|r| !is_anchor(&r.keyword, Some(&anchor_key)))
        .map(|r| {
            let interest = rescale(
                f64::from(r.interest),
                anchor_values.get(&(r.group, r.date)).copied(),
                reference,
            );
            if interest.is_none() {
                undefined += 1;
            }
            NormalizedTrendRow {
                date: r.date,
                keyword: r.keyword.clone(),
                group: r.group,
                interest,
            }
        })
        .collect();

    if undefined > 0 {
        tracing::info!(undefined, "rows left undefined by a zero or missing anchor");
    }
    rows
}

fn passthrough_rows(raw: &[RawTrendRow], anchor: Option<&str>) -> Vec<NormalizedTrendRow> {
    let anchor_key = anchor.map(fold_accents);
    raw.iter()
        .filter(|r| !is_anchor(&r.keyword, anchor_key.as_deref()))
        .map(|r| NormalizedTrendRow {
            date: r.date,
            keyword: r.keyword.clone(),
            group: r.group,
            interest: Some(f64::from(r.interest)),
        })
        .collect()
}

/// Mean of defined values per `(destination, YYYY-MM)`, ordered by
/// destination then month.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn monthly_means(rows: &[NormalizedTrendRow], scale: &str) -> Vec<MonthlyTrendRow> {
    let mut buckets: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    for row in rows {
        let key = (row.keyword.clone(), row.date.format("%Y-%m").to_string());
        let bucket = buckets.entry(key).or_insert((0.0, 0));
        if let Some(value) = row.interest {
            bucket.0 += value;
            bucket.1 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|((destination, year_month), (sum, count))| MonthlyTrendRow {
            destination,
            year_month,
            interest: (count > 0).then(|| sum / count as f64),
            observations: count,
            scale: scale.to_owned(),
        })
        .collect()
}

/// Per-destination statistics over defined monthly means, sorted by average
/// interest descending. Destinations with no defined month are omitted.
#[must_use]
pub fn destination_stats(monthly: &[MonthlyTrendRow], scale: &str) -> Vec<DestinationStats> {
    let mut by_destination: BTreeMap<&str, Vec<(&str, f64)>> = BTreeMap::new();
    for row in monthly {
        let entry = by_destination.entry(row.destination.as_str()).or_default();
        if let Some(value) = row.interest {
            entry.push((row.year_month.as_str(), value));
        }
    }

    let mut stats: Vec<DestinationStats> = by_destination
        .into_iter()
        .filter_map(|(destination, months)| {
            if months.is_empty() {
                tracing::warn!(destination, "no defined monthly values; omitted from summary");
                return None;
            }
            Some(stats_for(destination, &months, scale))
        })
        .collect();

    stats.sort_by(|a, b| {
        b.avg_interest
            .total_cmp(&a.avg_interest)
            .then_with(|| a.destination.cmp(&b.destination))
    });
    stats
}

#[allow(clippy::cast_precision_loss)]
fn stats_for(destination: &str, months: &[(&str, f64)], scale: &str) -> DestinationStats {
    let avg = months.iter().map(|(_, v)| v).sum::<f64>() / months.len() as f64;

    // First occurrence wins on ties, matching chronological order.
    let (mut peak_month, mut peak) = months[0];
    let (mut min_month, mut min) = months[0];
    for &(month, value) in &months[1..] {
        if value > peak {
            peak = value;
            peak_month = month;
        }
        if value < min {
            min = value;
            min_month = month;
        }
    }

    let seasonality = if avg > 0.0 { peak / avg } else { 0.0 };
    let points: Vec<(f64, f64)> = months
        .iter()
        .filter_map(|(month, value)| month_ordinal(month).map(|x| (x, *value)))
        .collect();

    DestinationStats {
        destination: destination.to_owned(),
        avg_interest: avg,
        peak_interest: peak,
        peak_month: peak_month.to_owned(),
        min_interest: min,
        min_month: min_month.to_owned(),
        seasonality,
        trend_slope: least_squares_slope(&points),
        months: months.len(),
        scale: scale.to_owned(),
    }
}

/// `YYYY-MM` as a running month count, so consecutive months differ by 1.
fn month_ordinal(year_month: &str) -> Option<f64> {
    let date = NaiveDate::parse_from_str(&format!("{year_month}-01"), "%Y-%m-%d").ok()?;
    Some(f64::from(date.year()) * 12.0 + f64::from(date.month0()))
}

/// Slope of the ordinary least-squares line through `points`; 0 for fewer
/// than two distinct x values.
#[allow(clippy::cast_precision_loss)]
fn least_squares_slope(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), (x, y)| {
        let dx = x - mean_x;
        (num + dx * (y - mean_y), den + dx * dx)
    });
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

impl Analysis {
    /// Writes the row-level normalized output, with undefined values empty.
    ///
    /// # Errors
    ///
    /// Returns [`TrendsError::Csv`] / [`TrendsError::Io`] on write failure.
    pub fn write_rows(&self, path: &Path) -> Result<(), TrendsError> {
        write_csv(
            path,
            self.rows.iter().map(|r| ScaledRow {
                date: r.date,
                keyword: &r.keyword,
                group: r.group,
                interest: r.interest,
                scale: &self.scale,
            }),
        )
    }

    /// Writes `destination,year_month,interest,observations,scale`.
    ///
    /// # Errors
    ///
    /// Returns [`TrendsError::Csv`] / [`TrendsError::Io`] on write failure.
    pub fn write_monthly(&self, path: &Path) -> Result<(), TrendsError> {
        write_csv(path, self.monthly.iter())
    }

    /// Writes the per-destination summary in ranking order.
    ///
    /// # Errors
    ///
    /// Returns [`TrendsError::Csv`] / [`TrendsError::Io`] on write failure.
    pub fn write_summary(&self, path: &Path) -> Result<(), TrendsError> {
        write_csv(path, self.stats.iter())
    }

    /// Destinations whose seasonality exceeds [`HIGH_SEASONALITY`], in
    /// ranking order.
    pub fn highly_seasonal(&self) -> impl Iterator<Item = &DestinationStats> + '_ {
        self.stats
            .iter()
            .filter(|s| s.seasonality > HIGH_SEASONALITY)
    }
}

fn write_csv<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<(), TrendsError> {
    let display = path.display().to_string();
    let mut writer = csv::Writer::from_path(path).map_err(|e| TrendsError::Csv {
        path: display.clone(),
        source: e,
    })?;
    for row in rows {
        writer.serialize(row).map_err(|e| TrendsError::Csv {
            path: display.clone(),
            source: e,
        })?;
    }
    writer
        .flush()
        .map_err(|e| TrendsError::Io { path: display, source: e })
}

/// Renders the top-`top` ranking table followed by the high-seasonality list.
#[must_use]
pub fn render_summary(analysis: &Analysis, top: usize) -> String {
    let rule = "=".repeat(95);
    let thin = "-".repeat(95);

    let mut lines = vec![
        rule.clone(),
        format!("TOP {top} DESTINATIONS BY SEARCH INTEREST (scale: {})", analysis.scale),
        rule.clone(),
        format!(
            "{:<4} {:<50} {:>8} {:>8} {:<12} {:>8}",
            "#", "Destination", "Avg", "Peak", "Peak Month", "Season"
        ),
        thin.clone(),
    ];
    lines.extend(analysis.stats.iter().take(top).enumerate().map(|(rank, stat)| {
        format!(
            "{:<4} {:<50} {:>8.2} {:>8.2} {:<12} {:>8.3}",
            rank + 1,
            truncate_chars(&stat.destination, 48),
            stat.avg_interest,
            stat.peak_interest,
            stat.peak_month,
            stat.seasonality,
        )
    }));
    lines.push(rule);
    lines.push(String::new());
    lines.push(format!("HIGHLY SEASONAL DESTINATIONS (seasonality > {HIGH_SEASONALITY})"));
    lines.push(thin);

    let seasonal: Vec<String> = analysis
        .highly_seasonal()
        .take(10)
        .map(|stat| {
            format!(
                "  {:<45} season {:.2} (peak {}, min {})",
                truncate_chars(&stat.destination, 45),
                stat.seasonality,
                stat.peak_month,
                stat.min_month,
            )
        })
        .collect();
    if seasonal.is_empty() {
        lines.push("  (none)".to_owned());
    } else {
        lines.extend(seasonal);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// The query string a mapping name turns into at fetch time, for duplicate
/// detection: parenthesized segments and trailing punctuation dropped,
/// whitespace collapsed, at most 60 characters.
fn duplicate_key(name: &str) -> String {
    let without_parens = PARENTHESIZED.replace_all(name.trim(), "");
    let collapsed = collapse_whitespace(trim_trailing_punctuation(without_parens.trim()));
    truncate_chars(&collapsed, DUPLICATE_KEY_CHARS).trim().to_owned()
}

/// Groups mapping entries whose normalized names collapse to the same
/// keyword; only groups with more than one entry are returned, largest first.
#[must_use]
pub fn find_duplicate_keywords(entries: &[KeywordMappingEntry]) -> Vec<DuplicateKeyword> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in entries {
        let name = entry.normalized_name.trim();
        if name.chars().count() <= 2 {
            continue;
        }
        groups
            .entry(duplicate_key(name))
            .or_default()
            .push(entry.original_name.clone());
    }

    let mut duplicates: Vec<DuplicateKeyword> = groups
        .into_iter()
        .filter(|(_, originals)| originals.len() > 1)
        .map(|(keyword, originals)| DuplicateKeyword { keyword, originals })
        .collect();
    duplicates.sort_by(|a, b| b.originals.len().cmp(&a.originals.len()));

    if !duplicates.is_empty() {
        let lost: usize = duplicates.iter().map(|d| d.originals.len() - 1).sum();
        tracing::warn!(
            groups = duplicates.len(),
            destinations_merged = lost,
            "mapping has keywords that collapse to the same query"
        );
        for dup in duplicates.iter().take(20) {
            tracing::warn!(keyword = %dup.keyword, sources = ?dup.originals, "duplicate keyword");
        }
    }
    duplicates
}

#[cfg(test)]
#[path = "analyzer_test.rs"]
mod tests;
