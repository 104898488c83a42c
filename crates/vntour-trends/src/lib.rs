//! Google Trends collection for tourism keywords.
//!
//! Keywords are batched into groups that share one anchor term, fetched one
//! group per request, and written as raw per-group CSVs. The analyzer rescales
//! each group by its anchor so scores from independent requests become
//! comparable, then aggregates monthly trends and summary statistics.

pub mod analyzer;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod grouping;
pub mod raw;
pub mod types;

mod retry;

pub use analyzer::{
    analyze, find_duplicate_keywords, render_summary, rescale, Analysis, AnalyzeOptions,
    DestinationStats, DuplicateKeyword, MonthlyTrendRow,
};
pub use client::TrendsClient;
pub use error::TrendsError;
pub use fetcher::{fetch_groups, points_to_rows, FetchOptions, FetchSummary};
pub use grouping::{build_groups, prepare_keywords, select_groups};
pub use types::{NormalizedTrendRow, RawTrendRow, Timeframe, TimelinePoint, TrendGroup};
