use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default timeframe when no explicit range is given.
pub const DEFAULT_TIMEFRAME: &str = "today 12-m";

/// Time window for an interest-over-time query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timeframe {
    /// A Google Trends preset such as `today 12-m` or `today 5-y`.
    Preset(String),
    /// Explicit inclusive date range.
    Range { start: NaiveDate, end: NaiveDate },
}

impl Timeframe {
    /// Builds an explicit range, rejecting `start > end`.
    ///
    /// # Errors
    ///
    /// Returns a message describing the inverted range.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if start > end {
            return Err(format!("start date {start} is after end date {end}"));
        }
        Ok(Self::Range { start, end })
    }

    /// The `time` string sent to the API.
    #[must_use]
    pub fn as_query(&self) -> String {
        match self {
            Self::Preset(p) => p.clone(),
            Self::Range { start, end } => {
                format!("{} {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
            }
        }
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::Preset(DEFAULT_TIMEFRAME.to_string())
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_query())
    }
}

/// One batch of keywords submitted together to the trends API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendGroup {
    /// 1-based position in the full group list.
    pub index: usize,
    pub destinations: Vec<String>,
    pub anchor: Option<String>,
}

impl TrendGroup {
    /// Query order: the anchor (if any) followed by the destinations.
    #[must_use]
    pub fn keywords(&self) -> Vec<String> {
        self.anchor
            .iter()
            .cloned()
            .chain(self.destinations.iter().cloned())
            .collect()
    }
}

/// One interest score as returned for one keyword in one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrendRow {
    pub date: NaiveDate,
    pub keyword: String,
    /// Batch-relative interest, 0-100.
    pub interest: u32,
    pub group: usize,
}

/// A raw row after anchor rescaling (or pass-through).
///
/// `interest` is `None` when the group's anchor was zero or missing on that date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTrendRow {
    pub date: NaiveDate,
    pub keyword: String,
    pub group: usize,
    pub interest: Option<f64>,
}

/// One time bucket of an interest-over-time response, values in query order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub values: Vec<u32>,
    pub is_partial: bool,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ExploreResponse {
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Widget {
    pub id: String,
    pub token: Option<String>,
    pub request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MultilineResponse {
    pub default: MultilineData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MultilineData {
    #[serde(rename = "timelineData", default)]
    pub timeline_data: Vec<TimelineEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimelineEntry {
    /// Unix seconds as a string.
    pub time: String,
    #[serde(default)]
    pub value: Vec<u32>,
    #[serde(rename = "isPartial", default)]
    pub is_partial: bool,
}
