use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum `maxResults` for `search` and ids per `videos` call.
pub const PAGE_SIZE: usize = 50;

/// Parameters of one paged search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    /// Upper bound on ids collected across pages.
    pub max_results: usize,
    pub published_after: Option<DateTime<Utc>>,
    pub region_code: Option<String>,
    pub relevance_language: Option<String>,
}

impl SearchQuery {
    /// A newest-first search for `q` with no window or regional bias.
    #[must_use]
    pub fn new(q: impl Into<String>, max_results: usize) -> Self {
        Self {
            q: q.into(),
            max_results,
            published_after: None,
            region_code: None,
            relevance_language: None,
        }
    }

    #[must_use]
    pub fn published_after(mut self, after: DateTime<Utc>) -> Self {
        self.published_after = Some(after);
        self
    }

    /// Biases results toward Vietnam and Vietnamese-language videos.
    #[must_use]
    pub fn vietnam_bias(mut self) -> Self {
        self.region_code = Some("VN".to_owned());
        self.relevance_language = Some("vi".to_owned());
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Snippet and statistics of one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    /// RFC 3339 timestamp as returned by the API.
    pub published_at: String,
    pub views: u64,
    /// `None` when the channel hides the counter.
    pub likes: Option<u64>,
    pub comments: Option<u64>,
}

impl VideoRecord {
    #[must_use]
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }

    /// Text province detection runs over.
    #[must_use]
    pub fn match_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// Detail CSV row of the single-hashtag collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoDetailRow {
    pub platform: String,
    pub hashtag: String,
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: String,
    pub views: u64,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub province: Option<String>,
    pub region: Option<String>,
    pub url: String,
    pub collected_at_utc: String,
}

/// Count CSV row of the single-hashtag collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashtagCountRow {
    pub hashtag: String,
    pub province: String,
    pub region: String,
    pub video_count: usize,
}

/// Count CSV row of the per-province collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvinceCountRow {
    pub province: String,
    pub region: String,
    pub hashtag_query: String,
    pub video_count: usize,
}

/// Detail CSV row of the per-province collector: the queried province plus
/// whatever province the video text itself mentions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvinceVideoRow {
    pub province: String,
    pub region: String,
    pub hashtag_query: String,
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub published_at: String,
    pub views: u64,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub detected_province: String,
    pub detected_region: Option<String>,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    #[serde(default)]
    pub id: SearchItemId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchItemId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideosResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct VideoSnippet {
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: String,
}

/// Counters arrive as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

impl From<VideoItem> for VideoRecord {
    fn from(item: VideoItem) -> Self {
        let parse = |v: Option<String>| v.and_then(|s| s.trim().parse::<u64>().ok());
        Self {
            video_id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            channel_title: item.snippet.channel_title,
            published_at: item.snippet.published_at,
            views: parse(item.statistics.view_count).unwrap_or(0),
            likes: parse(item.statistics.like_count),
            comments: parse(item.statistics.comment_count),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
    pub errors: Vec<ApiErrorReason>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiErrorReason {
    pub reason: String,
}
