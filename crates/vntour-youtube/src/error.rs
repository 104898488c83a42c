use thiserror::Error;

/// Errors returned by the YouTube Data API client and collectors.
#[derive(Debug, Error)]
pub enum YoutubeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by the YouTube Data API (HTTP 429)")]
    RateLimited,

    /// Daily quota exhausted (HTTP 403 with reason `quotaExceeded`).
    /// Not retriable: the quota resets at midnight Pacific time.
    #[error("YouTube Data API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("unexpected HTTP status {status} from {url}: {message}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("publish window of {0} days is outside the supported date range")]
    InvalidWindow(i64),

    #[error("YouTube API key is empty; set YOUTUBE_API_KEY or pass --api-key")]
    MissingApiKey,

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
