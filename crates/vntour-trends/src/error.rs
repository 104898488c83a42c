use thiserror::Error;

/// Errors returned by the trends client, fetcher, and analyzer.
#[derive(Debug, Error)]
pub enum TrendsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429; Google Trends throttles aggressively per IP.
    #[error("rate limited by Google Trends (HTTP 429)")]
    RateLimited,

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The explore response carried no `TIMESERIES` widget.
    #[error("explore response has no TIMESERIES widget for [{0}]")]
    MissingWidget(String),

    /// The API answered but returned no data points.
    #[error("empty interest-over-time response for [{0}]")]
    EmptyResponse(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

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

    #[error("no raw trend files (dest_group_*.csv) found in {0}")]
    NoRawFiles(String),

    #[error(transparent)]
    Core(#[from] vntour_core::CoreError),
}
