//! HTTP client for the Google Trends web API.
//!
//! An interest-over-time query is two requests: `explore` returns a set of
//! widgets whose `TIMESERIES` entry carries a signed token and request body,
//! and `widgetdata/multiline` exchanges those for the timeline. Both responses
//! start with an anti-XSSI prefix (`)]}'`) that is stripped before parsing.

use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;

use crate::error::TrendsError;
use crate::types::{ExploreResponse, MultilineResponse, Timeframe, TimelinePoint};

const DEFAULT_BASE_URL: &str = "https://trends.google.com/trends/api/";

/// Client for the Google Trends explore and multiline endpoints.
///
/// Use [`TrendsClient::new`] for production or
/// [`TrendsClient::with_base_url`] to point at a mock server in tests.
pub struct TrendsClient {
    client: Client,
    base_url: Url,
    hl: String,
    tz: i32,
    geo: String,
}

impl TrendsClient {
    /// Creates a client pointed at the production Google Trends API.
    ///
    /// `hl` is the interface language (`vi`), `tz` the timezone offset in
    /// minutes passed through as the `tz` parameter, and `geo` the country
    /// filter (`VN`).
    ///
    /// # Errors
    ///
    /// Returns [`TrendsError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        hl: &str,
        tz: i32,
        geo: &str,
    ) -> Result<Self, TrendsError> {
        Self::with_base_url(timeout_secs, user_agent, hl, tz, geo, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// - [`TrendsError::Http`] if the `reqwest::Client` cannot be built.
    /// - [`TrendsError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        hl: &str,
        tz: i32,
        geo: &str,
        base_url: &str,
    ) -> Result<Self, TrendsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `Url::join` appends instead of replacing.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| TrendsError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            hl: hl.to_owned(),
            tz,
            geo: geo.to_owned(),
        })
    }

    /// Fetches interest over time for up to five keywords in one batch.
    ///
    /// Values in each returned [`TimelinePoint`] follow the order of `keywords`.
    ///
    /// # Errors
    ///
    /// - [`TrendsError::RateLimited`] on HTTP 429.
    /// - [`TrendsError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`TrendsError::MissingWidget`] if explore returns no `TIMESERIES` widget.
    /// - [`TrendsError::EmptyResponse`] if the timeline has no data points.
    /// - [`TrendsError::Deserialize`] if either body does not parse.
    pub async fn interest_over_time(
        &self,
        keywords: &[String],
        timeframe: &Timeframe,
    ) -> Result<Vec<TimelinePoint>, TrendsError> {
        let label = keywords.join(", ");

        let explore_url = self.explore_url(keywords, timeframe)?;
        let explore: ExploreResponse = self
            .request_json(Method::POST, explore_url, &format!("explore [{label}]"))
            .await?;

        let widget = explore
            .widgets
            .into_iter()
            .find(|w| w.id == "TIMESERIES")
            .ok_or_else(|| TrendsError::MissingWidget(label.clone()))?;
        let (Some(token), Some(request)) = (widget.token, widget.request) else {
            return Err(TrendsError::MissingWidget(label));
        };

        let multiline_url = self.multiline_url(&token, &request)?;
        let multiline: MultilineResponse = self
            .request_json(Method::GET, multiline_url, &format!("multiline [{label}]"))
            .await?;

        let points: Vec<TimelinePoint> = multiline
            .default
            .timeline_data
            .into_iter()
            .filter_map(|entry| {
                let Some(date) = parse_unix_date(&entry.time) else {
                    tracing::warn!(time = %entry.time, "skipping timeline entry with bad timestamp");
                    return None;
                };
                Some(TimelinePoint {
                    date,
                    values: entry.value,
                    is_partial: entry.is_partial,
                })
            })
            .collect();

        if points.is_empty() || points.iter().all(|p| p.values.is_empty()) {
            return Err(TrendsError::EmptyResponse(label));
        }
        Ok(points)
    }

    fn explore_url(&self, keywords: &[String], timeframe: &Timeframe) -> Result<Url, TrendsError> {
        let time = timeframe.as_query();
        let items: Vec<serde_json::Value> = keywords
            .iter()
            .map(|kw| serde_json::json!({ "keyword": kw, "time": time, "geo": self.geo }))
            .collect();
        let req = serde_json::json!({
            "comparisonItem": items,
            "category": 0,
            "property": "",
        });

        let mut url = self.endpoint("explore")?;
        url.query_pairs_mut()
            .append_pair("hl", &self.hl)
            .append_pair("tz", &self.tz.to_string())
            .append_pair("req", &req.to_string());
        Ok(url)
    }

    fn multiline_url(&self, token: &str, request: &serde_json::Value) -> Result<Url, TrendsError> {
        let mut url = self.endpoint("widgetdata/multiline")?;
        url.query_pairs_mut()
            .append_pair("req", &request.to_string())
            .append_pair("token", token)
            .append_pair("tz", &self.tz.to_string());
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, TrendsError> {
        self.base_url
            .join(path)
            .map_err(|e| TrendsError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        context: &str,
    ) -> Result<T, TrendsError> {
        let response = self.client.request(method, url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TrendsError::RateLimited);
        }
        if !status.is_success() {
            return Err(TrendsError::UnexpectedStatus {
                status: status.as_u16(),
                url: redact_query(&url),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(strip_xssi_prefix(&body)).map_err(|e| TrendsError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// Drops everything before the first `{` (the `)]}'` / `)]}',` guard).
fn strip_xssi_prefix(body: &str) -> &str {
    body.find('{').map_or(body, |idx| &body[idx..])
}

fn parse_unix_date(time: &str) -> Option<NaiveDate> {
    let secs = time.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Request URL without its query string, for error messages.
fn redact_query(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}
