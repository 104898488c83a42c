//! HTTP client for the YouTube Data API v3 `search` and `videos` endpoints.

use std::time::Duration;

use chrono::SecondsFormat;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::YoutubeError;
use crate::retry::retry_with_backoff;
use crate::types::{
    ApiErrorBody, SearchPage, SearchQuery, SearchResponse, VideoRecord, VideosResponse, PAGE_SIZE,
};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Quota-related `reason` values the API reports with HTTP 403.
const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"];

/// Client for the YouTube Data API.
///
/// The API key travels as the `key` query parameter and is stripped from
/// every URL that ends up in an error message.
pub struct YoutubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl YoutubeClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// - [`YoutubeError::MissingApiKey`] if `api_key` is blank.
    /// - [`YoutubeError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, YoutubeError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// - [`YoutubeError::MissingApiKey`] if `api_key` is blank.
    /// - [`YoutubeError::Http`] if the `reqwest::Client` cannot be built.
    /// - [`YoutubeError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, YoutubeError> {
        if api_key.trim().is_empty() {
            return Err(YoutubeError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| YoutubeError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_owned(),
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the transient-error retry policy.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches one page of video ids for `query`.
    ///
    /// # Errors
    ///
    /// - [`YoutubeError::QuotaExceeded`] when the daily quota is gone.
    /// - [`YoutubeError::RateLimited`] / [`YoutubeError::UnexpectedStatus`] on
    ///   other failures, after transient retries.
    /// - [`YoutubeError::Deserialize`] if the body does not parse.
    pub async fn search_page(
        &self,
        query: &SearchQuery,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<SearchPage, YoutubeError> {
        let mut url = self.endpoint("search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("part", "id")
                .append_pair("type", "video")
                .append_pair("order", "date")
                .append_pair("q", &query.q)
                .append_pair("maxResults", &page_size.clamp(1, PAGE_SIZE).to_string());
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
            if let Some(after) = query.published_after {
                pairs.append_pair(
                    "publishedAfter",
                    &after.to_rfc3339_opts(SecondsFormat::Secs, true),
                );
            }
            if let Some(region) = &query.region_code {
                pairs.append_pair("regionCode", region);
            }
            if let Some(lang) = &query.relevance_language {
                pairs.append_pair("relevanceLanguage", lang);
            }
            pairs.append_pair("key", &self.api_key);
        }

        let context = format!("search q={}", query.q);
        let resp: SearchResponse = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.get_json(url.clone(), &context)
        })
        .await?;

        Ok(SearchPage {
            video_ids: resp
                .items
                .into_iter()
                .filter_map(|item| item.id.video_id)
                .collect(),
            next_page_token: resp.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    /// Pages through search results until `query.max_results` ids are
    /// collected, results run out, or a page comes back empty.
    ///
    /// A failure after the first page ends paging and keeps the ids already
    /// collected.
    ///
    /// # Errors
    ///
    /// Returns the first page's error if that page fails.
    pub async fn search_video_ids(
        &self,
        query: &SearchQuery,
        page_delay: Duration,
    ) -> Result<Vec<String>, YoutubeError> {
        let mut ids: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;

        while ids.len() < query.max_results {
            let remaining = query.max_results - ids.len();
            let page = match self
                .search_page(query, remaining.min(PAGE_SIZE), page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) if ids.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(q = %query.q, collected = ids.len(), error = %e, "search paging stopped early");
                    break;
                }
            };
            if page.video_ids.is_empty() {
                break;
            }
            ids.extend(page.video_ids);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
            if !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }
        }

        ids.truncate(query.max_results);
        tracing::debug!(q = %query.q, found = ids.len(), "search complete");
        Ok(ids)
    }

    /// Looks up snippet and statistics for `ids` in chunks of 50.
    ///
    /// A failed chunk is logged and skipped, except that quota exhaustion
    /// aborts the lookup.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::QuotaExceeded`] if the quota runs out mid-lookup.
    pub async fn video_details(
        &self,
        ids: &[String],
        page_delay: Duration,
    ) -> Result<Vec<VideoRecord>, YoutubeError> {
        let mut videos = Vec::with_capacity(ids.len());
        for (n, chunk) in ids.chunks(PAGE_SIZE).enumerate() {
            if n > 0 && !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }
            let mut url = self.endpoint("videos")?;
            url.query_pairs_mut()
                .append_pair("part", "snippet,statistics")
                .append_pair("id", &chunk.join(","))
                .append_pair("key", &self.api_key);

            let context = format!("videos chunk {}", n + 1);
            let result: Result<VideosResponse, YoutubeError> =
                retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                    self.get_json(url.clone(), &context)
                })
                .await;

            match result {
                Ok(resp) => videos.extend(resp.items.into_iter().map(VideoRecord::from)),
                Err(e @ YoutubeError::QuotaExceeded(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(chunk = n + 1, ids = chunk.len(), error = %e, "video lookup failed; skipping chunk");
                }
            }
        }
        Ok(videos)
    }

    fn endpoint(&self, path: &str) -> Result<Url, YoutubeError> {
        self.base_url
            .join(path)
            .map_err(|e| YoutubeError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, YoutubeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(YoutubeError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
            let quota = detail
                .error
                .errors
                .iter()
                .any(|e| QUOTA_REASONS.contains(&e.reason.as_str()));
            if status == reqwest::StatusCode::FORBIDDEN && quota {
                return Err(YoutubeError::QuotaExceeded(detail.error.message));
            }
            return Err(YoutubeError::UnexpectedStatus {
                status: status.as_u16(),
                url: redact_key(&url),
                message: detail.error.message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| YoutubeError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// URL with the `key` parameter removed, for logs and errors.
fn redact_key(url: &Url) -> String {
    let mut clean = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "key")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(kept);
    }
    clean.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_is_rejected() {
        let err = YoutubeClient::new("  ", 30, "vntour-test/0.1").err();
        assert!(matches!(err, Some(YoutubeError::MissingApiKey)));
    }

    #[test]
    fn redact_key_drops_only_the_key() {
        let url = Url::parse("https://example.test/search?q=%23dalat&key=SECRET&part=id").unwrap();
        let redacted = redact_key(&url);
        assert!(!redacted.contains("SECRET"));
        assert!(redacted.contains("q=%23dalat"));
        assert!(redacted.contains("part=id"));
    }

    #[test]
    fn redact_key_clears_query_with_only_a_key() {
        let url = Url::parse("https://example.test/videos?key=SECRET").unwrap();
        assert_eq!(redact_key(&url), "https://example.test/videos");
    }
}
