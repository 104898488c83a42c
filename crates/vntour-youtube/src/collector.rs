//! Hashtag and per-province video collection with province tagging.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Serialize;
use vntour_core::{ProvinceMatch, ProvinceMatcher, UNMATCHED};

use crate::client::YoutubeClient;
use crate::error::YoutubeError;
use crate::types::{
    HashtagCountRow, ProvinceCountRow, ProvinceVideoRow, SearchQuery, VideoDetailRow, VideoRecord,
};

/// Pause between consecutive provinces.
pub const PROVINCE_DELAY: Duration = Duration::from_millis(100);

/// A video with the province its title and description mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedVideo {
    pub video: VideoRecord,
    pub province: Option<ProvinceMatch>,
}

#[derive(Debug, Clone)]
pub struct HashtagOptions {
    /// Hashtag with or without the leading `#`.
    pub hashtag: String,
    pub max_results: usize,
    pub page_delay: Duration,
}

/// Result of a single-hashtag run.
#[derive(Debug, Clone)]
pub struct HashtagReport {
    /// Hashtag without `#`.
    pub hashtag: String,
    pub videos: Vec<AnnotatedVideo>,
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProvinceOptions {
    pub max_results_per_province: usize,
    /// Only videos published within the last `days` days.
    pub days: i64,
    pub page_delay: Duration,
    pub province_delay: Duration,
    /// Also look up video details for the detail CSV.
    pub with_details: bool,
}

/// Result of a per-province run.
#[derive(Debug, Clone, Default)]
pub struct ProvinceReport {
    pub counts: Vec<ProvinceCountRow>,
    pub details: Vec<ProvinceVideoRow>,
    /// Provinces whose search failed; their count is zero.
    pub failed: Vec<String>,
}

/// Strips a leading `#` and surrounding whitespace.
#[must_use]
pub fn clean_hashtag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').trim().to_owned()
}

/// Tags each video with the province detected in its title and description.
#[must_use]
pub fn annotate(videos: Vec<VideoRecord>, matcher: &ProvinceMatcher) -> Vec<AnnotatedVideo> {
    videos
        .into_iter()
        .map(|video| {
            let province = matcher.detect_match(&video.match_text());
            AnnotatedVideo { video, province }
        })
        .collect()
}

/// Searches `#hashtag`, fetches details, and tags provinces.
///
/// # Errors
///
/// Returns the search error if the first results page fails, or
/// [`YoutubeError::QuotaExceeded`] if the quota runs out during the lookup.
pub async fn fetch_hashtag(
    client: &YoutubeClient,
    matcher: &ProvinceMatcher,
    options: &HashtagOptions,
) -> Result<HashtagReport, YoutubeError> {
    let hashtag = clean_hashtag(&options.hashtag);
    let query = SearchQuery::new(format!("#{hashtag}"), options.max_results);

    let ids = client.search_video_ids(&query, options.page_delay).await?;
    tracing::info!(hashtag = %hashtag, found = ids.len(), "hashtag search complete");

    let videos = if ids.is_empty() {
        Vec::new()
    } else {
        client.video_details(&ids, options.page_delay).await?
    };
    let videos = annotate(videos, matcher);
    let matched = videos.iter().filter(|v| v.province.is_some()).count();
    tracing::info!(hashtag = %hashtag, videos = videos.len(), matched, "videos annotated");

    Ok(HashtagReport {
        hashtag,
        videos,
        collected_at: Utc::now(),
    })
}

impl HashtagReport {
    /// One detail row per video.
    #[must_use]
    pub fn detail_rows(&self) -> Vec<VideoDetailRow> {
        let collected = self.collected_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.videos
            .iter()
            .map(|annotated| {
                let v = &annotated.video;
                VideoDetailRow {
                    platform: "youtube".to_owned(),
                    hashtag: self.hashtag.clone(),
                    video_id: v.video_id.clone(),
                    title: v.title.clone(),
                    description: v.description.clone(),
                    channel_title: v.channel_title.clone(),
                    published_at: v.published_at.clone(),
                    views: v.views,
                    likes: v.likes,
                    comments: v.comments,
                    province: annotated.province.as_ref().map(|p| p.province.clone()),
                    region: annotated.province.as_ref().map(|p| p.region.clone()),
                    url: v.url(),
                    collected_at_utc: collected.clone(),
                }
            })
            .collect()
    }

    /// Videos per detected province, `unmatched` included, largest first.
    #[must_use]
    pub fn count_rows(&self) -> Vec<HashtagCountRow> {
        let mut counts: HashMap<(String, String), usize> = HashMap::new();
        for annotated in &self.videos {
            let key = annotated.province.as_ref().map_or_else(
                || (UNMATCHED.to_owned(), String::new()),
                |p| (p.province.clone(), p.region.clone()),
            );
            *counts.entry(key).or_default() += 1;
        }

        let mut rows: Vec<HashtagCountRow> = counts
            .into_iter()
            .map(|((province, region), video_count)| HashtagCountRow {
                hashtag: self.hashtag.clone(),
                province,
                region,
                video_count,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.video_count
                .cmp(&a.video_count)
                .then_with(|| a.province.cmp(&b.province))
        });
        rows
    }
}

/// Runs one time-windowed, Vietnam-biased search per province.
///
/// A province whose search fails is logged, counted as zero, and listed in
/// [`ProvinceReport::failed`]; the run continues with the next province.
///
/// # Errors
///
/// Returns [`YoutubeError::InvalidWindow`] if `now - days` is not a
/// representable date. No request is made in that case.
pub async fn fetch_provinces(
    client: &YoutubeClient,
    matcher: &ProvinceMatcher,
    options: &ProvinceOptions,
    now: DateTime<Utc>,
) -> Result<ProvinceReport, YoutubeError> {
    let after = published_after(now, options.days)?;
    let mut report = ProvinceReport::default();
    let total = matcher.provinces().len();

    for (n, province) in matcher.provinces().iter().enumerate() {
        if n > 0 && !options.province_delay.is_zero() {
            tokio::time::sleep(options.province_delay).await;
        }
        let hashtag_query = format!("#{}", province.hashtag());
        let query = SearchQuery::new(province.name.clone(), options.max_results_per_province)
            .published_after(after)
            .vietnam_bias();

        let ids = match client.search_video_ids(&query, options.page_delay).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(province = %province.name, error = %e, "province search failed; counting zero");
                report.failed.push(province.name.clone());
                Vec::new()
            }
        };
        tracing::info!(
            province = %province.name,
            progress = %format!("{}/{total}", n + 1),
            found = ids.len(),
            "province searched"
        );

        report.counts.push(ProvinceCountRow {
            province: province.name.clone(),
            region: province.region.clone(),
            hashtag_query: hashtag_query.clone(),
            video_count: ids.len(),
        });

        if !options.with_details || ids.is_empty() {
            continue;
        }
        let videos = match client.video_details(&ids, options.page_delay).await {
            Ok(videos) => videos,
            Err(e) => {
                tracing::error!(province = %province.name, error = %e, "video lookup failed");
                continue;
            }
        };
        for annotated in annotate(videos, matcher) {
            let v = annotated.video;
            report.details.push(ProvinceVideoRow {
                province: province.name.clone(),
                region: province.region.clone(),
                hashtag_query: hashtag_query.clone(),
                url: v.url(),
                video_id: v.video_id,
                title: v.title,
                channel_title: v.channel_title,
                published_at: v.published_at,
                views: v.views,
                likes: v.likes,
                comments: v.comments,
                detected_province: annotated
                    .province
                    .as_ref()
                    .map_or_else(|| UNMATCHED.to_owned(), |p| p.province.clone()),
                detected_region: annotated.province.map(|p| p.region),
            });
        }
    }

    Ok(report)
}

/// Start of the `days`-long window ending at `now`; negative `days` is 0.
///
/// # Errors
///
/// Returns [`YoutubeError::InvalidWindow`] when the window leaves chrono's
/// date range.
pub fn published_after(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, YoutubeError> {
    TimeDelta::try_days(days.max(0))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(YoutubeError::InvalidWindow(days))
}

/// Writes `rows` with a header derived from the row type.
///
/// # Errors
///
/// Returns [`YoutubeError::Csv`] / [`YoutubeError::Io`] on write failure.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), YoutubeError> {
    let display = path.display().to_string();
    let mut writer = csv::Writer::from_path(path).map_err(|e| YoutubeError::Csv {
        path: display.clone(),
        source: e,
    })?;
    for row in rows {
        writer.serialize(row).map_err(|e| YoutubeError::Csv {
            path: display.clone(),
            source: e,
        })?;
    }
    writer
        .flush()
        .map_err(|e| YoutubeError::Io { path: display, source: e })
}
