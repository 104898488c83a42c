//! YouTube Data API collection for Vietnamese tourism hashtags.
//!
//! Two collectors share one client: a single-hashtag run that tags each video
//! with the province its text mentions, and a per-province run that counts
//! recent videos for every province in the reference table.

pub mod client;
pub mod collector;
pub mod error;
pub mod types;

mod retry;

pub use client::YoutubeClient;
pub use collector::{
    annotate, clean_hashtag, fetch_hashtag, fetch_provinces, published_after, write_rows,
    AnnotatedVideo, HashtagOptions, HashtagReport, ProvinceOptions, ProvinceReport,
    PROVINCE_DELAY,
};
pub use error::YoutubeError;
pub use types::{
    HashtagCountRow, ProvinceCountRow, ProvinceVideoRow, SearchPage, SearchQuery, VideoDetailRow,
    VideoRecord,
};
