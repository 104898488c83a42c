//! Shared building blocks for the vntour collectors: environment
//! configuration, Vietnamese text folding, the tourism keyword normalizer, the
//! province reference table with its alias matcher, and the retry loop both API
//! clients run their requests through.

pub mod app_config;
pub mod config;
pub mod keywords;
pub mod provinces;
pub mod retry;
pub mod text;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use keywords::{
    normalize_keywords, normalize_name, read_keyword_column, read_mapping, write_mapping,
    KeywordMappingEntry, NormalizeReport,
};
pub use provinces::{ProvinceMatch, ProvinceMatcher, ProvinceRecord, UNMATCHED};
pub use text::{fold_accents, sanitize_keyword};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Errors raised while reading or writing the shared CSV inputs.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: String, column: String },

    #[error("invalid province table {path}: {reason}")]
    InvalidProvinceTable { path: String, reason: String },
}
