use std::env::VarError;
use std::str::FromStr;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let log_level = or_default("VNTOUR_LOG_LEVEL", "info");
    let youtube_api_key = lookup("YOUTUBE_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let user_agent = or_default("VNTOUR_USER_AGENT", "vntour/0.1 (tourism-signals)");
    let trends_hl = or_default("VNTOUR_TRENDS_HL", "vi");
    let trends_geo = or_default("VNTOUR_TRENDS_GEO", "VN");

    let http_timeout_secs = parse_var(&lookup, "VNTOUR_HTTP_TIMEOUT_SECS", "30")?;
    let trends_group_size: usize = parse_var(&lookup, "VNTOUR_TRENDS_GROUP_SIZE", "4")?;
    if trends_group_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "VNTOUR_TRENDS_GROUP_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let trends_group_delay_ms = parse_var(&lookup, "VNTOUR_TRENDS_GROUP_DELAY_MS", "4000")?;
    let trends_retry_delay_ms = parse_var(&lookup, "VNTOUR_TRENDS_RETRY_DELAY_MS", "6000")?;
    let trends_max_retries = parse_var(&lookup, "VNTOUR_TRENDS_MAX_RETRIES", "2")?;
    let trends_tz = parse_var(&lookup, "VNTOUR_TRENDS_TZ", "420")?;
    let trends_reference: f64 = parse_var(&lookup, "VNTOUR_TRENDS_REFERENCE", "100")?;
    if !(trends_reference.is_finite() && trends_reference > 0.0) {
        return Err(ConfigError::InvalidEnvVar {
            var: "VNTOUR_TRENDS_REFERENCE".to_string(),
            reason: "must be a positive number".to_string(),
        });
    }
    let youtube_page_delay_ms = parse_var(&lookup, "VNTOUR_YOUTUBE_PAGE_DELAY_MS", "200")?;
    let monitor_expected_total = parse_var(&lookup, "VNTOUR_MONITOR_EXPECTED_TOTAL", "510")?;
    let monitor_poll_secs = parse_var(&lookup, "VNTOUR_MONITOR_POLL_SECS", "5")?;

    Ok(AppConfig {
        log_level,
        youtube_api_key,
        http_timeout_secs,
        user_agent,
        trends_group_size,
        trends_group_delay_ms,
        trends_retry_delay_ms,
        trends_max_retries,
        trends_hl,
        trends_tz,
        trends_geo,
        trends_reference,
        youtube_page_delay_ms,
        monitor_expected_total,
        monitor_poll_secs,
    })
}

fn parse_var<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
