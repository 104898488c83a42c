use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.youtube_api_key.is_none());
    assert_eq!(cfg.http_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "vntour/0.1 (tourism-signals)");
    assert_eq!(cfg.trends_group_size, 4);
    assert_eq!(cfg.trends_group_delay_ms, 4000);
    assert_eq!(cfg.trends_retry_delay_ms, 6000);
    assert_eq!(cfg.trends_max_retries, 2);
    assert_eq!(cfg.trends_hl, "vi");
    assert_eq!(cfg.trends_tz, 420);
    assert_eq!(cfg.trends_geo, "VN");
    assert!((cfg.trends_reference - 100.0).abs() < f64::EPSILON);
    assert_eq!(cfg.youtube_page_delay_ms, 200);
    assert_eq!(cfg.monitor_expected_total, 510);
    assert_eq!(cfg.monitor_poll_secs, 5);
}

#[test]
fn youtube_api_key_is_read_when_present() {
    let mut map = HashMap::new();
    map.insert("YOUTUBE_API_KEY", "AIza-test");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.youtube_api_key.as_deref(), Some("AIza-test"));
}

#[test]
fn blank_youtube_api_key_is_treated_as_missing() {
    let mut map = HashMap::new();
    map.insert("YOUTUBE_API_KEY", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.youtube_api_key.is_none());
}

#[test]
fn debug_output_redacts_api_key() {
    let mut map = HashMap::new();
    map.insert("YOUTUBE_API_KEY", "AIza-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("AIza-secret"), "key leaked: {rendered}");
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn group_size_override() {
    let mut map = HashMap::new();
    map.insert("VNTOUR_TRENDS_GROUP_SIZE", "3");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.trends_group_size, 3);
}

#[test]
fn group_size_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("VNTOUR_TRENDS_GROUP_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "VNTOUR_TRENDS_GROUP_SIZE"),
        "expected InvalidEnvVar(VNTOUR_TRENDS_GROUP_SIZE), got: {result:?}"
    );
}

#[test]
fn group_delay_invalid() {
    let mut map = HashMap::new();
    map.insert("VNTOUR_TRENDS_GROUP_DELAY_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "VNTOUR_TRENDS_GROUP_DELAY_MS"),
        "expected InvalidEnvVar(VNTOUR_TRENDS_GROUP_DELAY_MS), got: {result:?}"
    );
}

#[test]
fn negative_timezone_offset_is_accepted() {
    let mut map = HashMap::new();
    map.insert("VNTOUR_TRENDS_TZ", "-60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.trends_tz, -60);
}

#[test]
fn reference_constant_must_be_positive() {
    let mut map = HashMap::new();
    map.insert("VNTOUR_TRENDS_REFERENCE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "VNTOUR_TRENDS_REFERENCE"),
        "expected InvalidEnvVar(VNTOUR_TRENDS_REFERENCE), got: {result:?}"
    );
}

#[test]
fn monitor_expected_total_override() {
    let mut map = HashMap::new();
    map.insert("VNTOUR_MONITOR_EXPECTED_TOTAL", "1020");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.monitor_expected_total, 1020);
}

#[test]
fn monitor_poll_secs_invalid() {
    let mut map = HashMap::new();
    map.insert("VNTOUR_MONITOR_POLL_SECS", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "VNTOUR_MONITOR_POLL_SECS"),
        "expected InvalidEnvVar(VNTOUR_MONITOR_POLL_SECS), got: {result:?}"
    );
}
