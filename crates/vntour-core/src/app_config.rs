#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub youtube_api_key: Option<String>,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub trends_group_size: usize,
    pub trends_group_delay_ms: u64,
    pub trends_retry_delay_ms: u64,
    pub trends_max_retries: u32,
    pub trends_hl: String,
    pub trends_tz: i32,
    pub trends_geo: String,
    pub trends_reference: f64,
    pub youtube_page_delay_ms: u64,
    pub monitor_expected_total: u64,
    pub monitor_poll_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field(
                "youtube_api_key",
                &self.youtube_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("trends_group_size", &self.trends_group_size)
            .field("trends_group_delay_ms", &self.trends_group_delay_ms)
            .field("trends_retry_delay_ms", &self.trends_retry_delay_ms)
            .field("trends_max_retries", &self.trends_max_retries)
            .field("trends_hl", &self.trends_hl)
            .field("trends_tz", &self.trends_tz)
            .field("trends_geo", &self.trends_geo)
            .field("trends_reference", &self.trends_reference)
            .field("youtube_page_delay_ms", &self.youtube_page_delay_ms)
            .field("monitor_expected_total", &self.monitor_expected_total)
            .field("monitor_poll_secs", &self.monitor_poll_secs)
            .finish()
    }
}
