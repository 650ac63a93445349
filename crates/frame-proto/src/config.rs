use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;

use super::mode::Mode;
use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lastfm: LastFmConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub art: ArtConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub touch: TouchConfig,
}

/// last.fm account and request shape.
///
/// `api_key` and `username` default to the values baked in at build time
/// (`LASTFM_API_KEY` / `LASTFM_USERNAME`), so a device can run without any
/// config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastFmConfig {
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Number of tracks requested per refresh.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Signed offset from UTC, in hours. Fractional zones (e.g. 5.5) are allowed.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: f32,
    #[serde(default = "default_ntp_server")]
    pub ntp_server: String,
    #[serde(default = "default_ntp_attempts")]
    pub ntp_attempts: u32,
    #[serde(default = "default_ntp_retry_delay_secs")]
    pub ntp_retry_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Main loop cadence.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Time between scheduled last.fm polls.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Consecutive failures tolerated before the link is re-established.
    #[serde(default = "default_retry_ceiling")]
    pub retry_ceiling: u8,
    #[serde(default = "default_short_backoff_secs")]
    pub short_backoff_secs: u64,
    #[serde(default = "default_extended_backoff_secs")]
    pub extended_backoff_secs: u64,
    #[serde(default)]
    pub initial_mode: Mode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtConfig {
    /// Image resizing proxy. Receives `url`, `w`, `h` and `con` query params.
    #[serde(default = "default_proxy_base")]
    pub proxy_base: String,
    /// Width and height requested from the proxy, in pixels.
    #[serde(default = "default_art_size")]
    pub size: u32,
    #[serde(default = "default_contrast")]
    pub contrast: i32,
    #[serde(default = "default_corner_radius")]
    pub corner_radius: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouchConfig {
    #[serde(default = "default_release_poll_ms")]
    pub release_poll_ms: u64,
    #[serde(default = "default_release_timeout_secs")]
    pub release_timeout_secs: u64,
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            username: default_username(),
            api_base: default_api_base(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            ntp_server: default_ntp_server(),
            ntp_attempts: default_ntp_attempts(),
            ntp_retry_delay_secs: default_ntp_retry_delay_secs(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            refresh_interval_secs: default_refresh_interval_secs(),
            retry_ceiling: default_retry_ceiling(),
            short_backoff_secs: default_short_backoff_secs(),
            extended_backoff_secs: default_extended_backoff_secs(),
            initial_mode: Mode::default(),
        }
    }
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            proxy_base: default_proxy_base(),
            size: default_art_size(),
            contrast: default_contrast(),
            corner_radius: default_corner_radius(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            release_poll_ms: default_release_poll_ms(),
            release_timeout_secs: default_release_timeout_secs(),
        }
    }
}

fn default_api_key() -> String {
    option_env!("LASTFM_API_KEY").unwrap_or_default().to_string()
}

fn default_username() -> String {
    option_env!("LASTFM_USERNAME").unwrap_or_default().to_string()
}

fn default_api_base() -> String {
    "https://ws.audioscrobbler.com/2.0/".to_string()
}

fn default_recent_limit() -> usize {
    4
}

fn default_utc_offset_hours() -> f32 {
    option_env!("TIMEZONE_OFFSET")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0.0)
}

fn default_ntp_server() -> String {
    "pool.ntp.org:123".to_string()
}

fn default_ntp_attempts() -> u32 {
    3
}

fn default_ntp_retry_delay_secs() -> u64 {
    2
}

fn default_tick_ms() -> u64 {
    300
}

fn default_refresh_interval_secs() -> u64 {
    30
}

fn default_retry_ceiling() -> u8 {
    3
}

fn default_short_backoff_secs() -> u64 {
    5
}

fn default_extended_backoff_secs() -> u64 {
    30
}

fn default_proxy_base() -> String {
    "https://wsrv.nl/".to_string()
}

fn default_art_size() -> u32 {
    420
}

fn default_contrast() -> i32 {
    15
}

fn default_corner_radius() -> u32 {
    15
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_release_poll_ms() -> u64 {
    10
}

fn default_release_timeout_secs() -> u64 {
    10
}

impl ClockConfig {
    pub fn utc_offset(&self) -> anyhow::Result<FixedOffset> {
        if !self.utc_offset_hours.is_finite() {
            anyhow::bail!("utc_offset_hours is not a number: {}", self.utc_offset_hours);
        }
        let secs = (self.utc_offset_hours * 3600.0).round() as i32;
        FixedOffset::east_opt(secs).ok_or_else(|| {
            anyhow::anyhow!("utc_offset_hours out of range: {}", self.utc_offset_hours)
        })
    }

    pub fn ntp_retry_delay(&self) -> Duration {
        Duration::from_secs(self.ntp_retry_delay_secs)
    }
}

impl PollingConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Reject configurations the device cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.lastfm.api_key.trim().is_empty() {
            anyhow::bail!(
                "last.fm api_key is not set (build with LASTFM_API_KEY or set [lastfm] api_key in {})",
                Self::config_path().display()
            );
        }
        if self.lastfm.username.trim().is_empty() {
            anyhow::bail!(
                "last.fm username is not set (build with LASTFM_USERNAME or set [lastfm] username in {})",
                Self::config_path().display()
            );
        }
        if self.lastfm.recent_limit == 0 {
            anyhow::bail!("lastfm.recent_limit must be at least 1");
        }
        if self.polling.refresh_interval_secs == 0 {
            anyhow::bail!("polling.refresh_interval_secs must be at least 1");
        }
        self.clock.utc_offset()?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.lastfm.recent_limit, 4);
        assert_eq!(config.polling.tick_ms, 300);
        assert_eq!(config.polling.retry_ceiling, 3);
        assert_eq!(config.polling.initial_mode, Mode::AlbumArt);
        assert_eq!(config.art.size, 420);
        assert_eq!(config.art.contrast, 15);
        assert!(config.lastfm.api_base.starts_with("https://"));
        assert!(Config::config_path().ends_with("nowplaying-frame/config.toml"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [lastfm]
            api_key = "k"
            username = "someone"

            [clock]
            utc_offset_hours = -5.0

            [polling]
            initial_mode = "clock"
            "#,
        )
        .unwrap();
        assert_eq!(config.lastfm.username, "someone");
        assert_eq!(config.lastfm.recent_limit, 4);
        assert_eq!(config.polling.initial_mode, Mode::Clock);
        assert_eq!(config.polling.refresh_interval_secs, 30);
        assert_eq!(config.clock.utc_offset().unwrap().local_minus_utc(), -5 * 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_credentials_and_bad_offset() {
        let mut config = Config::default();
        config.lastfm.api_key = String::new();
        config.lastfm.username = "someone".into();
        assert!(config.validate().is_err());

        config.lastfm.api_key = "k".into();
        config.clock.utc_offset_hours = 30.0;
        assert!(config.validate().is_err());

        config.clock.utc_offset_hours = 5.5;
        assert_eq!(config.clock.utc_offset().unwrap().local_minus_utc(), 19800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval_and_nan_offset() {
        let mut config = Config::default();
        config.lastfm.api_key = "k".into();
        config.lastfm.username = "someone".into();
        assert!(config.validate().is_ok());

        config.polling.refresh_interval_secs = 0;
        assert!(config.validate().is_err());

        config.polling.refresh_interval_secs = 30;
        config.clock.utc_offset_hours = f32::NAN;
        assert!(config.clock.utc_offset().is_err());
        assert!(config.validate().is_err());

        config.clock.utc_offset_hours = f32::INFINITY;
        assert!(config.validate().is_err());
    }
}
