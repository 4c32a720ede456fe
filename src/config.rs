//! Client configuration management.
//!
//! This module handles loading and saving the client configuration,
//! which includes the API base URL, the token lifecycle thresholds, and
//! the list of paths that show a notice instead of forcing a sign-in.
//!
//! Configuration is stored at `~/.config/inkpost/config.json`.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "inkpost";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default API base URL (the backend mounts everything under /api/v1)
const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// HTTP request timeout in seconds.
/// 10s keeps a hung backend from wedging callers waiting on a refresh.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Refresh the access token once it is within this window of its expiry.
/// Access tokens live ~30 minutes; a 5 minute buffer leaves room for
/// clock drift and in-flight requests.
const DEFAULT_ACCESS_REFRESH_THRESHOLD_SECS: i64 = 5 * 60;

/// Renew the whole session once the refresh token is within this window
/// of its expiry. Refresh tokens live 7 days and rotate on every refresh,
/// so renewing a day early keeps active users signed in indefinitely.
const DEFAULT_REFRESH_RENEW_THRESHOLD_SECS: i64 = 24 * 60 * 60;

/// How often the scheduler checks the access token for looming expiry.
const DEFAULT_EXPIRY_CHECK_INTERVAL_SECS: u64 = 60;

/// How often the scheduler checks the refresh token's remaining lifetime.
const DEFAULT_REFRESH_HEALTH_INTERVAL_SECS: u64 = 12 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every request path is appended to.
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub access_refresh_threshold_secs: i64,
    pub refresh_renew_threshold_secs: i64,
    pub expiry_check_interval_secs: u64,
    pub refresh_health_interval_secs: u64,
    /// Request paths whose terminal auth failures show a notice instead of
    /// broadcasting a sign-in-required event. Matched against the path
    /// exactly, query string excluded.
    pub notice_paths: Vec<String>,
    /// Where the token pair is persisted. `None` uses the platform cache
    /// directory.
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            access_refresh_threshold_secs: DEFAULT_ACCESS_REFRESH_THRESHOLD_SECS,
            refresh_renew_threshold_secs: DEFAULT_REFRESH_RENEW_THRESHOLD_SECS,
            expiry_check_interval_secs: DEFAULT_EXPIRY_CHECK_INTERVAL_SECS,
            refresh_health_interval_secs: DEFAULT_REFRESH_HEALTH_INTERVAL_SECS,
            notice_paths: vec!["/auth/send-change-password-code".to_string()],
            token_file: None,
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Full URL for an API path like `/auth/refresh`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Whether a terminal auth failure on this path should stay quiet and
    /// let the caller show its own notice.
    pub fn is_notice_path(&self, path: &str) -> bool {
        self.notice_paths.iter().any(|p| p == path)
    }

    pub fn request_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.request_timeout_secs)
    }

    pub fn access_refresh_threshold(&self) -> Duration {
        Duration::seconds(self.access_refresh_threshold_secs)
    }

    pub fn refresh_renew_threshold(&self) -> Duration {
        Duration::seconds(self.refresh_renew_threshold_secs)
    }

    // Intervals are clamped to one second; tokio rejects zero-period timers.
    pub fn expiry_check_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.expiry_check_interval_secs.max(1))
    }

    pub fn refresh_health_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.refresh_health_interval_secs.max(1))
    }

    pub fn token_file_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.token_file {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("tokens.json"))
    }
}
