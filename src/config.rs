// src/config.rs
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{DashboardError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.humanevalcomm.pappuraj.com/";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Runtime configuration for the dashboard client.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Origin every API path is joined onto.
    pub base_url: String,
    pub poll_interval_ms: u64,
    /// `None` leaves the transport's default in place.
    pub request_timeout_secs: Option<u64>,
}

/// Optional on-disk overrides. Every field may be omitted.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: None,
        }
    }
}

impl DashboardConfig {
    /// Load configuration: defaults, then the TOML file (if any), then environment variables.
    ///
    /// An explicit `path` must exist. Otherwise `HUMANEVAL_DASHBOARD_CONFIG` is tried, then
    /// `<config dir>/humaneval-dashboard/config.toml` when it is present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var("HUMANEVAL_DASHBOARD_CONFIG")
                .ok()
                .map(PathBuf::from)
                .or_else(|| default_config_path().filter(|p| p.exists())),
        };

        if let Some(file) = file {
            log::debug!("Loading config file {}", file.display());
            let contents = std::fs::read_to_string(&file)?;
            config.apply_file(toml::from_str(&contents)?);
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(interval) = file.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if file.request_timeout_secs.is_some() {
            self.request_timeout_secs = file.request_timeout_secs;
        }
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("HUMANEVAL_API_BASE") {
            self.base_url = base_url;
        }
        if let Some(raw) = lookup("HUMANEVAL_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_u64("HUMANEVAL_POLL_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("HUMANEVAL_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(parse_u64("HUMANEVAL_REQUEST_TIMEOUT_SECS", &raw)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(DashboardError::Config("base_url must not be empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(DashboardError::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                base
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(DashboardError::Config("poll_interval_ms must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| DashboardError::Config(format!("{} must be a whole number, got '{}'", key, raw)))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("humaneval-dashboard").join("config.toml"))
}
