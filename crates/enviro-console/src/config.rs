//! Console configuration.
//!
//! Resolution order: built-in defaults, then the TOML file (explicit
//! `--config` path or `~/.config/enviro-console/config.toml`), then the
//! `ENVIRO_API_URL` environment variable, then command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use enviro_protocol::{API_URL_ENV, DEFAULT_API_URL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the complaint API.
    pub api_base_url: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Refresh period of the statistics screen.
    pub stats_refresh_secs: u64,
    /// Listen address of the local web dashboard.
    pub dashboard_bind: String,
    /// Directory of static web assets served by the dashboard.
    pub web_root: Option<PathBuf>,
    /// Default tracing directive when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 15,
            stats_refresh_secs: 10,
            dashboard_bind: "127.0.0.1:9380".to_string(),
            web_root: None,
            log_level: "info".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// `~/.config/enviro-console/config.toml` on Linux, platform equivalent elsewhere.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("enviro-console").join("config.toml"))
    }

    /// Where the TUI writes its log, so logging never draws over the screen.
    pub fn log_file_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("enviro-console")
            .join("console.log")
    }

    /// Load from `path`, or from the default location when `None`.
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Self =
            toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn stats_refresh(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.stats_refresh_secs.max(1))
    }
}
