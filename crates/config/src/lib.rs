#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for mailgate
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/mailgate/config.toml)
//! - Environment variables
//! - CLI flags
//!
//! It also owns the per-run input document (credentials plus the address
//! list) and its validation into a [`RunPlan`].

pub mod constants;
pub mod sections;
pub mod input;

pub use sections::{
    ApiConfig, GeneralConfig, LoggingConfig, NetworkConfig, OutputConfig, PacingConfig, RunConfig,
};
pub use input::{Credentials, RunInput, RunPlan};

use constants::{
    ENV_API_BASE_URL, ENV_COLOR, ENV_OUTPUT, ENV_RATE_QUOTA, ENV_RATE_WINDOW_MS, ENV_TIMEOUT,
};
use mailgate_errors::{ConfigError, Error};
use mailgate_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("mailgate").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading config file");
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge values produced by `lookup`, keyed by environment variable name
    ///
    /// # Errors
    ///
    /// Returns an error if a present value cannot be parsed.
    pub fn merge_env_from<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(output) = lookup(ENV_OUTPUT) {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => return Err(invalid_value(ENV_OUTPUT, output)),
            };
        }

        if let Some(color) = lookup(ENV_COLOR) {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => return Err(invalid_value(ENV_COLOR, color)),
            };
        }

        if let Some(base_url) = lookup(ENV_API_BASE_URL) {
            if base_url.trim().is_empty() {
                return Err(invalid_value(ENV_API_BASE_URL, base_url));
            }
            self.api.base_url = base_url;
        }

        if let Some(quota) = lookup(ENV_RATE_QUOTA) {
            self.pacing.quota = quota
                .parse()
                .map_err(|_| invalid_value(ENV_RATE_QUOTA, quota))?;
        }

        if let Some(window) = lookup(ENV_RATE_WINDOW_MS) {
            self.pacing.window_ms = window
                .parse()
                .map_err(|_| invalid_value(ENV_RATE_WINDOW_MS, window))?;
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            self.network.timeout = timeout
                .parse()
                .map_err(|_| invalid_value(ENV_TIMEOUT, timeout))?;
        }

        Ok(())
    }

    /// Check cross-field constraints after all layers are merged
    ///
    /// # Errors
    ///
    /// Returns an error if the pacing quota or window is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.pacing.quota == 0 {
            return Err(invalid_value("pacing.quota", "0"));
        }
        if self.pacing.window_ms == 0 {
            return Err(invalid_value("pacing.window_ms", "0"));
        }
        if self.network.timeout == 0 {
            return Err(invalid_value("network.timeout", "0"));
        }
        Ok(())
    }

    /// Pacing window as a duration
    #[must_use]
    pub fn pacing_window(&self) -> Duration {
        Duration::from_millis(self.pacing.window_ms)
    }

    /// Get the log directory (with default)
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.logging.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("mailgate")
                .join("logs")
        })
    }
}

fn invalid_value(field: &str, value: impl Into<String>) -> Error {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_service_limits() {
        let config = Config::default();
        assert_eq!(config.pacing.quota, 150);
        assert_eq!(config.pacing_window(), Duration::from_secs(60));
        assert_eq!(config.run.default_max_results, 50);
        assert_eq!(config.api.base_url, "https://api.tomba.io");
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(
            &path,
            "[pacing]\nquota = 10\n\n[output]\nformat = \"jsonl\"\n",
        )
        .await
        .unwrap();

        let config = Config::load_from_file(&path).await.unwrap();
        assert_eq!(config.pacing.quota, 10);
        assert_eq!(config.pacing.window_ms, 60_000);
        assert_eq!(config.output.format, mailgate_types::RecordFormat::Jsonl);
    }

    #[tokio::test]
    async fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load_or_default(Some(missing.as_path()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[pacing\nquota = ").await.unwrap();
        let err = Config::load_from_file(&path).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn env_overrides_file() {
        let mut config = Config::default();
        config
            .merge_env_from(lookup(&[
                (ENV_RATE_QUOTA, "5"),
                (ENV_RATE_WINDOW_MS, "1000"),
                (ENV_COLOR, "never"),
            ]))
            .unwrap();
        assert_eq!(config.pacing.quota, 5);
        assert_eq!(config.pacing.window_ms, 1000);
        assert_eq!(config.general.color, ColorChoice::Never);
    }

    #[test]
    fn env_rejects_garbage() {
        let mut config = Config::default();
        let err = config
            .merge_env_from(lookup(&[(ENV_RATE_QUOTA, "many")]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { ref field, .. }) if field == ENV_RATE_QUOTA
        ));
    }

    #[test]
    fn zero_quota_fails_validation() {
        let mut config = Config::default();
        config.pacing.quota = 0;
        assert!(config.validate().is_err());
    }
}
