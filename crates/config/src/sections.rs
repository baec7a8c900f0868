//! Configuration sections

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_RESULTS, DEFAULT_RATE_QUOTA,
    DEFAULT_RATE_WINDOW_MS, DEFAULT_TIMEOUT_SECS,
};
use mailgate_types::{ColorChoice, OutputFormat, RecordFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

/// Remote verification service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Outbound request pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_quota")]
    pub quota: u32,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            quota: DEFAULT_RATE_QUOTA,
            window_ms: DEFAULT_RATE_WINDOW_MS,
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Run defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Where emitted records go
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub format: RecordFormat,
}

/// Log file location used by `--debug`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_quota() -> u32 {
    DEFAULT_RATE_QUOTA
}

fn default_window_ms() -> u64 {
    DEFAULT_RATE_WINDOW_MS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
