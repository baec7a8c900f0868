//! Built-in defaults and environment variable names

pub const DEFAULT_API_BASE_URL: &str = "https://api.tomba.io";

/// Calls admitted per pacing window
pub const DEFAULT_RATE_QUOTA: u32 = 150;
/// Pacing window length in milliseconds
pub const DEFAULT_RATE_WINDOW_MS: u64 = 60_000;

pub const DEFAULT_MAX_RESULTS: usize = 50;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_KEY: &str = "MAILGATE_API_KEY";
pub const ENV_API_SECRET: &str = "MAILGATE_API_SECRET";
pub const ENV_API_BASE_URL: &str = "MAILGATE_API_BASE_URL";
pub const ENV_COLOR: &str = "MAILGATE_COLOR";
pub const ENV_OUTPUT: &str = "MAILGATE_OUTPUT";
pub const ENV_RATE_QUOTA: &str = "MAILGATE_RATE_QUOTA";
pub const ENV_RATE_WINDOW_MS: &str = "MAILGATE_RATE_WINDOW_MS";
pub const ENV_TIMEOUT: &str = "MAILGATE_TIMEOUT";
