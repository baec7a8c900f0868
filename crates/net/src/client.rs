//! HTTP client with connection pooling
//!
//! Requests are sent exactly once. Pacing happens upstream, so a retry here
//! would put more calls on the wire than the pacing gate admitted.

use mailgate_config::Config;
use mailgate_errors::{Error, NetworkError};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            user_agent: format!("mailgate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl NetConfig {
    /// Derive client settings from the application config
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.network.timeout),
            connect_timeout: Duration::from_secs(config.network.connect_timeout),
            ..Self::default()
        }
    }
}

/// HTTP client wrapper
#[derive(Clone, Debug)]
pub struct NetClient {
    client: Client,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: &NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ClientInit(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(&NetConfig::default())
    }

    /// Execute a GET request
    ///
    /// Non-success statuses are returned as responses; only transport
    /// failures become errors.
    ///
    /// # Errors
    ///
    /// Returns an error on timeouts, refused connections or other transport
    /// failures.
    pub async fn get(&self, url: Url, headers: HeaderMap) -> Result<Response, Error> {
        let display = url.to_string();
        self.client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| Self::classify(&e, &display))
    }

    fn classify(error: &reqwest::Error, url: &str) -> Error {
        if error.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
            }
            .into()
        } else if error.is_connect() {
            NetworkError::ConnectionRefused(error.to_string()).into()
        } else {
            NetworkError::RequestFailed(error.to_string()).into()
        }
    }
}
