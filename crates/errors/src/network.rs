//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum NetworkError {
    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("client initialization failed: {0}")]
    ClientInit(String),

    #[error("rate limited by remote service")]
    RateLimited { seconds: Option<u64> },
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::Api { message, .. } => Cow::Borrowed(message.as_str()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } => Some("Increase `network.timeout` or check connectivity."),
            Self::ConnectionRefused(_) => Some("Check `api.base_url` and your network connection."),
            Self::Api { status: 401 | 403, .. } => {
                Some("Check that the API key and secret are valid.")
            }
            Self::RateLimited { .. } => {
                Some("Lower `pacing.quota` or widen `pacing.window_ms` to stay under the plan limit.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. }
            | Self::ConnectionRefused(_)
            | Self::RequestFailed(_)
            | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Timeout { .. } => "network.timeout",
            Self::RequestFailed(_) => "network.request_failed",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::Api { .. } => "network.api_error",
            Self::InvalidResponse(_) => "network.invalid_response",
            Self::ClientInit(_) => "network.client_init",
            Self::RateLimited { .. } => "network.rate_limited",
        })
    }
}
