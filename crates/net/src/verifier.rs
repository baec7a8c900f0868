//! Remote email verification

use crate::client::NetClient;
use async_trait::async_trait;
use mailgate_config::Credentials;
use mailgate_errors::{Error, NetworkError};
use mailgate_types::VerificationPayload;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

const KEY_HEADER: &str = "x-tomba-key";
const SECRET_HEADER: &str = "x-tomba-secret";

/// A remote service that verifies one address per call
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Verify a single address.
    ///
    /// `Ok(None)` means the call succeeded but carried no usable data.
    async fn verify(&self, email: &str) -> Result<Option<VerificationPayload>, Error>;
}

/// Tomba email-verifier endpoint
#[derive(Debug, Clone)]
pub struct TombaVerifier {
    client: NetClient,
    base_url: Url,
    headers: HeaderMap,
}

impl TombaVerifier {
    /// Create a verifier against `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` cannot serve as a base for paths or the
    /// credentials are not valid header values.
    pub fn new(client: NetClient, base_url: &str, credentials: &Credentials) -> Result<Self, Error> {
        let base_url = Url::parse(base_url).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(NetworkError::InvalidUrl(base_url.to_string()).into());
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(KEY_HEADER, secret_header(credentials.key())?);
        headers.insert(SECRET_HEADER, secret_header(credentials.secret())?);

        Ok(Self {
            client,
            base_url,
            headers,
        })
    }

    /// URL of the verification call for `email`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot take path segments.
    pub fn endpoint(&self, email: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| NetworkError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v1", "email-verifier", email]);
        Ok(url)
    }
}

fn secret_header(value: &str) -> Result<HeaderValue, Error> {
    let mut header = HeaderValue::from_str(value).map_err(|_| {
        mailgate_errors::ConfigError::InvalidValue {
            field: "credentials".to_string(),
            value: "<redacted>".to_string(),
        }
    })?;
    header.set_sensitive(true);
    Ok(header)
}

#[async_trait]
impl Verifier for TombaVerifier {
    async fn verify(&self, email: &str) -> Result<Option<VerificationPayload>, Error> {
        let url = self.endpoint(email)?;
        tracing::debug!(%url, "dispatching verification request");

        let response = self.client.get(url, self.headers.clone()).await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let seconds = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(NetworkError::RateLimited { seconds }.into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let message = api_error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map_or_else(|| status.to_string(), str::to_string)
            });
            return Err(NetworkError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let envelope: Value = serde_json::from_str(&body)
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))?;
        Ok(extract_data(envelope))
    }
}

/// Pull the `data` object out of a success envelope
fn extract_data(envelope: Value) -> Option<VerificationPayload> {
    let Value::Object(mut root) = envelope else {
        return None;
    };
    match root.remove("data") {
        Some(Value::Object(data)) => Some(data),
        _ => None,
    }
}

/// Best-effort error text from a failure body
///
/// Understands `{"errors": {"message": ..}}`, `{"error": ..}` and `{"message": ..}`.
fn api_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = value
        .pointer("/errors/message")
        .or_else(|| value.get("error"))
        .or_else(|| value.get("message"))?;
    match message {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    }
}

/// Provider status (`email.status`) of a payload
#[must_use]
pub fn payload_status(payload: &VerificationPayload) -> &str {
    payload
        .get("email")
        .and_then(|email| email.get("status"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
}
