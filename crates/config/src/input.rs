//! Per-run input: credentials, address list and result cap
//!
//! The input document is JSON supplied by the host, e.g.
//!
//! ```json
//! { "apiKey": "ta_...", "apiSecret": "ts_...", "emails": ["a@x.com"], "maxResults": 10 }
//! ```
//!
//! `tombaApiKey` / `tombaApiSecret` are accepted as aliases.

use crate::constants::{ENV_API_KEY, ENV_API_SECRET};
use mailgate_errors::{ConfigError, Error};
use mailgate_types::VerificationRequest;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Raw run input as supplied by the host
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInput {
    #[serde(default, alias = "tombaApiKey")]
    pub api_key: Option<String>,
    #[serde(default, alias = "tombaApiSecret")]
    pub api_secret: Option<String>,
    /// Kept as raw JSON so non-string entries can be reported per item
    #[serde(default)]
    pub emails: Option<Value>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl fmt::Debug for RunInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunInput")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("emails", &self.emails)
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl RunInput {
    /// Read the input document from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object
    /// of the expected shape.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ConfigError::InputUnreadable {
                path: path.display().to_string(),
                error: e.to_string(),
            }
        })?;
        Self::from_json(&contents)
    }

    /// Parse the input document from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object of the expected shape.
    pub fn from_json(contents: &str) -> Result<Self, Error> {
        serde_json::from_str(contents).map_err(|e| {
            ConfigError::ParseError {
                message: format!("run input: {e}"),
            }
            .into()
        })
    }

    /// Override credentials from the environment
    pub fn merge_env(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Override credentials with values produced by `lookup`
    pub fn merge_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(secret) = lookup(ENV_API_SECRET) {
            self.api_secret = Some(secret);
        }
    }

    /// Apply command-line values (highest precedence)
    ///
    /// Extra addresses are appended after any entries from the document.
    pub fn apply_overrides(
        &mut self,
        api_key: Option<String>,
        api_secret: Option<String>,
        extra_emails: Vec<String>,
        max_results: Option<usize>,
    ) {
        if api_key.is_some() {
            self.api_key = api_key;
        }
        if api_secret.is_some() {
            self.api_secret = api_secret;
        }
        if !extra_emails.is_empty() {
            let mut entries = match self.emails.take() {
                Some(Value::Array(entries)) => entries,
                Some(other) => vec![other],
                None => Vec::new(),
            };
            entries.extend(extra_emails.into_iter().map(Value::String));
            self.emails = Some(Value::Array(entries));
        }
        if max_results.is_some() {
            self.max_results = max_results;
        }
    }

    /// Validate into an executable plan
    ///
    /// Credentials are checked before the address list. A missing or zero
    /// `maxResults` falls back to `default_max_results`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a credential is absent or
    /// blank, or when the address list is absent or empty, and
    /// [`ConfigError::InvalidValue`] when `emails` is not an array.
    pub fn into_plan(self, default_max_results: usize) -> Result<RunPlan, Error> {
        let api_key = non_blank(self.api_key);
        let api_secret = non_blank(self.api_secret);
        let credentials = match (api_key, api_secret) {
            (Some(key), Some(secret)) => Credentials::new(key, secret),
            (None, None) => return Err(ConfigError::missing("apiKey, apiSecret").into()),
            (None, Some(_)) => return Err(ConfigError::missing("apiKey").into()),
            (Some(_), None) => return Err(ConfigError::missing("apiSecret").into()),
        };

        let entries = match self.emails {
            Some(Value::Array(entries)) if !entries.is_empty() => entries,
            Some(Value::Array(_)) | None | Some(Value::Null) => {
                return Err(ConfigError::missing("emails").into())
            }
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    field: "emails".to_string(),
                    value: other.to_string(),
                }
                .into())
            }
        };

        let max_results = match self.max_results {
            Some(0) | None => default_max_results,
            Some(n) => n,
        };

        Ok(RunPlan {
            credentials,
            requests: entries
                .into_iter()
                .map(VerificationRequest::from_value)
                .collect(),
            max_results,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// API key pair for the remote service
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key: String,
    secret: String,
}

impl Credentials {
    #[must_use]
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A validated run: everything the verification loop needs
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub credentials: Credentials,
    pub requests: Vec<VerificationRequest>,
    pub max_results: usize,
}

impl RunPlan {
    /// Number of entries in the input address list
    #[must_use]
    pub fn total(&self) -> usize {
        self.requests.len()
    }
}
