//! Configuration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("parse error: {message}")]
    ParseError { message: String },

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("input file not readable: {path}: {error}")]
    InputUnreadable { path: String, error: String },
}

impl ConfigError {
    /// Shorthand for a missing required field
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Pass an existing file with --config or remove the flag."),
            Self::MissingField { field } => Some(match field.as_str() {
                "emails" => "Provide addresses via the input file `emails` array or --email.",
                f if f.starts_with("apiKey") || f.starts_with("apiSecret") => {
                    "Set apiKey/apiSecret in the input file, MAILGATE_API_KEY/MAILGATE_API_SECRET, or --api-key/--api-secret."
                }
                _ => "Add the missing field noted in the error message.",
            }),
            Self::InvalidValue { .. } | Self::ParseError { .. } => {
                Some("Fix the configuration value and retry the command.")
            }
            Self::InputUnreadable { .. } => Some("Check the --input path and its permissions."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotFound { .. } => "config.not_found",
            Self::ParseError { .. } => "config.parse",
            Self::MissingField { .. } => "config.missing_field",
            Self::InvalidValue { .. } => "config.invalid_value",
            Self::InputUnreadable { .. } => "config.input_unreadable",
        })
    }
}
