#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for mailgate
//!
//! This crate provides the data model shared by the configuration layer,
//! the verification loop and the CLI: input requests, output records and
//! run summaries, plus the small output-selection enums.

pub mod record;
pub mod summary;

pub use record::{
    Outcome, VerificationPayload, VerificationRecord, VerificationRequest, INVALID_EMAIL_FORMAT,
    INVALID_INPUT_PLACEHOLDER, NO_VERIFICATION_DATA,
};
pub use summary::RunSummary;
pub use uuid::Uuid;

use serde::{Deserialize, Serialize};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    #[default]
    Tty,
    Json,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

/// On-disk layout of an emitted record batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// One pretty-printed JSON array
    #[default]
    Json,
    /// One JSON object per line
    Jsonl,
}

impl clap::ValueEnum for RecordFormat {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Jsonl]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Json => clap::builder::PossibleValue::new("json"),
            Self::Jsonl => clap::builder::PossibleValue::new("jsonl"),
        })
    }
}

impl std::fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Jsonl => write!(f, "jsonl"),
        }
    }
}
