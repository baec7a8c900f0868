#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations for mailgate
//!
//! This crate sits between the CLI and the library crates: it owns the
//! pacing gate, the verification loop and the destinations records are
//! written to.

mod cancel;
mod context;
mod pacing;
mod sink;
mod verify;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use context::{OpsContextBuilder, OpsCtx};
pub use pacing::{
    Clock, FixedWindowGate, ManualClock, PacingPolicy, RateLimiter, SystemClock, DEFAULT_QUOTA,
    DEFAULT_WINDOW,
};
pub use sink::{render_records, JsonFileSink, MemorySink, RecordSink, StdoutSink};
pub use verify::{verify_batch, VerificationReport};

use mailgate_config::Config;
use mailgate_errors::{Error, OpsError};
use serde::Serialize;
use std::path::PathBuf;

/// Effective configuration, as shown by `config show`
///
/// Holds no credentials; those only live in the run input.
#[derive(Clone, Debug, Serialize)]
pub struct ConfigSnapshot {
    /// File the configuration was read from, if any
    pub source: Option<PathBuf>,
    pub config: Config,
}

impl ConfigSnapshot {
    #[must_use]
    pub fn new(source: Option<PathBuf>, config: Config) -> Self {
        Self { source, config }
    }
}

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Verification run report
    Verification(VerificationReport),
    /// Effective configuration
    Config(ConfigSnapshot),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Whether the operation ran to completion
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::Verification(report) => !report.cancelled,
            OperationResult::Config(_) => true,
        }
    }
}
