use super::FailureContext;
use serde::{Deserialize, Serialize};

/// Per-address events emitted by the verification loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VerificationEvent {
    /// Entry rejected without a remote call
    Skipped {
        position: usize,
        input: String,
        reason: String,
    },

    /// Remote call about to be dispatched
    Started { position: usize, email: String },

    /// Remote call returned a payload
    Verified { email: String, status: String },

    /// Remote call succeeded without data
    NoData { email: String },

    /// Remote call failed
    Failed {
        email: String,
        failure: FailureContext,
    },
}
