//! Run summary

use crate::VerificationRecord;
use serde::{Deserialize, Serialize};

/// Totals reported at the end of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of entries in the input address list
    pub total: usize,
    /// Records without an `error` field
    pub successful: usize,
    /// Records with an `error` field
    pub failed: usize,
}

impl RunSummary {
    /// Tally emitted records against the size of the input list
    #[must_use]
    pub fn from_records(total: usize, records: &[VerificationRecord]) -> Self {
        let successful = records.iter().filter(|r| r.is_success()).count();
        Self {
            total,
            successful,
            failed: records.len() - successful,
        }
    }

    /// Number of emitted records
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.successful + self.failed
    }
}
