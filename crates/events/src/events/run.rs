use mailgate_types::RunSummary;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Batch-level events for one verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    /// Run accepted with a validated input list
    Started {
        run_id: Uuid,
        total: usize,
        max_results: usize,
    },

    /// Result cap hit; the remaining entries are dropped
    CapReached { max_results: usize, remaining: usize },

    /// Records handed to the output sink
    BatchEmitted { sink: String, count: usize },

    /// Run finished
    Completed {
        run_id: Uuid,
        summary: RunSummary,
        duration_ms: u64,
    },

    /// Run stopped early on request
    Cancelled { run_id: Uuid, processed: usize },
}
