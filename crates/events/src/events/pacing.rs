use serde::{Deserialize, Serialize};

/// Pacing gate events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PacingEvent {
    /// Window elapsed; the admit counter starts over
    WindowReset { admitted: u32 },

    /// Quota exhausted; the caller is suspended
    Waiting { wait_ms: u64, quota: u32 },

    /// Suspension ended and a new window opened
    Resumed { waited_ms: u64 },
}
