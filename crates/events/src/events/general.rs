use serde::{Deserialize, Serialize};

/// Free-form diagnostics that belong to no domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    /// Something the user should know about; the run continues
    Warning { message: String },

    /// Detail shown only with `--debug`
    DebugLog { message: String },
}

impl GeneralEvent {
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::DebugLog {
            message: message.into(),
        }
    }
}
