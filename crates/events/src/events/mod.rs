use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventMeta, EventSource};
use mailgate_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the failure has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod pacing;
pub mod run;
pub mod verification;

pub use general::*;
pub use pacing::*;
pub use run::*;
pub use verification::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Free-form warnings and debug lines
    General(GeneralEvent),

    /// Batch lifecycle
    Run(RunEvent),

    /// Per-address progress
    Verification(VerificationEvent),

    /// Request pacing
    Pacing(PacingEvent),
}

impl AppEvent {
    /// Default severity used when no explicit level is attached
    #[must_use]
    pub fn default_level(&self) -> EventLevel {
        match self {
            AppEvent::General(GeneralEvent::DebugLog { .. }) => EventLevel::Debug,
            AppEvent::General(GeneralEvent::Warning { .. })
            | AppEvent::Run(RunEvent::CapReached { .. } | RunEvent::Cancelled { .. })
            | AppEvent::Verification(
                VerificationEvent::Skipped { .. } | VerificationEvent::NoData { .. },
            )
            | AppEvent::Pacing(PacingEvent::Waiting { .. }) => EventLevel::Warn,
            AppEvent::Verification(VerificationEvent::Failed { .. }) => EventLevel::Error,
            AppEvent::Pacing(PacingEvent::WindowReset { .. }) => EventLevel::Debug,
            _ => EventLevel::Info,
        }
    }

    /// Subsystem that owns this event
    #[must_use]
    pub fn default_source(&self) -> EventSource {
        match self {
            AppEvent::General(_) => EventSource::General,
            AppEvent::Run(_) => EventSource::Run,
            AppEvent::Verification(_) => EventSource::Verification,
            AppEvent::Pacing(_) => EventSource::Pacing,
        }
    }
}

/// An event together with its metadata, as carried on the channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: AppEvent) -> Self {
        Self { meta, event }
    }

    /// Wrap an event with metadata derived from the event itself
    #[must_use]
    pub fn from_event(event: AppEvent) -> Self {
        let meta = EventMeta::new(event.default_level(), event.default_source());
        Self { meta, event }
    }
}

impl From<AppEvent> for EventMessage {
    fn from(event: AppEvent) -> Self {
        Self::from_event(event)
    }
}
