//! Operations context for dependency injection

use crate::cancel::CancelSignal;
use mailgate_errors::{Error, OpsError};
use mailgate_events::{EventEmitter, EventSender};
use mailgate_net::Verifier;
use std::sync::Arc;
use uuid::Uuid;

/// Operations context providing access to the run's collaborators
pub struct OpsCtx {
    /// Remote verification call
    pub verifier: Arc<dyn Verifier>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Cooperative cancellation
    pub cancel: CancelSignal,
    /// Correlation id for every event of this run
    pub run_id: Uuid,
}

impl std::fmt::Debug for OpsCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpsCtx")
            .field("run_id", &self.run_id)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }

    fn run_id(&self) -> Option<Uuid> {
        Some(self.run_id)
    }
}

/// Builder for operations context
#[derive(Default)]
pub struct OpsContextBuilder {
    verifier: Option<Arc<dyn Verifier>>,
    tx: Option<EventSender>,
    cancel: Option<CancelSignal>,
    run_id: Option<Uuid>,
}

impl OpsContextBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Use a fixed run id instead of a random one
    #[must_use]
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if the verifier or event sender is missing.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let verifier = self.verifier.ok_or_else(|| OpsError::MissingComponent {
            component: "verifier".to_string(),
        })?;

        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event sender".to_string(),
        })?;

        Ok(OpsCtx {
            verifier,
            tx,
            cancel: self.cancel.unwrap_or_default(),
            run_id: self.run_id.unwrap_or_else(Uuid::new_v4),
        })
    }
}
