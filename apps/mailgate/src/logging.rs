//! Structured logging integration for events
//!
//! Every event that reaches the CLI is also recorded through `tracing`, with
//! the event metadata and the event's own fields as structured values.

use mailgate_events::{
    AppEvent, EventMessage, GeneralEvent, PacingEvent, RunEvent, VerificationEvent,
};
use tracing::{debug, error, info, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    let source = meta.source.as_str();
    let event_id = &meta.event_id;
    let run_id = meta.run_id;

    match &message.event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message } => {
                warn!(source, %event_id, ?run_id, "{message}");
            }
            GeneralEvent::DebugLog { message } => {
                debug!(source, %event_id, ?run_id, "{message}");
            }
        },

        AppEvent::Run(run) => match run {
            RunEvent::Started {
                run_id,
                total,
                max_results,
            } => {
                info!(source, %event_id, %run_id, total, max_results, "Verification run started");
            }
            RunEvent::CapReached {
                max_results,
                remaining,
            } => {
                warn!(source, %event_id, ?run_id, max_results, remaining, "Result cap reached");
            }
            RunEvent::BatchEmitted { sink, count } => {
                info!(source, %event_id, ?run_id, sink, count, "Record batch emitted");
            }
            RunEvent::Completed {
                run_id,
                summary,
                duration_ms,
            } => {
                info!(
                    source,
                    %event_id,
                    %run_id,
                    total = summary.total,
                    successful = summary.successful,
                    failed = summary.failed,
                    duration_ms,
                    "Verification run completed"
                );
            }
            RunEvent::Cancelled { run_id, processed } => {
                warn!(source, %event_id, %run_id, processed, "Verification run cancelled");
            }
        },

        AppEvent::Verification(verification) => match verification {
            VerificationEvent::Skipped {
                position,
                input,
                reason,
            } => {
                warn!(source, %event_id, ?run_id, position, input, reason, "Entry skipped");
            }
            VerificationEvent::Started { position, email } => {
                debug!(source, %event_id, ?run_id, position, email, "Verification started");
            }
            VerificationEvent::Verified { email, status } => {
                info!(source, %event_id, ?run_id, email, status, "Address verified");
            }
            VerificationEvent::NoData { email } => {
                warn!(source, %event_id, ?run_id, email, "No verification data");
            }
            VerificationEvent::Failed { email, failure } => {
                error!(
                    source,
                    %event_id,
                    ?run_id,
                    email,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    error = %failure.message,
                    hint = ?failure.hint,
                    "Verification failed"
                );
            }
        },

        AppEvent::Pacing(pacing) => match pacing {
            PacingEvent::WindowReset { admitted } => {
                debug!(source, %event_id, admitted, "Pacing window reset");
            }
            PacingEvent::Waiting { wait_ms, quota } => {
                warn!(source, %event_id, wait_ms, quota, "Pacing quota exhausted, waiting");
            }
            PacingEvent::Resumed { waited_ms } => {
                info!(source, %event_id, waited_ms, "Pacing resumed");
            }
        },
    }
}
