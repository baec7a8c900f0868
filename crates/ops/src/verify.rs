//! Verification loop
//!
//! Addresses are processed one at a time in input order. Malformed entries
//! are recorded inline and do not count toward the result cap; every
//! dispatched call counts, whatever its outcome. The collected records are
//! pushed to the sink once, at the end.

use crate::cancel::CancelSignal;
use crate::context::OpsCtx;
use crate::pacing::RateLimiter;
use crate::sink::RecordSink;
use mailgate_config::RunPlan;
use mailgate_errors::{Error, NetworkError};
use mailgate_events::{AppEvent, EventEmitter, FailureContext, RunEvent, VerificationEvent};
use mailgate_net::payload_status;
use mailgate_types::{
    RunSummary, VerificationRecord, VerificationRequest, INVALID_EMAIL_FORMAT,
};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

/// Outcome of one verification run
#[derive(Clone, Debug, Serialize)]
pub struct VerificationReport {
    pub run_id: Uuid,
    /// Every emitted record, in input order
    pub records: Vec<VerificationRecord>,
    pub summary: RunSummary,
    /// The run stopped early on request
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

/// Verify every address of `plan`, pacing remote calls through `limiter`
///
/// Per-item failures are captured as records and never abort the run.
///
/// # Errors
///
/// Returns an error only if the sink rejects the batch.
pub async fn verify_batch<L, S>(
    ctx: &OpsCtx,
    plan: &RunPlan,
    limiter: &mut L,
    sink: &mut S,
) -> Result<VerificationReport, Error>
where
    L: RateLimiter + ?Sized,
    S: RecordSink + ?Sized,
{
    let started = Instant::now();
    let total = plan.total();
    tracing::info!(run_id = %ctx.run_id, total, max_results = plan.max_results, "verification run started");

    ctx.emit(AppEvent::Run(RunEvent::Started {
        run_id: ctx.run_id,
        total,
        max_results: plan.max_results,
    }));

    let mut records = Vec::with_capacity(total.min(plan.max_results));
    let mut processed = 0usize;
    let mut cancelled = false;

    for (position, request) in plan.requests.iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        if processed >= plan.max_results {
            ctx.emit(AppEvent::Run(RunEvent::CapReached {
                max_results: plan.max_results,
                remaining: total - position,
            }));
            break;
        }

        let email = match request {
            VerificationRequest::Address(email) => email,
            VerificationRequest::Malformed { input } => {
                let record = VerificationRecord::invalid_format(input.clone());
                ctx.emit(AppEvent::Verification(VerificationEvent::Skipped {
                    position,
                    input: record.input_display(),
                    reason: INVALID_EMAIL_FORMAT.to_string(),
                }));
                records.push(record);
                continue;
            }
        };

        if !admitted(limiter, &ctx.cancel).await {
            cancelled = true;
            break;
        }

        ctx.emit(AppEvent::Verification(VerificationEvent::Started {
            position,
            email: email.clone(),
        }));
        records.push(verify_one(ctx, email).await);
        processed += 1;
    }

    if cancelled {
        tracing::warn!(processed, "run cancelled");
        ctx.emit(AppEvent::Run(RunEvent::Cancelled {
            run_id: ctx.run_id,
            processed,
        }));
    }

    if !records.is_empty() {
        ctx.emit_debug(format!("pushing {} records to {}", records.len(), sink.name()));
        sink.push(&records).await?;
        ctx.emit(AppEvent::Run(RunEvent::BatchEmitted {
            sink: sink.name(),
            count: records.len(),
        }));
    }

    let summary = RunSummary::from_records(total, &records);
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    ctx.emit(AppEvent::Run(RunEvent::Completed {
        run_id: ctx.run_id,
        summary,
        duration_ms: elapsed_ms,
    }));

    Ok(VerificationReport {
        run_id: ctx.run_id,
        records,
        summary,
        cancelled,
        elapsed_ms,
    })
}

/// Wait for a pacing slot; `false` if cancelled first
async fn admitted<L>(limiter: &mut L, cancel: &CancelSignal) -> bool
where
    L: RateLimiter + ?Sized,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = limiter.acquire() => true,
    }
}

async fn verify_one(ctx: &OpsCtx, email: &str) -> VerificationRecord {
    match ctx.verifier.verify(email).await {
        Ok(Some(payload)) => {
            ctx.emit(AppEvent::Verification(VerificationEvent::Verified {
                email: email.to_string(),
                status: payload_status(&payload).to_string(),
            }));
            VerificationRecord::verified(email, payload)
        }
        Ok(None) => {
            ctx.emit(AppEvent::Verification(VerificationEvent::NoData {
                email: email.to_string(),
            }));
            VerificationRecord::no_data(email)
        }
        Err(err) => {
            tracing::debug!(email, error = %err, "verification failed");
            if let Error::Network(NetworkError::RateLimited { .. }) = &err {
                ctx.emit_warning("remote service is throttling requests; consider lowering pacing.quota");
            }
            ctx.emit(AppEvent::Verification(VerificationEvent::Failed {
                email: email.to_string(),
                failure: FailureContext::from_error(&err),
            }));
            VerificationRecord::failed(email, err.record_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use crate::context::OpsContextBuilder;
    use crate::pacing::{FixedWindowGate, ManualClock, PacingPolicy};
    use crate::sink::MemorySink;
    use async_trait::async_trait;
    use mailgate_config::{Credentials, RunInput};
    use mailgate_errors::ConfigError;
    use mailgate_events::{channel, EventReceiver, GeneralEvent};
    use mailgate_net::Verifier;
    use mailgate_types::{VerificationPayload, NO_VERIFICATION_DATA};
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Answers from a table; unknown addresses verify as "valid"
    #[derive(Default)]
    struct ScriptedVerifier {
        answers: HashMap<String, Result<Option<VerificationPayload>, Error>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedVerifier {
        fn answer(mut self, email: &str, result: Result<Option<VerificationPayload>, Error>) -> Self {
            self.answers.insert(email.to_string(), result);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Verifier for ScriptedVerifier {
        async fn verify(&self, email: &str) -> Result<Option<VerificationPayload>, Error> {
            self.calls.lock().unwrap().push(email.to_string());
            self.answers
                .get(email)
                .cloned()
                .unwrap_or_else(|| Ok(Some(payload("valid"))))
        }
    }

    fn payload(status: &str) -> VerificationPayload {
        match json!({"email": {"status": status}, "score": 90}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn plan(emails: Value, max_results: usize) -> RunPlan {
        let input: RunInput = serde_json::from_value(json!({
            "apiKey": "k",
            "apiSecret": "s",
            "emails": emails,
            "maxResults": max_results,
        }))
        .unwrap();
        input.into_plan(50).unwrap()
    }

    fn ctx(verifier: Arc<ScriptedVerifier>) -> (OpsCtx, EventReceiver) {
        let (tx, rx) = channel();
        let ctx = OpsContextBuilder::new()
            .with_verifier(verifier)
            .with_event_sender(tx)
            .build()
            .unwrap();
        (ctx, rx)
    }

    fn gate() -> FixedWindowGate<ManualClock> {
        FixedWindowGate::new(PacingPolicy::default(), ManualClock::new())
    }

    fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(message) = rx.try_recv() {
            events.push(message.event);
        }
        events
    }

    #[tokio::test]
    async fn cap_truncates_remaining_addresses() {
        let verifier = Arc::new(ScriptedVerifier::default());
        let (ctx, mut rx) = ctx(Arc::clone(&verifier));
        let mut sink = MemorySink::new();

        let report = verify_batch(&ctx, &plan(json!(["a@x.com", "b@x.com"]), 1), &mut gate(), &mut sink)
            .await
            .unwrap();

        assert_eq!(verifier.calls(), vec!["a@x.com"]);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].input_display(), "a@x.com");
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.successful, 1);
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            AppEvent::Run(RunEvent::CapReached { max_results: 1, remaining: 1 })
        )));
    }

    #[tokio::test]
    async fn malformed_entry_is_recorded_and_not_counted() {
        let verifier = Arc::new(ScriptedVerifier::default());
        let (ctx, _rx) = ctx(Arc::clone(&verifier));
        let mut sink = MemorySink::new();

        let report = verify_batch(&ctx, &plan(json!(["", "b@x.com"]), 1), &mut gate(), &mut sink)
            .await
            .unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(
            serde_json::to_value(&report.records[0]).unwrap(),
            json!({"input": "invalid", "error": "Invalid email format"})
        );
        assert_eq!(report.records[1].input_display(), "b@x.com");
        assert_eq!(report.records[1].status(), Some("valid"));
        assert_eq!(verifier.calls(), vec!["b@x.com"]);
    }

    #[tokio::test]
    async fn remote_failure_message_is_recorded() {
        let verifier = Arc::new(
            ScriptedVerifier::default().answer("c@x.com", Err(Error::internal("timeout"))),
        );
        let (ctx, _rx) = ctx(Arc::clone(&verifier));
        let mut sink = MemorySink::new();

        let report = verify_batch(&ctx, &plan(json!(["c@x.com", "d@x.com"]), 50), &mut gate(), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&report.records[0]).unwrap(),
            json!({"input": "c@x.com", "error": "timeout"})
        );
        assert!(report.records[1].is_success());
        assert_eq!(report.summary.failed, 1);
    }

    #[tokio::test]
    async fn empty_payload_counts_as_success() {
        let verifier = Arc::new(
            ScriptedVerifier::default().answer("a@x.com", Ok(Some(VerificationPayload::new()))),
        );
        let (ctx, _rx) = ctx(verifier);
        let mut sink = MemorySink::new();

        let report = verify_batch(&ctx, &plan(json!(["a@x.com"]), 50), &mut gate(), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&report.records[0]).unwrap(),
            json!({"input": "a@x.com"})
        );
        assert_eq!(report.summary.successful, 1);
        assert_eq!(report.summary.failed, 0);
    }

    #[tokio::test]
    async fn throttled_remote_raises_warning() {
        let verifier = Arc::new(ScriptedVerifier::default().answer(
            "a@x.com",
            Err(NetworkError::RateLimited { seconds: Some(30) }.into()),
        ));
        let (ctx, mut rx) = ctx(verifier);
        let mut sink = MemorySink::new();

        let report = verify_batch(&ctx, &plan(json!(["a@x.com"]), 50), &mut gate(), &mut sink)
            .await
            .unwrap();

        assert!(!report.records[0].is_success());
        assert!(drain(&mut rx)
            .iter()
            .any(|event| matches!(event, AppEvent::General(GeneralEvent::Warning { .. }))));
    }

    #[tokio::test]
    async fn remote_failures_count_toward_cap() {
        let verifier = Arc::new(
            ScriptedVerifier::default()
                .answer("a@x.com", Err(Error::internal("")))
                .answer("b@x.com", Ok(None)),
        );
        let (ctx, _rx) = ctx(Arc::clone(&verifier));
        let mut sink = MemorySink::new();

        let report = verify_batch(
            &ctx,
            &plan(json!(["a@x.com", "b@x.com", "c@x.com"]), 2),
            &mut gate(),
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(verifier.calls(), vec!["a@x.com", "b@x.com"]);
        assert_eq!(report.records[0].error(), Some("Unknown error"));
        assert_eq!(report.records[1].error(), Some(NO_VERIFICATION_DATA));
        assert_eq!(report.summary.failed, 2);
    }

    #[tokio::test]
    async fn batch_is_pushed_once() {
        let verifier = Arc::new(ScriptedVerifier::default());
        let (ctx, mut rx) = ctx(verifier);
        let mut sink = MemorySink::new();

        verify_batch(&ctx, &plan(json!(["a@x.com", 7, "b@x.com"]), 50), &mut gate(), &mut sink)
            .await
            .unwrap();

        assert_eq!(sink.batches().len(), 1);
        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.records()[1].input, json!(7));

        let events = drain(&mut rx);
        assert!(matches!(events.first(), Some(AppEvent::Run(RunEvent::Started { total: 3, .. }))));
        assert!(matches!(events.last(), Some(AppEvent::Run(RunEvent::Completed { .. }))));
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Run(RunEvent::BatchEmitted { count: 3, .. })
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::General(GeneralEvent::DebugLog { message }) if message == "pushing 3 records to memory"
        )));
    }

    #[tokio::test]
    async fn nothing_pushed_when_no_records() {
        let (tx, _rx) = channel();
        let (handle, signal) = cancel_pair();
        let ctx = OpsContextBuilder::new()
            .with_verifier(Arc::new(ScriptedVerifier::default()))
            .with_event_sender(tx)
            .with_cancel(signal)
            .build()
            .unwrap();
        handle.cancel();
        let mut sink = MemorySink::new();

        let report = verify_batch(&ctx, &plan(json!(["a@x.com"]), 50), &mut gate(), &mut sink)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(report.records.is_empty());
        assert!(sink.batches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_pacing_wait_keeps_partial_results() {
        let (tx, _rx) = channel();
        let (handle, signal) = cancel_pair();
        let ctx = OpsContextBuilder::new()
            .with_verifier(Arc::new(ScriptedVerifier::default()))
            .with_event_sender(tx)
            .with_cancel(signal)
            .build()
            .unwrap();
        let mut gate = FixedWindowGate::system(PacingPolicy::new(1, Duration::from_secs(60)));
        let mut sink = MemorySink::new();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            handle.cancel();
        });

        let report = verify_batch(&ctx, &plan(json!(["a@x.com", "b@x.com"]), 50), &mut gate, &mut sink)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.records.len(), 1);
        assert_eq!(sink.records().len(), 1);
        assert!(report.elapsed_ms < 60_000);
    }

    #[tokio::test(start_paused = true)]
    async fn call_past_quota_waits_a_full_window() {
        let emails: Vec<String> = (0..151).map(|i| format!("user{i}@x.com")).collect();
        let verifier = Arc::new(ScriptedVerifier::default());
        let (ctx, _rx) = ctx(Arc::clone(&verifier));
        let mut gate = FixedWindowGate::system(PacingPolicy::new(150, Duration::from_millis(60_000)));
        let mut sink = MemorySink::new();

        let report = verify_batch(&ctx, &plan(json!(emails), 500), &mut gate, &mut sink)
            .await
            .unwrap();

        assert_eq!(verifier.calls().len(), 151);
        assert_eq!(report.summary.successful, 151);
        assert!(report.elapsed_ms >= 60_000);
        assert_eq!(gate.admitted(), 1);
    }

    #[test]
    fn missing_key_aborts_before_any_record() {
        let input: RunInput =
            serde_json::from_value(json!({"apiSecret": "s", "emails": ["a@x.com"]})).unwrap();
        let err = input.into_plan(50).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingField { .. })));
    }

    #[test]
    fn plan_carries_credentials() {
        let plan = plan(json!(["a@x.com"]), 3);
        assert_eq!(plan.credentials, Credentials::new("k", "s"));
    }

    proptest! {
        #[test]
        fn output_never_exceeds_cap_plus_malformed(
            entries in prop::collection::vec(prop::bool::ANY, 1..40),
            max_results in 1usize..10,
        ) {
            let emails: Vec<Value> = entries
                .iter()
                .enumerate()
                .map(|(i, valid)| if *valid { json!(format!("u{i}@x.com")) } else { json!("") })
                .collect();
            let malformed = entries.iter().filter(|valid| !**valid).count();
            let valid = entries.len() - malformed;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let verifier = Arc::new(ScriptedVerifier::default());
            let report = runtime.block_on(async {
                let (ctx, _rx) = ctx(Arc::clone(&verifier));
                let mut sink = MemorySink::new();
                verify_batch(&ctx, &plan(json!(emails), max_results), &mut gate(), &mut sink)
                    .await
                    .unwrap()
            });

            prop_assert!(report.records.len() <= max_results + malformed);
            prop_assert_eq!(verifier.calls().len(), valid.min(max_results));
            for record in &report.records {
                prop_assert!(record.is_success() != record.error().is_some());
            }
        }
    }
}
