//! End-to-end run against a mock verification service

use httpmock::prelude::*;
use mailgate_config::{Config, RunInput};
use mailgate_events::{channel, AppEvent, RunEvent};
use mailgate_net::verifier_from_config;
use mailgate_ops::{
    verify_batch, FixedWindowGate, JsonFileSink, OpsContextBuilder, PacingPolicy,
};
use mailgate_types::RecordFormat;
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::test]
async fn input_file_to_output_file() {
    let server = MockServer::start();
    let valid = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/email-verifier/a@x.com")
            .header("x-tomba-key", "ta_key");
        then.status(200).json_body(json!({
            "data": {"email": {"email": "a@x.com", "status": "valid"}}
        }));
    });
    let rejected = server.mock(|when, then| {
        when.method(GET).path("/v1/email-verifier/b@x.com");
        then.status(400)
            .json_body(json!({"errors": {"status": 400, "message": "Invalid email address"}}));
    });
    let capped = server.mock(|when, then| {
        when.method(GET).path("/v1/email-verifier/c@x.com");
        then.status(200).json_body(json!({"data": null}));
    });

    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("input.json");
    tokio::fs::write(
        &input_path,
        json!({
            "tombaApiKey": "ta_key",
            "tombaApiSecret": "ts_secret",
            "emails": ["a@x.com", null, "b@x.com", "c@x.com"],
            "maxResults": 2
        })
        .to_string(),
    )
    .await
    .unwrap();

    let mut config = Config::default();
    config.api.base_url = server.base_url();

    let plan = RunInput::load(&input_path)
        .await
        .unwrap()
        .into_plan(config.run.default_max_results)
        .unwrap();
    let verifier = verifier_from_config(&config, &plan.credentials).unwrap();

    let (tx, mut rx) = channel();
    let ctx = OpsContextBuilder::new()
        .with_verifier(Arc::new(verifier))
        .with_event_sender(tx.clone())
        .build()
        .unwrap();
    let mut gate = FixedWindowGate::system(PacingPolicy::from_config(&config)).with_events(tx);
    let output = dir.path().join("records.json");
    let mut sink = JsonFileSink::new(&output, RecordFormat::Json);

    let report = verify_batch(&ctx, &plan, &mut gate, &mut sink).await.unwrap();

    valid.assert();
    rejected.assert();
    capped.assert_hits(0);

    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.successful, 1);
    assert_eq!(report.summary.failed, 2);

    let written: Value =
        serde_json::from_str(&tokio::fs::read_to_string(&output).await.unwrap()).unwrap();
    assert_eq!(
        written,
        json!([
            {"email": {"email": "a@x.com", "status": "valid"}, "input": "a@x.com"},
            {"input": "invalid", "error": "Invalid email format"},
            {"input": "b@x.com", "error": "Invalid email address"}
        ])
    );

    drop(ctx);
    drop(gate);
    let mut completed = false;
    while let Some(message) = rx.recv().await {
        assert_eq!(
            message.meta.run_id == Some(report.run_id),
            !matches!(message.event, AppEvent::Pacing(_))
        );
        if matches!(message.event, AppEvent::Run(RunEvent::Completed { .. })) {
            completed = true;
        }
    }
    assert!(completed);
}
