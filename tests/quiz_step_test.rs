mod common;

use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

use common::*;
use quiz_chain_solver::infrastructure::SubmissionResponse;
use quiz_chain_solver::{FailureKind, StepCtx, StepError, StepLimits};

fn ctx(url: &str) -> StepCtx {
    StepCtx::new(
        "T0001".to_string(),
        1,
        url.to_string(),
        Instant::now() + Duration::from_secs(170),
    )
}

#[tokio::test]
async fn test_correct_answer_yields_outcome() {
    let fakes = Fakes::new(
        FakeFetcher::default().page(&quiz("1"), "question"),
        FakeCompleter::default().reply(&quiz("1"), llm_reply(json!("blue whale"))),
        FakeSubmitter::default().respond(&quiz("1"), graded(true, Some(&quiz("2")))),
    );

    let outcome = assert_ok!(fakes.step().execute(&ctx(&quiz("1")), &credentials()).await);

    assert!(outcome.correct);
    assert_eq!(outcome.next_url, Some(quiz("2")));
    assert_eq!(fakes.submitter.submitted()[0].1["answer"], json!("blue whale"));
}

#[tokio::test]
async fn test_fetch_failure_skips_completion() {
    let fakes = Fakes::new(
        FakeFetcher::default(),
        FakeCompleter::default().reply(&quiz("1"), llm_reply(json!(1))),
        FakeSubmitter::default(),
    );

    let err = assert_err!(fakes.step().execute(&ctx(&quiz("1")), &credentials()).await);

    assert!(matches!(err, StepError::FetchFailed(_)));
    assert_eq!(err.kind(), FailureKind::Transport);
    assert_eq!(fakes.completer.calls(), 0);
    assert!(fakes.submitter.submitted().is_empty());
}

#[tokio::test]
async fn test_unparseable_solution_is_never_submitted() {
    let fakes = Fakes::new(
        FakeFetcher::default().page(&quiz("1"), "question"),
        FakeCompleter::default().reply(&quiz("1"), "The answer is probably 7."),
        FakeSubmitter::default().respond(&quiz("1"), graded(true, None)),
    );

    let err = assert_err!(fakes.step().execute(&ctx(&quiz("1")), &credentials()).await);

    assert_eq!(err.kind(), FailureKind::Parse);
    assert!(fakes.submitter.submitted().is_empty());
}

#[tokio::test]
async fn test_missing_answer_is_a_validation_failure() {
    let fakes = Fakes::new(
        FakeFetcher::default().page(&quiz("1"), "question"),
        FakeCompleter::default().reply(
            &quiz("1"),
            json!({ "submit_url": SUBMIT_URL, "answer": null }).to_string(),
        ),
        FakeSubmitter::default(),
    );

    let err = assert_err!(fakes.step().execute(&ctx(&quiz("1")), &credentials()).await);

    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(fakes.submitter.submitted().is_empty());
}

#[tokio::test]
async fn test_oversized_payload_makes_no_network_call() {
    let fakes = Fakes::new(
        FakeFetcher::default().page(&quiz("1"), "question"),
        FakeCompleter::default().reply(&quiz("1"), llm_reply(json!("x".repeat(4096)))),
        FakeSubmitter::default().respond(&quiz("1"), graded(true, None)),
    );
    let limits = StepLimits {
        max_payload_bytes: 1024,
        ..StepLimits::default()
    };

    let err = assert_err!(
        fakes
            .step_with(limits)
            .execute(&ctx(&quiz("1")), &credentials())
            .await
    );

    assert!(matches!(err, StepError::PayloadTooLarge { limit: 1024, .. }));
    assert!(fakes.submitter.submitted().is_empty());
}

#[tokio::test]
async fn test_error_status_with_text_body_is_rejected() {
    let fakes = Fakes::new(
        FakeFetcher::default().page(&quiz("1"), "question"),
        FakeCompleter::default().reply(&quiz("1"), llm_reply(json!(1))),
        FakeSubmitter::default().respond(
            &quiz("1"),
            SubmissionResponse {
                status: 500,
                body: "Internal Server Error".to_string(),
            },
        ),
    );

    let outcome = assert_ok!(fakes.step().execute(&ctx(&quiz("1")), &credentials()).await);

    assert!(!outcome.correct);
    assert_eq!(outcome.next_url, None);
    assert_eq!(
        outcome.reason.as_deref(),
        Some("HTTP 500: Internal Server Error")
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetch_is_cut_at_deadline() {
    let fakes = Fakes::new(
        FakeFetcher::default().slow_page(&quiz("1"), "question", Duration::from_secs(20)),
        FakeCompleter::default().reply(&quiz("1"), llm_reply(json!(1))),
        FakeSubmitter::default(),
    );
    let ctx = StepCtx::new(
        "T0002".to_string(),
        1,
        quiz("1"),
        Instant::now() + Duration::from_secs(5),
    );
    let started = Instant::now();

    let err = assert_err!(fakes.step().execute(&ctx, &credentials()).await);

    assert!(matches!(err, StepError::FetchFailed(_)));
    assert!(started.elapsed() < Duration::from_secs(6));
    assert_eq!(fakes.completer.calls(), 0);
}
