mod common;

use common::*;
use rstest::rstest;
use serde_json::json;

use yew_secure_fields::analytics::{PAYMENT_FAILED, PAYMENT_SUBMITTED, THREE_DS_STARTED};
use yew_secure_fields::{
    AttemptId, ChallengeStep, ErrorKind, Navigator, PaymentError, PaymentStatus, SecureFieldsSuccess,
    Settlement, SubmissionState,
};

const ISSUER: &str = "https://issuer/challenge";

/// Submit and receive the redirect, returning the attempt id.
fn start_challenge(checkout: &Checkout) -> AttemptId {
    let id = checkout.submit().unwrap();
    checkout.succeed(json!({ "redirect": ISSUER }));
    id
}

#[rstest]
fn redirect_hands_off_to_challenge_page(ready_checkout: Checkout) {
    let id = start_challenge(&ready_checkout);

    let controller = ready_checkout.controller();
    assert_eq!(controller.state(), SubmissionState::ThreeDsPending);
    assert_eq!(controller.outcome().status, PaymentStatus::Pending);
    assert_eq!(
        controller.attempt().unwrap().redirect.as_deref(),
        Some(ISSUER)
    );
    assert_eq!(
        *ready_checkout.navigator.visited.borrow(),
        vec![format!(
            "/3ds?attemptId={}&redirect=https%3A%2F%2Fissuer%2Fchallenge",
            id
        )]
    );
    assert_eq!(
        ready_checkout.analytics.names(),
        vec![PAYMENT_SUBMITTED, THREE_DS_STARTED]
    );
}

#[rstest]
fn challenge_page_shows_issuer_then_settles(ready_checkout: Checkout) {
    let id = start_challenge(&ready_checkout);
    ready_checkout.navigator.follow_last();
    let query = ready_checkout.navigator.query();

    // first load: no outcome yet
    let (mut page, _, _) = challenge_page(&query);
    let step = page.resume_from_navigation().unwrap();
    assert_eq!(
        step,
        ChallengeStep::Challenge {
            attempt_id: id.clone(),
            redirect: ISSUER.to_string(),
        }
    );
    assert_eq!(page.state(), SubmissionState::ThreeDsPending);

    // issuer sends the shopper back with the result
    let (mut page, analytics, _) =
        challenge_page(&format!("?{}&status=success&transactionId=tx-3ds", query));
    let ChallengeStep::Settled(report) = page.resume_from_navigation().unwrap() else {
        panic!("expected a settled challenge");
    };
    assert_eq!(report.status, PaymentStatus::Success);
    assert_eq!(report.attempt_id, Some(id));
    assert_eq!(report.transaction_id.as_deref(), Some("tx-3ds"));
    assert_eq!(page.state(), SubmissionState::Settled(Settlement::Success));
    assert_eq!(analytics.names(), vec!["Payment Succeeded"]);
}

#[rstest]
fn synthetic_success_completes_pending_attempt(ready_checkout: Checkout) {
    let id = start_challenge(&ready_checkout);
    ready_checkout.navigator.follow_last();

    let (mut page, _, _) = challenge_page(&ready_checkout.navigator.query());
    page.resume_from_navigation().unwrap();
    page.on_success(SecureFieldsSuccess::with_transaction("tx-late"));

    let report = page.outcome();
    assert_eq!(report.status, PaymentStatus::Success);
    assert_eq!(report.attempt_id, Some(id));
    assert_eq!(report.transaction_id.as_deref(), Some("tx-late"));
}

#[rstest]
#[case::no_query("")]
#[case::empty_id("?attemptId=&redirect=https%3A%2F%2Fissuer")]
#[case::unrelated("?utm_source=mail")]
fn missing_attempt_id_settles_lost_context(#[case] query: &str) {
    let (mut page, analytics, _) = challenge_page(query);

    let ChallengeStep::Settled(report) = page.resume_from_navigation().unwrap() else {
        panic!("expected a settled challenge");
    };
    assert_eq!(report.status, PaymentStatus::Failed);
    let error = report.error.unwrap();
    assert_eq!(error.kind, ErrorKind::LostAttemptContext);
    assert_eq!(error.message, "Payment session was lost, please retry payment.");
    assert_eq!(page.state(), SubmissionState::Settled(Settlement::Failed));
    assert_eq!(analytics.names(), vec![PAYMENT_FAILED]);
}

#[rstest]
#[case::error("status=error&code=auth_failed&message=Authentication%20failed", "auth_failed", "Authentication failed")]
#[case::failed_without_detail("status=failed", "", "3-D Secure authentication failed.")]
#[case::cancelled("status=cancelled", "challenge_cancelled", "3-D Secure authentication failed.")]
#[case::unknown("status=maybe", "unknown_challenge_status", "3-D Secure authentication failed.")]
fn challenge_failure_settles_failed(
    #[case] outcome: &str,
    #[case] code: &str,
    #[case] message: &str,
) {
    let (mut page, _, _) = challenge_page(&format!(
        "?attemptId=a-1&redirect=https%3A%2F%2Fissuer&{}",
        outcome
    ));

    let ChallengeStep::Settled(report) = page.resume_from_navigation().unwrap() else {
        panic!("expected a settled challenge");
    };
    assert_eq!(report.status, PaymentStatus::Failed);
    assert_eq!(report.attempt_id, Some(AttemptId::new("a-1")));
    let error = report.error.unwrap();
    assert_eq!(error.kind, ErrorKind::Widget);
    assert_eq!(error.code.as_deref().unwrap_or(""), code);
    assert_eq!(error.message, message);
}

#[rstest]
fn challenge_success_without_transaction_is_malformed() {
    let (mut page, _, _) = challenge_page("attemptId=a-1&status=success");

    let ChallengeStep::Settled(report) = page.resume_from_navigation().unwrap() else {
        panic!("expected a settled challenge");
    };
    assert_eq!(
        report.error.unwrap().kind,
        ErrorKind::MalformedSuccessResponse
    );
}

#[rstest]
fn attempt_without_redirect_or_outcome_is_malformed() {
    let (mut page, _, _) = challenge_page("?attemptId=a-1");

    let ChallengeStep::Settled(report) = page.resume_from_navigation().unwrap() else {
        panic!("expected a settled challenge");
    };
    assert_eq!(report.attempt_id, Some(AttemptId::new("a-1")));
    assert_eq!(
        report.error.unwrap().kind,
        ErrorKind::MalformedSuccessResponse
    );
}

#[rstest]
fn submit_is_rejected_while_challenge_pending(ready_checkout: Checkout) {
    let id = start_challenge(&ready_checkout);

    let err = ready_checkout.submit().unwrap_err();
    assert_eq!(err, PaymentError::DuplicateSubmission { attempt_id: id });
    assert_eq!(
        ready_checkout.controller().state(),
        SubmissionState::ThreeDsPending
    );
    assert_eq!(ready_checkout.widget.submissions.borrow().len(), 1);
}

#[rstest]
fn error_during_challenge_settles_failed(ready_checkout: Checkout) {
    start_challenge(&ready_checkout);
    ready_checkout.fail(json!({ "message": "Challenge failed", "code": "3ds_failed" }));

    let report = ready_checkout.controller().outcome();
    assert_eq!(report.status, PaymentStatus::Failed);
    assert_eq!(report.error.unwrap().code.as_deref(), Some("3ds_failed"));
}

#[rstest]
fn blocked_navigation_settles_failed(ready_checkout: Checkout) {
    ready_checkout.navigator.fail.set(true);
    start_challenge(&ready_checkout);

    let controller = ready_checkout.controller();
    assert_eq!(controller.state(), SubmissionState::Settled(Settlement::Failed));
    assert_eq!(
        controller.outcome().error.unwrap().kind,
        ErrorKind::Navigation
    );
}

#[rstest]
fn redirect_wins_over_transaction(ready_checkout: Checkout) {
    ready_checkout.submit().unwrap();
    ready_checkout.succeed(json!({ "redirect": ISSUER, "transactionId": "tx" }));

    assert_eq!(
        ready_checkout.controller().state(),
        SubmissionState::ThreeDsPending
    );
    assert_eq!(ready_checkout.navigator.visited.borrow().len(), 1);
}
