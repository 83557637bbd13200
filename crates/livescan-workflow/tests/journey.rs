// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end journeys against a mock delivery service.

use std::sync::Arc;
use std::time::Duration;

use livescan_bridge::mock::MockBridge;
use livescan_bridge::traits::{NativeCamera, NativeFileSaver, NativeHaptics};
use livescan_client::{ApiClient, DeliverySubmitter, DownloadVerifier};
use livescan_core::error::LiveScanError;
use livescan_workflow::{
    BackTarget, INTERRUPTED_DELIVERY, SimulationOutcome, WorkflowState, WorkflowStateMachine,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn machine(server: &MockServer, bridge: &Arc<MockBridge>) -> WorkflowStateMachine {
    let submitter = DeliverySubmitter::new(
        ApiClient::new(&server.uri()).unwrap(),
        Arc::clone(bridge) as Arc<dyn NativeHaptics>,
    );
    WorkflowStateMachine::new(Arc::clone(bridge) as Arc<dyn NativeCamera>, submitter)
}

fn verifier(server: &MockServer, bridge: &Arc<MockBridge>, token: &str) -> DownloadVerifier {
    DownloadVerifier::new(
        ApiClient::new(&server.uri()).unwrap(),
        Arc::clone(bridge) as Arc<dyn NativeFileSaver>,
        Arc::clone(bridge) as Arc<dyn NativeHaptics>,
        token,
    )
}

/// Capture, consent and run processing on a paused clock.
async fn reach_delivery_form(flow: &mut WorkflowStateMachine) {
    flow.capture().unwrap();
    flow.set_document_consent(true).unwrap();

    tokio::time::pause();
    flow.confirm().unwrap();
    let outcome = flow.wait_for_processing().await.unwrap();
    tokio::time::resume();

    assert_eq!(outcome, SimulationOutcome::Completed);
    assert_eq!(flow.state(), WorkflowState::DeliveryForm);
}

async fn mount_scan(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/scan"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn email_only_journey_succeeds_without_sms() {
    let server = MockServer::start().await;
    mount_scan(&server, 200, json!({ "status": "success" })).await;

    let bridge = Arc::new(MockBridge::new(640, 480));
    let mut flow = machine(&server, &bridge);
    reach_delivery_form(&mut flow).await;

    flow.form_mut().primary_email = "a@x.com".into();
    assert!(flow.can_submit());
    assert!(!flow.required_consents().sms_consent_required);

    let result = flow.submit().await.unwrap();
    assert_eq!(flow.state(), WorkflowState::ResultSuccess);
    assert_eq!(result.sent_emails, ["a@x.com"]);
    assert_eq!(result.sent_phone, None);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body).into_owned();
    assert!(body.contains("name=\"consent\"\r\n\r\ntrue"));
    assert!(!body.contains("name=\"phone\""));

    flow.done().unwrap();
    assert_eq!(flow.state(), WorkflowState::Capture);
    assert!(flow.image().is_none());
    assert!(flow.result().is_none());
    assert_eq!(flow.form().primary_email, "");
}

#[tokio::test]
async fn sms_journey_reports_sent_phone() {
    let server = MockServer::start().await;
    mount_scan(&server, 200, json!({ "sms": { "enabled": true } })).await;

    let bridge = Arc::new(MockBridge::new(640, 480));
    let mut flow = machine(&server, &bridge);
    reach_delivery_form(&mut flow).await;

    let form = flow.form_mut();
    form.primary_email = "a@x.com".into();
    form.extra_emails = "b@x.com".into();
    form.phone = "+15551234567".into();
    form.sms_consent = true;

    let result = flow.submit().await.unwrap();
    assert_eq!(result.sent_emails, ["a@x.com", "b@x.com"]);
    assert_eq!(result.sent_phone.as_deref(), Some("+15551234567"));
    assert!(flow.consent().sms_consent);
}

#[tokio::test]
async fn failed_delivery_can_be_retried_with_form_intact() {
    let server = MockServer::start().await;
    mount_scan(&server, 502, json!({ "detail": "Mail relay unavailable" })).await;

    let bridge = Arc::new(MockBridge::new(640, 480));
    let mut flow = machine(&server, &bridge);
    reach_delivery_form(&mut flow).await;
    flow.form_mut().primary_email = "a@x.com".into();

    let err = flow.submit().await.unwrap_err();
    assert!(matches!(err, LiveScanError::Delivery(_)));
    assert_eq!(flow.state(), WorkflowState::ResultFailure);
    assert_eq!(flow.last_error(), Some("Mail relay unavailable"));

    flow.retry().unwrap();
    assert_eq!(flow.state(), WorkflowState::DeliveryForm);
    assert_eq!(flow.form().primary_email, "a@x.com");
    assert!(flow.can_submit());

    mount_scan(&server, 200, json!({})).await;
    flow.submit().await.unwrap();
    assert_eq!(flow.state(), WorkflowState::ResultSuccess);
}

#[tokio::test]
async fn failed_delivery_back_targets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scan"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(640, 480));
    let mut flow = machine(&server, &bridge);
    reach_delivery_form(&mut flow).await;
    flow.form_mut().primary_email = "a@x.com".into();
    flow.submit().await.unwrap_err();

    flow.back(BackTarget::Review).unwrap();
    assert_eq!(flow.state(), WorkflowState::Review);
    assert!(flow.image().is_some());

    flow.confirm().unwrap();
    flow.cancel_processing().unwrap();
    flow.retake().unwrap();
    assert_eq!(flow.state(), WorkflowState::Capture);
    assert!(flow.image().is_none());
}

#[tokio::test]
async fn rejected_pin_keeps_redemption_screen_open() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download/verify"))
        .and(body_json(json!({ "token": "abc123", "pin": "0000" })))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "detail": "Invalid PIN" })))
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(640, 480));
    let mut flow = machine(&server, &bridge);
    flow.open_redemption(verifier(&server, &bridge, "abc123")).unwrap();

    assert!(flow.verify_pin("0000").await.is_err());
    assert_eq!(flow.state(), WorkflowState::DownloadVerify);

    let screen = flow.verifier_mut().unwrap();
    assert_eq!(screen.pin(), "");
    assert_eq!(screen.error(), Some("Invalid PIN"));
    assert!(screen.take_shake());

    flow.leave_redemption().unwrap();
    assert_eq!(flow.state(), WorkflowState::Capture);
}

#[tokio::test]
async fn accepted_pin_saves_artifact_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(640, 480));
    let mut flow = machine(&server, &bridge);
    flow.open_redemption(verifier(&server, &bridge, "tok")).unwrap();

    let artifact = flow.verify_pin("4821").await.unwrap();
    assert_eq!(artifact.size, 8);
    assert_eq!(bridge.saved_files().len(), 1);
    assert_eq!(flow.state(), WorkflowState::DownloadVerify);
}

#[tokio::test]
async fn redemption_waits_for_processing() {
    let server = MockServer::start().await;
    let bridge = Arc::new(MockBridge::new(640, 480));
    let mut flow = machine(&server, &bridge);
    flow.capture().unwrap();
    flow.set_document_consent(true).unwrap();
    flow.confirm().unwrap();

    assert!(matches!(
        flow.open_redemption(verifier(&server, &bridge, "abc123")),
        Err(LiveScanError::Busy)
    ));
    assert_eq!(flow.state(), WorkflowState::Processing);
}

#[tokio::test]
async fn redemption_from_review_resumes_review() {
    let server = MockServer::start().await;
    let bridge = Arc::new(MockBridge::new(640, 480));
    let mut flow = machine(&server, &bridge);
    flow.capture().unwrap();

    flow.open_redemption(verifier(&server, &bridge, "abc123")).unwrap();
    assert!(flow.confirm().is_err());

    flow.leave_redemption().unwrap();
    assert_eq!(flow.state(), WorkflowState::Review);
    assert!(flow.image().is_some());
}

#[tokio::test]
async fn interrupted_delivery_lands_on_failure_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scan"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(640, 480));
    let mut flow = machine(&server, &bridge);
    reach_delivery_form(&mut flow).await;
    flow.form_mut().primary_email = "a@x.com".into();

    let attempt = tokio::time::timeout(Duration::from_millis(100), flow.submit()).await;
    assert!(attempt.is_err());

    assert_eq!(flow.state(), WorkflowState::ResultFailure);
    assert_eq!(flow.last_error(), Some(INTERRUPTED_DELIVERY));

    flow.retry().unwrap();
    assert_eq!(flow.form().primary_email, "a@x.com");
    assert!(flow.can_submit());

    mount_scan(&server, 200, json!({})).await;
    flow.submit().await.unwrap();
    assert_eq!(flow.state(), WorkflowState::ResultSuccess);
}

#[tokio::test]
async fn interrupted_pin_check_can_be_repeated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download/verify"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "detail": "Invalid PIN" }))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(640, 480));
    let mut flow = machine(&server, &bridge);
    flow.open_redemption(verifier(&server, &bridge, "abc123")).unwrap();

    let attempt = tokio::time::timeout(Duration::from_millis(100), flow.verify_pin("0000")).await;
    assert!(attempt.is_err());

    let screen = flow.verifier().unwrap();
    assert!(!screen.is_verifying());
    assert!(screen.can_verify());
    assert!(screen.error().is_none());
}
