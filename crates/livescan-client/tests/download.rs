// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use livescan_bridge::mock::MockBridge;
use livescan_bridge::traits::{NativeFileSaver, NativeHaptics};
use livescan_client::delivery::ERROR_PATTERN;
use livescan_client::download::GENERIC_PIN_ERROR;
use livescan_client::{ApiClient, DownloadVerifier};
use livescan_core::error::LiveScanError;
use livescan_core::types::DOWNLOAD_FILENAME;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn verifier(base: &str, bridge: &Arc<MockBridge>, token: &str) -> DownloadVerifier {
    DownloadVerifier::new(
        ApiClient::new(base).expect("client"),
        Arc::clone(bridge) as Arc<dyn NativeFileSaver>,
        Arc::clone(bridge) as Arc<dyn NativeHaptics>,
        token,
    )
}

#[tokio::test]
async fn wrong_pin_clears_input_and_shakes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download/verify"))
        .and(body_json(json!({ "token": "abc123", "pin": "0000" })))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "detail": "Invalid PIN" })))
        .expect(1)
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(4, 4));
    let mut screen = verifier(&server.uri(), &bridge, "abc123");
    screen.set_pin("0000");

    let err = screen.verify().await.unwrap_err();
    assert!(matches!(err, LiveScanError::Verification(ref m) if m == "Invalid PIN"));
    assert_eq!(screen.pin(), "");
    assert_eq!(screen.error(), Some("Invalid PIN"));
    assert!(screen.take_shake());
    assert!(!screen.take_shake());
    assert!(!screen.is_verifying());
    assert_eq!(bridge.vibrations(), vec![ERROR_PATTERN.to_vec()]);
    assert!(bridge.saved_files().is_empty());

    // Screen stays usable for another attempt.
    screen.set_pin("1234");
    assert!(screen.can_verify());
}

#[tokio::test]
async fn server_detail_is_shown_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download/verify"))
        .respond_with(
            ResponseTemplate::new(410).set_body_json(json!({ "detail": "This link has expired" })),
        )
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(4, 4));
    let mut screen = verifier(&server.uri(), &bridge, "abc123");
    screen.set_pin("4821");

    assert!(screen.verify().await.is_err());
    assert_eq!(screen.error(), Some("This link has expired"));
}

#[tokio::test]
async fn rejection_without_body_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download/verify"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(4, 4));
    let mut screen = verifier(&server.uri(), &bridge, "abc123");
    screen.set_pin("0000");

    assert!(screen.verify().await.is_err());
    assert_eq!(screen.error(), Some(GENERIC_PIN_ERROR));
}

#[tokio::test]
async fn correct_pin_saves_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download/verify"))
        .and(body_json(json!({ "token": "tok-9", "pin": "4821" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.7 livescan".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(4, 4));
    let mut screen = verifier(&server.uri(), &bridge, "tok-9");
    screen.set_pin("4821");

    let artifact = screen.verify().await.unwrap();
    assert_eq!(artifact.path, PathBuf::from(DOWNLOAD_FILENAME));
    assert_eq!(artifact.size, 17);
    assert!(screen.error().is_none());
    assert!(!screen.take_shake());
    assert!(bridge.vibrations().is_empty());

    let saved = bridge.saved_files();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].filename, DOWNLOAD_FILENAME);
    assert_eq!(saved[0].bytes, b"%PDF-1.7 livescan");
    assert!(!saved[0].source.exists());
}

#[tokio::test]
async fn unreachable_service_clears_pin() {
    let bridge = Arc::new(MockBridge::new(4, 4));
    let mut screen = verifier("http://127.0.0.1:1", &bridge, "abc123");
    screen.set_pin("0000");

    let err = screen.verify().await.unwrap_err();
    assert!(matches!(err, LiveScanError::Transport(_)));
    assert_eq!(screen.pin(), "");
    assert!(screen.error().is_some());
    assert!(screen.take_shake());
}

#[tokio::test]
async fn failed_save_is_reported_inline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(4, 4));
    bridge.set_fail_saves(true);
    let mut screen = verifier(&server.uri(), &bridge, "abc123");
    screen.set_pin("4821");

    assert!(matches!(
        screen.verify().await,
        Err(LiveScanError::Bridge(_))
    ));
    assert!(screen.error().is_some());

    // The PIN was accepted, so nothing asks for it again.
    assert_eq!(screen.pin(), "4821");
    assert!(!screen.take_shake());
    assert!(bridge.vibrations().is_empty());
}

#[tokio::test]
async fn abandoned_attempt_leaves_screen_usable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download/verify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF".to_vec())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let bridge = Arc::new(MockBridge::new(4, 4));
    let mut screen = verifier(&server.uri(), &bridge, "abc123");
    screen.set_pin("4821");

    let attempt = tokio::time::timeout(Duration::from_millis(100), screen.verify()).await;
    assert!(attempt.is_err());

    assert!(!screen.is_verifying());
    assert!(screen.can_verify());
    assert_eq!(screen.pin(), "4821");
    assert!(bridge.saved_files().is_empty());
}
