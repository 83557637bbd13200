// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people scanning a form on their phone.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The taxonomy uses three severity levels that drive UI presentation.

use crate::error::{CameraError, LiveScanError};
use crate::types::ErrorClass;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, server hiccup so trying again is likely to work.
    Transient,
    /// User must do something (allow the camera, tick a box, re-enter a PIN).
    ActionRequired,
    /// Cannot be fixed on this device or with this link.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether a plain retry makes sense.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable: severity == Severity::Transient,
            severity,
        }
    }
}

/// Classify an error for recovery decisions.
pub fn classify_error(err: &LiveScanError) -> ErrorClass {
    match err {
        LiveScanError::Delivery(_)
        | LiveScanError::Session(_)
        | LiveScanError::Transport(_)
        | LiveScanError::Busy
        | LiveScanError::Io(_) => ErrorClass::Transient,

        LiveScanError::Camera(_)
        | LiveScanError::CameraNotActive
        | LiveScanError::ConsentRequired
        | LiveScanError::SmsConsentRequired
        | LiveScanError::NoRecipients
        | LiveScanError::NoImage
        | LiveScanError::PinRequired
        | LiveScanError::Verification(_)
        | LiveScanError::Config(_) => ErrorClass::UserAction,

        LiveScanError::ImageError(_)
        | LiveScanError::InvalidTransition { .. }
        | LiveScanError::Serialization(_)
        | LiveScanError::Bridge(_)
        | LiveScanError::RuntimeUnavailable => ErrorClass::Permanent,
    }
}

/// Convert a `LiveScanError` into a `HumanError` anyone can understand.
pub fn humanize_error(err: &LiveScanError) -> HumanError {
    match err {
        // -- Capture --
        LiveScanError::Camera(CameraError::Denied) => HumanError::new(
            "We don't have permission to use your camera.",
            "Allow camera access for this app in your device settings, then tap Scan again.",
            Severity::ActionRequired,
        ),
        LiveScanError::Camera(CameraError::Unavailable) => HumanError::new(
            "We couldn't find a camera.",
            "Make sure no other app is using the camera, then tap Scan again.",
            Severity::ActionRequired,
        ),
        LiveScanError::CameraNotActive => HumanError::new(
            "The camera isn't switched on.",
            "Tap Scan to start the camera before capturing.",
            Severity::ActionRequired,
        ),
        LiveScanError::ImageError(detail) => HumanError::new(
            "We couldn't process the photo.",
            format!("Please retake the photo. (Detail: {detail})"),
            Severity::Permanent,
        ),

        // -- Workflow guards --
        LiveScanError::ConsentRequired => HumanError::new(
            "Please agree to the consent terms.",
            "Tick the box confirming you have read the terms, then tap Confirm.",
            Severity::ActionRequired,
        ),
        LiveScanError::SmsConsentRequired => HumanError::new(
            "Please agree to receive a text message.",
            "You entered a phone number. Tick the SMS box, or remove the number.",
            Severity::ActionRequired,
        ),
        LiveScanError::NoRecipients => HumanError::new(
            "Please enter an email address.",
            "We need at least one email address to send your form to.",
            Severity::ActionRequired,
        ),
        LiveScanError::NoImage => HumanError::new(
            "There's no photo yet.",
            "Scan your form first.",
            Severity::ActionRequired,
        ),
        LiveScanError::PinRequired => HumanError::new(
            "Please enter your PIN.",
            "The PIN was sent to your phone in a text message.",
            Severity::ActionRequired,
        ),
        LiveScanError::Busy => HumanError::new(
            "Please wait a moment.",
            "We're still working on your last request.",
            Severity::Transient,
        ),
        LiveScanError::InvalidTransition { .. } => HumanError::new(
            "That step isn't available right now.",
            "Go back and continue from the current screen.",
            Severity::Permanent,
        ),

        // -- Remote service --
        LiveScanError::Delivery(detail) => HumanError::new(
            "We couldn't send your form.",
            format!("Tap Retry to try again. ({detail})"),
            Severity::Transient,
        ),
        LiveScanError::Verification(detail) => HumanError::new(
            "We couldn't unlock your document.",
            detail.clone(),
            Severity::ActionRequired,
        ),
        LiveScanError::Session(_) => HumanError::new(
            "We couldn't start a secure session.",
            "Check your internet connection and try again.",
            Severity::Transient,
        ),
        LiveScanError::Transport(_) => HumanError::new(
            "We couldn't reach the server.",
            "Check your internet connection and try again.",
            Severity::Transient,
        ),

        // -- Configuration / storage --
        LiveScanError::Config(detail) => HumanError::new(
            "The app isn't set up correctly.",
            format!("Check the service address in the settings. ({detail})"),
            Severity::ActionRequired,
        ),
        LiveScanError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "We don't have permission to save the file.",
                "Choose a different folder to save into.",
                Severity::ActionRequired,
            ),
            _ => HumanError::new(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, your device's storage may be full.",
                Severity::Transient,
            ),
        },
        LiveScanError::Serialization(_) => HumanError::new(
            "The app had an internal data problem.",
            "Try again. If this keeps happening, please report it.",
            Severity::Permanent,
        ),

        // -- Platform --
        LiveScanError::Bridge(_) => HumanError::new(
            "A device-specific feature didn't work.",
            "Try restarting the app. Some features may not be available on all devices.",
            Severity::Permanent,
        ),
        LiveScanError::RuntimeUnavailable => HumanError::new(
            "Live Scan couldn't start processing your photo.",
            "This is a bug in the app. Please restart it and try again.",
            Severity::Permanent,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_denied_is_action_required() {
        let human = humanize_error(&LiveScanError::Camera(CameraError::Denied));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn delivery_failure_offers_retry() {
        let human = humanize_error(&LiveScanError::Delivery("Consent is required".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
        assert!(human.suggestion.contains("Consent is required"));
    }

    #[test]
    fn verification_detail_is_shown_verbatim() {
        let err = LiveScanError::Verification("Invalid PIN. 2 attempt(s) remaining.".into());
        assert_eq!(err.to_string(), "Invalid PIN. 2 attempt(s) remaining.");
        assert_eq!(
            humanize_error(&err).suggestion,
            "Invalid PIN. 2 attempt(s) remaining."
        );
    }

    #[test]
    fn classification_matches_recoverability() {
        assert_eq!(
            classify_error(&LiveScanError::Transport("reset".into())),
            ErrorClass::Transient
        );
        assert_eq!(
            classify_error(&LiveScanError::Camera(CameraError::Unavailable)),
            ErrorClass::UserAction
        );
        assert_eq!(
            classify_error(&LiveScanError::RuntimeUnavailable),
            ErrorClass::Permanent
        );
    }
}
