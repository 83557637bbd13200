// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Live Scan.

use thiserror::Error;

/// Why the camera could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    Denied,

    #[error("no camera available")]
    Unavailable,
}

/// Top-level error type for all Live Scan operations.
#[derive(Debug, Error)]
pub enum LiveScanError {
    // -- Capture errors --
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("camera is not active")]
    CameraNotActive,

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Workflow guards --
    #[error("document consent is required")]
    ConsentRequired,

    #[error("SMS consent is required when a phone number is given")]
    SmsConsentRequired,

    #[error("at least one email address is required")]
    NoRecipients,

    #[error("no image has been captured")]
    NoImage,

    #[error("a PIN is required")]
    PinRequired,

    #[error("another operation is already in progress")]
    Busy,

    #[error("cannot {action} while in state {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    // -- Remote service errors --
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("{0}")]
    Verification(String),

    #[error("session request failed: {0}")]
    Session(String),

    #[error("network error: {0}")]
    Transport(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("background work needs a running tokio runtime")]
    RuntimeUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LiveScanError>;
