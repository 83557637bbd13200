// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Live Scan capture and delivery journey.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LiveScanError, Result};

/// Target portrait aspect ratio (width / height) of every captured image.
pub const TARGET_ASPECT_RATIO: f64 = 3.0 / 4.0;

/// JPEG quality used when encoding a captured image.
pub const JPEG_QUALITY: u8 = 90;

/// Filename of the image part in a delivery submission.
pub const UPLOAD_FILENAME: &str = "scan.jpg";

/// Filename under which a redeemed artifact is saved.
pub const DOWNLOAD_FILENAME: &str = "LiveScanForm.pdf";

/// Unique identifier for a single capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureId(pub Uuid);

impl CaptureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaptureId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaptureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which way the requested camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraFacing {
    /// Rear camera, pointed at the document.
    Environment,
    /// Front (selfie) camera.
    User,
}

/// One uncompressed frame read from a live camera stream.
#[derive(Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// The aspect-normalised, JPEG-encoded result of a single capture.
///
/// Immutable once created; clones share the same encoded buffer.
#[derive(Clone)]
pub struct CapturedImage {
    id: CaptureId,
    jpeg: Arc<[u8]>,
    width: u32,
    height: u32,
    /// SHA-256 hex digest of the JPEG bytes.
    digest: String,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn new(jpeg: Vec<u8>, width: u32, height: u32, digest: String) -> Self {
        Self {
            id: CaptureId::new(),
            jpeg: Arc::from(jpeg),
            width,
            height,
            digest,
            captured_at: Utc::now(),
        }
    }

    pub fn id(&self) -> CaptureId {
        self.id
    }

    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.jpeg.len())
            .field("digest", &self.digest)
            .finish()
    }
}

/// The two consent checkboxes of the journey.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Agreement to share the sensitive document. Gates entry to processing.
    pub document_consent: bool,
    /// Opt-in to SMS delivery. Only meaningful when a phone number is given.
    pub sms_consent: bool,
}

/// Kinds of consent receipt the delivery service can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentKind {
    Document,
    Sms,
}

impl ConsentKind {
    /// Path segment under `/api/consent/`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Sms => "sms",
        }
    }
}

/// Immutable snapshot sent to the delivery service.
///
/// Built once per submission. Later edits to the delivery form produce a new
/// request; they never touch one that is already in flight.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    image: CapturedImage,
    recipients: Vec<String>,
    phone: Option<String>,
    consent_flag: bool,
}

impl DeliveryRequest {
    /// Assemble a request, rejecting an empty recipient list.
    ///
    /// A blank `phone` is treated as absent.
    pub fn new(
        image: CapturedImage,
        recipients: Vec<String>,
        phone: Option<String>,
        consent_flag: bool,
    ) -> Result<Self> {
        if recipients.is_empty() {
            return Err(LiveScanError::NoRecipients);
        }
        let phone = phone
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty());
        Ok(Self {
            image,
            recipients,
            phone,
            consent_flag,
        })
    }

    pub fn image(&self) -> &CapturedImage {
        &self.image
    }

    /// Recipients in submission order, primary first.
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn consent_flag(&self) -> bool {
        self.consent_flag
    }
}

/// What the delivery service actually sent, recorded after a success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub sent_emails: Vec<String>,
    pub sent_phone: Option<String>,
    pub sms_enabled: bool,
}

/// A single redemption attempt: the link token and the PIN typed by the user.
#[derive(Clone, Serialize)]
pub struct DownloadSession {
    pub token: String,
    #[serde(rename = "pin")]
    pub pin_attempt: String,
}

impl std::fmt::Debug for DownloadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadSession")
            .field("token", &self.token)
            .field("pin_attempt", &"<redacted>")
            .finish()
    }
}

/// Classification of errors for recovery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Network blip or server hiccup; safe to offer a plain retry.
    Transient,
    /// User must act first (grant camera access, tick a box, fix the PIN).
    UserAction,
    /// Retrying will not help on this device or with this input.
    Permanent,
}
