// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Delivery submitter: builds the immutable delivery request from the form
// and posts it to `POST /api/scan` as multipart:
//
//   file     binary, filename `scan.jpg`, image/jpeg
//   consent  "true" / "false"
//   emails   comma-joined, primary first
//   phone    E.164, only when given

use std::sync::Arc;

use livescan_bridge::traits::NativeHaptics;
use livescan_core::consent::ConsentGate;
use livescan_core::error::{LiveScanError, Result};
use livescan_core::types::{CapturedImage, DeliveryRequest, DeliveryResult, UPLOAD_FILENAME};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::api::{self, ApiClient};

/// One short pulse.
pub const SUCCESS_PATTERN: &[u64] = &[50];
/// Three short pulses.
pub const ERROR_PATTERN: &[u64] = &[50, 50, 50, 50, 50];

/// Shown when the service rejects a delivery without a `detail`.
pub const GENERIC_DELIVERY_ERROR: &str = "Failed to send your form. Please try again.";

/// Success body of `POST /api/scan`. Everything but `sms.enabled` is ignored.
#[derive(Debug, Default, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    sms: Option<SmsStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct SmsStatus {
    #[serde(default)]
    enabled: bool,
}

pub struct DeliverySubmitter {
    api: ApiClient,
    haptics: Arc<dyn NativeHaptics>,
}

impl DeliverySubmitter {
    pub fn new(api: ApiClient, haptics: Arc<dyn NativeHaptics>) -> Self {
        Self { api, haptics }
    }

    /// Snapshot the form into a [`DeliveryRequest`].
    ///
    /// `extra_emails_raw` is split on commas, trimmed, and emptied entries are
    /// dropped. Order and duplicates are preserved; addresses are not
    /// syntax-checked here, the service is the authority on that. A blank
    /// `phone` means no SMS channel.
    pub fn build_request(
        image: CapturedImage,
        primary_email: &str,
        extra_emails_raw: &str,
        phone: &str,
        sms_consent: bool,
    ) -> Result<DeliveryRequest> {
        let primary = primary_email.trim();
        if primary.is_empty() {
            return Err(LiveScanError::NoRecipients);
        }

        let recipients: Vec<String> = std::iter::once(primary)
            .chain(extra_emails_raw.split(',').map(str::trim))
            .filter(|email| !email.is_empty())
            .map(str::to_owned)
            .collect();

        let phone = phone.trim();
        let has_phone = !phone.is_empty();
        let consent_flag = ConsentGate::resolve_transmitted_consent(has_phone, sms_consent);

        DeliveryRequest::new(
            image,
            recipients,
            has_phone.then(|| phone.to_owned()),
            consent_flag,
        )
    }

    /// Send `request` and record what the service actually delivered.
    ///
    /// Plays the success pattern on success and the error pattern on any
    /// failure.
    #[instrument(
        skip(self, request),
        fields(
            digest = %request.image().digest(),
            recipients = request.recipients().len(),
            phone = request.phone().is_some(),
        )
    )]
    pub async fn submit(&self, request: &DeliveryRequest) -> Result<DeliveryResult> {
        match self.send(request).await {
            Ok(result) => {
                self.haptics.vibrate(SUCCESS_PATTERN);
                Ok(result)
            }
            Err(err) => {
                error!(error = %err, "delivery failed");
                self.haptics.vibrate(ERROR_PATTERN);
                Err(err)
            }
        }
    }

    async fn send(&self, request: &DeliveryRequest) -> Result<DeliveryResult> {
        let file = Part::bytes(request.image().jpeg_bytes().to_vec())
            .file_name(UPLOAD_FILENAME)
            .mime_str("image/jpeg")
            .map_err(api::transport_error)?;

        let mut form = Form::new()
            .part("file", file)
            .text("consent", request.consent_flag().to_string())
            .text("emails", request.recipients().join(","));
        if let Some(phone) = request.phone() {
            form = form.text("phone", phone.to_owned());
        }

        info!("submitting scan for delivery");
        let response = self
            .api
            .http()
            .post(self.api.endpoint("/api/scan"))
            .multipart(form)
            .send()
            .await
            .map_err(api::transport_error)?;

        if !response.status().is_success() {
            let message = api::error_detail(response, GENERIC_DELIVERY_ERROR).await;
            return Err(LiveScanError::Delivery(message));
        }

        let body = response.bytes().await.map_err(api::transport_error)?;
        let parsed = serde_json::from_slice::<ScanResponse>(&body).unwrap_or_else(|err| {
            warn!(error = %err, "unreadable delivery response, assuming no SMS");
            ScanResponse::default()
        });

        let sms_enabled = parsed.sms.is_some_and(|sms| sms.enabled);
        let result = DeliveryResult {
            sent_emails: request.recipients().to_vec(),
            sent_phone: if sms_enabled {
                request.phone().map(str::to_owned)
            } else {
                None
            },
            sms_enabled,
        };
        info!(
            emails = result.sent_emails.len(),
            sms_enabled, "delivery accepted"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> CapturedImage {
        CapturedImage::new(vec![0xFF, 0xD8, 0xFF, 0xD9], 3, 4, "digest".into())
    }

    #[test]
    fn extra_emails_are_split_trimmed_and_ordered() {
        let request = DeliverySubmitter::build_request(
            image(),
            "a@x.com",
            " b@x.com, ,c@x.com ,, a@x.com",
            "",
            false,
        )
        .unwrap();
        assert_eq!(
            request.recipients(),
            ["a@x.com", "b@x.com", "c@x.com", "a@x.com"]
        );
    }

    #[test]
    fn no_phone_sends_affirmative_consent() {
        let request =
            DeliverySubmitter::build_request(image(), "a@x.com", "", "", false).unwrap();
        assert!(request.consent_flag());
        assert_eq!(request.phone(), None);
    }

    #[test]
    fn phone_carries_sms_consent() {
        let request =
            DeliverySubmitter::build_request(image(), "a@x.com", "", "+15551234567", false)
                .unwrap();
        assert!(!request.consent_flag());
        assert_eq!(request.phone(), Some("+15551234567"));
    }

    #[test]
    fn missing_primary_email_is_rejected() {
        let result = DeliverySubmitter::build_request(image(), "  ", "b@x.com", "", true);
        assert!(matches!(result, Err(LiveScanError::NoRecipients)));
    }
}
