// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Download verifier: the redemption screen behind a one-time link.
//
// The user types the PIN from their text message; `{token, pin}` goes to
// `POST /api/download/verify`. A success body *is* the artifact. A rejection
// clears the PIN, shows the service's message and shakes, leaving the screen
// ready for another try. Attempt limits, expiry and single use are enforced
// by the service, never here.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use livescan_bridge::traits::{NativeFileSaver, NativeHaptics};
use livescan_core::error::{LiveScanError, Result};
use livescan_core::human_errors::humanize_error;
use livescan_core::types::{DOWNLOAD_FILENAME, DownloadSession};
use tracing::{info, instrument, warn};

use crate::api::{self, ApiClient};
use crate::delivery::ERROR_PATTERN;

/// Shown when the service rejects a PIN without a `detail`.
pub const GENERIC_PIN_ERROR: &str = "Invalid PIN";

/// Where a redeemed artifact was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemedArtifact {
    pub path: PathBuf,
    pub size: u64,
}

pub struct DownloadVerifier {
    api: ApiClient,
    saver: Arc<dyn NativeFileSaver>,
    haptics: Arc<dyn NativeHaptics>,
    token: String,
    pin: String,
    error: Option<String>,
    verifying: bool,
    shake: bool,
}

impl DownloadVerifier {
    pub fn new(
        api: ApiClient,
        saver: Arc<dyn NativeFileSaver>,
        haptics: Arc<dyn NativeHaptics>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            api,
            saver,
            haptics,
            token: token.into(),
            pin: String::new(),
            error: None,
            verifying: false,
            shake: false,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    pub fn set_pin(&mut self, pin: impl Into<String>) {
        self.pin = pin.into();
    }

    /// Inline error from the last failed attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_verifying(&self) -> bool {
        self.verifying
    }

    /// Whether the download control is enabled.
    pub fn can_verify(&self) -> bool {
        !self.pin.trim().is_empty() && !self.verifying
    }

    /// Returns `true` once after each rejection so the UI can play its shake.
    pub fn take_shake(&mut self) -> bool {
        std::mem::take(&mut self.shake)
    }

    /// Exchange the token and the entered PIN for the artifact and save it.
    ///
    /// The same token is not assumed to work twice: the service may burn it
    /// on the first successful redemption. Dropping the future mid-request
    /// leaves the screen ready for another attempt.
    #[instrument(skip(self))]
    pub async fn verify(&mut self) -> Result<RedeemedArtifact> {
        if self.verifying {
            return Err(LiveScanError::Busy);
        }
        if self.pin.trim().is_empty() {
            return Err(LiveScanError::PinRequired);
        }

        let session = DownloadSession {
            token: self.token.clone(),
            pin_attempt: self.pin.clone(),
        };

        self.error = None;
        let in_flight = InFlight::start(&mut self.verifying);
        let outcome = redeem(&self.api, self.saver.as_ref(), &session).await;
        drop(in_flight);

        if let Err(ref err) = outcome {
            self.fail(err);
        }
        outcome
    }

    fn fail(&mut self, err: &LiveScanError) {
        warn!(error = %err, "redemption failed");
        match err {
            LiveScanError::Verification(detail) => self.reject(detail.clone()),
            LiveScanError::Transport(_) => self.reject(humanize_error(err).message),
            // The service already handed the artifact over; the PIN was right.
            other => self.error = Some(humanize_error(other).message),
        }
    }

    fn reject(&mut self, message: String) {
        self.pin.clear();
        self.error = Some(message);
        self.shake = true;
        self.haptics.vibrate(ERROR_PATTERN);
    }
}

/// Holds the verifying flag for one request, clearing it however the
/// request ends.
struct InFlight<'a>(&'a mut bool);

impl<'a> InFlight<'a> {
    fn start(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

async fn redeem(
    client: &ApiClient,
    saver: &dyn NativeFileSaver,
    session: &DownloadSession,
) -> Result<RedeemedArtifact> {
    let response = client
        .http()
        .post(client.endpoint("/api/download/verify"))
        .json(session)
        .send()
        .await
        .map_err(api::transport_error)?;

    if !response.status().is_success() {
        let message = api::error_detail(response, GENERIC_PIN_ERROR).await;
        return Err(LiveScanError::Verification(message));
    }

    let body = response.bytes().await.map_err(api::transport_error)?;
    info!(bytes = body.len(), "artifact received");
    let path = save_transient(saver, &body)?;
    Ok(RedeemedArtifact {
        path,
        size: body.len() as u64,
    })
}

/// Materialise `bytes` as a temporary local file, hand it to the saver and
/// delete it again as soon as the saver returns, success or not.
fn save_transient(saver: &dyn NativeFileSaver, bytes: &[u8]) -> Result<PathBuf> {
    let mut transient = tempfile::NamedTempFile::new()?;
    transient.write_all(bytes)?;
    transient.flush()?;

    let saved = saver.save_file(transient.path(), DOWNLOAD_FILENAME);
    if let Err(err) = transient.close() {
        warn!(error = %err, "could not remove transient artifact");
    }
    saved
}
