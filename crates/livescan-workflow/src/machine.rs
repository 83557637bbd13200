// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Workflow state machine: one scanning session from viewfinder to result.
//
//   Capture --capture--> Review --confirm--> Processing --done--> DeliveryForm
//      ^                   |  ^                  |                    |
//      +-----retake--------+  +----cancel--------+                 submit
//      |                      |                                       v
//      |                      +--back-- ResultFailure <--fail-- Submitting
//      +--------------done-------------- ResultSuccess <--ok---------+
//
// DownloadVerify is entered from a redemption link and returns to wherever
// the session was. At most one of processing, submitting and verifying is
// in flight at a time.

use livescan_bridge::traits::NativeCamera;
use livescan_client::{DeliverySubmitter, DownloadVerifier, RedeemedArtifact};
use livescan_core::consent::{ConsentGate, RequiredConsents};
use livescan_core::error::{LiveScanError, Result};
use livescan_core::human_errors::humanize_error;
use livescan_core::types::{CapturedImage, ConsentRecord, DeliveryResult};
use livescan_document::{CameraState, CaptureController};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::simulator::{ProcessingSimulator, SimulationHandle, SimulationOutcome, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Capture,
    Review,
    Processing,
    DeliveryForm,
    Submitting,
    ResultSuccess,
    ResultFailure,
    DownloadVerify,
}

impl WorkflowState {
    pub fn name(self) -> &'static str {
        match self {
            WorkflowState::Capture => "CAPTURE",
            WorkflowState::Review => "REVIEW",
            WorkflowState::Processing => "PROCESSING",
            WorkflowState::DeliveryForm => "DELIVERY_FORM",
            WorkflowState::Submitting => "SUBMITTING",
            WorkflowState::ResultSuccess => "RESULT_SUCCESS",
            WorkflowState::ResultFailure => "RESULT_FAILURE",
            WorkflowState::DownloadVerify => "DOWNLOAD_VERIFY",
        }
    }

    /// States with an operation in flight.
    fn is_busy(self) -> bool {
        matches!(self, WorkflowState::Processing | WorkflowState::Submitting)
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where "back" leads from a failed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTarget {
    /// Keep the image and consent, look at the photo again.
    Review,
    /// Discard the image and take a new one.
    Capture,
}

/// What the user has typed into the delivery form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryForm {
    pub primary_email: String,
    /// Comma-separated additional addresses.
    pub extra_emails: String,
    /// E.164, empty for none.
    pub phone: String,
    pub sms_consent: bool,
}

impl DeliveryForm {
    pub fn has_phone(&self) -> bool {
        !self.phone.trim().is_empty()
    }
}

struct Redemption {
    verifier: DownloadVerifier,
    resume: WorkflowState,
}

pub struct WorkflowStateMachine {
    state: WorkflowState,
    capture: CaptureController,
    submitter: DeliverySubmitter,
    image: Option<CapturedImage>,
    consent: ConsentRecord,
    form: DeliveryForm,
    processing: Option<SimulationHandle>,
    result: Option<DeliveryResult>,
    last_error: Option<String>,
    redemption: Option<Redemption>,
}

/// Shown when a delivery was abandoned before the service answered.
pub const INTERRUPTED_DELIVERY: &str =
    "The delivery was interrupted before the service replied. It may not have been sent.";

/// Lands an abandoned submission on the failure screen.
struct InFlightSubmission<'a> {
    state: &'a mut WorkflowState,
    last_error: &'a mut Option<String>,
    pending: bool,
}

impl InFlightSubmission<'_> {
    /// The request finished; the caller records the outcome.
    fn settle(mut self) {
        self.pending = false;
    }
}

impl Drop for InFlightSubmission<'_> {
    fn drop(&mut self) {
        if !self.pending {
            return;
        }
        warn!("delivery interrupted before a response");
        info!(from = %self.state, to = %WorkflowState::ResultFailure, "workflow transition");
        *self.state = WorkflowState::ResultFailure;
        *self.last_error = Some(INTERRUPTED_DELIVERY.to_owned());
    }
}

impl WorkflowStateMachine {
    pub fn new(camera: Arc<dyn NativeCamera>, submitter: DeliverySubmitter) -> Self {
        Self {
            state: WorkflowState::Capture,
            capture: CaptureController::new(camera),
            submitter,
            image: None,
            consent: ConsentRecord::default(),
            form: DeliveryForm::default(),
            processing: None,
            result: None,
            last_error: None,
            redemption: None,
        }
    }

    // -- Accessors --

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn camera_state(&self) -> CameraState {
        self.capture.state()
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn consent(&self) -> ConsentRecord {
        self.consent
    }

    pub fn form(&self) -> &DeliveryForm {
        &self.form
    }

    /// Edit the form. A request already in flight is a snapshot and is not
    /// affected.
    pub fn form_mut(&mut self) -> &mut DeliveryForm {
        &mut self.form
    }

    pub fn result(&self) -> Option<&DeliveryResult> {
        self.result.as_ref()
    }

    /// Message shown on the failure screen or after a failed capture.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn required_consents(&self) -> RequiredConsents {
        ConsentGate::required_consents(self.form.has_phone())
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.state == WorkflowState::DeliveryForm
            && ConsentGate::can_submit(
                &self.form.primary_email,
                self.form.has_phone(),
                self.form.sms_consent,
                self.state == WorkflowState::Submitting,
            )
    }

    // -- Capture --

    /// Open the viewfinder.
    pub fn start_camera(&mut self) -> Result<()> {
        self.require(WorkflowState::Capture, "start the camera")?;
        self.last_error = None;
        self.capture.acquire().inspect_err(|err| self.fail_capture(err))
    }

    /// Take the photo from the open viewfinder and move to review.
    pub fn take_photo(&mut self) -> Result<&CapturedImage> {
        self.require(WorkflowState::Capture, "take a photo")?;
        let image = self
            .capture
            .capture_frame()
            .inspect_err(|err| self.fail_capture(err))?;
        self.last_error = None;
        self.transition(WorkflowState::Review);
        let image: &CapturedImage = self.image.insert(image);
        Ok(image)
    }

    /// Open the camera and take the photo in one step.
    pub fn capture(&mut self) -> Result<&CapturedImage> {
        if self.capture.state() == CameraState::CameraOff {
            self.start_camera()?;
        }
        self.take_photo()
    }

    fn fail_capture(&mut self, err: &LiveScanError) {
        warn!(error = %err, "capture failed");
        self.last_error = Some(humanize_error(err).message);
    }

    // -- Review --

    pub fn set_document_consent(&mut self, accepted: bool) -> Result<()> {
        self.require(WorkflowState::Review, "change consent")?;
        self.consent.document_consent = accepted;
        Ok(())
    }

    /// Throw the photo away and go back to the viewfinder.
    pub fn retake(&mut self) -> Result<()> {
        self.require(WorkflowState::Review, "retake")?;
        self.discard_capture();
        self.transition(WorkflowState::Capture);
        Ok(())
    }

    /// Start processing. Requires the document consent box to be ticked and
    /// a running tokio runtime to drive the progress ticks.
    pub fn confirm(&mut self) -> Result<()> {
        self.require(WorkflowState::Review, "confirm")?;
        if self.image.is_none() {
            return Err(LiveScanError::NoImage);
        }
        if !self.consent.document_consent {
            return Err(LiveScanError::ConsentRequired);
        }

        self.processing = Some(ProcessingSimulator::spawn()?);
        self.transition(WorkflowState::Processing);
        Ok(())
    }

    // -- Processing --

    /// Latest simulator tick while processing.
    pub fn processing_progress(&self) -> Option<Tick> {
        self.processing.as_ref().map(SimulationHandle::progress)
    }

    pub fn subscribe_progress(&self) -> Option<watch::Receiver<Tick>> {
        self.processing.as_ref().map(SimulationHandle::subscribe)
    }

    /// Wait for the simulator and move to the delivery form.
    ///
    /// If the wait is dropped before completion the simulation is cancelled
    /// and the next call returns to review.
    pub async fn wait_for_processing(&mut self) -> Result<SimulationOutcome> {
        self.require(WorkflowState::Processing, "wait for processing")?;
        let outcome = match self.processing.take() {
            Some(handle) => handle.finished().await,
            None => SimulationOutcome::Cancelled,
        };

        match outcome {
            SimulationOutcome::Completed => self.transition(WorkflowState::DeliveryForm),
            SimulationOutcome::Cancelled => self.transition(WorkflowState::Review),
        }
        Ok(outcome)
    }

    /// Stop processing and return to review. Image and consent are kept.
    pub fn cancel_processing(&mut self) -> Result<()> {
        self.require(WorkflowState::Processing, "cancel processing")?;
        self.stop_processing();
        self.transition(WorkflowState::Review);
        Ok(())
    }

    fn stop_processing(&mut self) {
        if let Some(handle) = self.processing.take() {
            handle.cancel();
        }
    }

    // -- Delivery --

    /// Snapshot the form, send it and land on a result screen.
    ///
    /// Dropping the future before the service answers lands on the failure
    /// screen with the form intact, so the user can retry.
    #[instrument(skip(self), fields(state = %self.state))]
    pub async fn submit(&mut self) -> Result<DeliveryResult> {
        self.require(WorkflowState::DeliveryForm, "submit")?;
        if self.form.primary_email.trim().is_empty() {
            return Err(LiveScanError::NoRecipients);
        }
        if self.form.has_phone() && !self.form.sms_consent {
            return Err(LiveScanError::SmsConsentRequired);
        }
        let image = self.image.clone().ok_or(LiveScanError::NoImage)?;

        let request = DeliverySubmitter::build_request(
            image,
            &self.form.primary_email,
            &self.form.extra_emails,
            &self.form.phone,
            self.form.sms_consent,
        )?;
        self.consent.sms_consent = request.phone().is_some() && self.form.sms_consent;

        self.transition(WorkflowState::Submitting);
        let in_flight = InFlightSubmission {
            state: &mut self.state,
            last_error: &mut self.last_error,
            pending: true,
        };
        let outcome = self.submitter.submit(&request).await;
        in_flight.settle();

        match outcome {
            Ok(result) => {
                self.result = Some(result.clone());
                self.last_error = None;
                self.transition(WorkflowState::ResultSuccess);
                Ok(result)
            }
            Err(err) => {
                self.last_error = Some(match err {
                    LiveScanError::Delivery(ref detail) => detail.clone(),
                    ref other => humanize_error(other).message,
                });
                self.transition(WorkflowState::ResultFailure);
                Err(err)
            }
        }
    }

    /// Back to the form with everything the user typed intact.
    pub fn retry(&mut self) -> Result<()> {
        self.require(WorkflowState::ResultFailure, "retry")?;
        self.last_error = None;
        self.transition(WorkflowState::DeliveryForm);
        Ok(())
    }

    pub fn back(&mut self, target: BackTarget) -> Result<()> {
        self.require(WorkflowState::ResultFailure, "go back")?;
        self.last_error = None;
        match target {
            BackTarget::Review => self.transition(WorkflowState::Review),
            BackTarget::Capture => {
                self.discard_capture();
                self.transition(WorkflowState::Capture);
            }
        }
        Ok(())
    }

    /// Finish the session and start over with a clean slate.
    pub fn done(&mut self) -> Result<()> {
        self.require(WorkflowState::ResultSuccess, "finish")?;
        self.reset();
        Ok(())
    }

    /// Leave the journey from wherever it is: processing is cancelled, the
    /// camera is released and all session data is dropped.
    pub fn abandon(&mut self) {
        self.redemption = None;
        self.stop_processing();
        self.reset();
    }

    // -- Redemption --

    /// Enter the redemption screen for the link's token.
    pub fn open_redemption(&mut self, verifier: DownloadVerifier) -> Result<()> {
        if self.state.is_busy() {
            return Err(LiveScanError::Busy);
        }
        if self.state == WorkflowState::DownloadVerify {
            return Err(self.invalid("open a redemption link"));
        }
        self.capture.release();
        self.redemption = Some(Redemption {
            verifier,
            resume: self.state,
        });
        self.transition(WorkflowState::DownloadVerify);
        Ok(())
    }

    pub fn verifier(&self) -> Option<&DownloadVerifier> {
        self.redemption.as_ref().map(|r| &r.verifier)
    }

    pub fn verifier_mut(&mut self) -> Option<&mut DownloadVerifier> {
        self.redemption.as_mut().map(|r| &mut r.verifier)
    }

    /// Try `pin`. Success or failure, the screen stays open.
    pub async fn verify_pin(&mut self, pin: &str) -> Result<RedeemedArtifact> {
        self.require(WorkflowState::DownloadVerify, "verify a PIN")?;
        let redemption = self
            .redemption
            .as_mut()
            .ok_or_else(|| LiveScanError::InvalidTransition {
                state: WorkflowState::DownloadVerify.name(),
                action: "verify a PIN",
            })?;
        redemption.verifier.set_pin(pin);
        redemption.verifier.verify().await
    }

    /// Close the redemption screen and return to the previous state.
    pub fn leave_redemption(&mut self) -> Result<()> {
        self.require(WorkflowState::DownloadVerify, "leave redemption")?;
        let resume = self
            .redemption
            .take()
            .map_or(WorkflowState::Capture, |r| r.resume);
        self.transition(resume);
        Ok(())
    }

    // -- Internals --

    fn require(&self, expected: WorkflowState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else if self.state.is_busy() {
            Err(LiveScanError::Busy)
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> LiveScanError {
        LiveScanError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    fn transition(&mut self, next: WorkflowState) {
        info!(from = %self.state, to = %next, "workflow transition");
        self.state = next;
    }

    fn discard_capture(&mut self) {
        self.image = None;
        self.consent = ConsentRecord::default();
    }

    fn reset(&mut self) {
        self.capture.release();
        self.discard_capture();
        self.form = DeliveryForm::default();
        self.result = None;
        self.last_error = None;
        self.transition(WorkflowState::Capture);
    }
}
