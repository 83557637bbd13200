// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture controller: owns the single camera session and turns the current
// viewfinder frame into a portrait-normalised JPEG.
//
//   CameraOff --acquire ok--> CameraActive --capture_frame--> CameraOff
//
// A failed acquire leaves the controller in CameraOff.

use std::sync::Arc;

use livescan_bridge::traits::{CameraStream, NativeCamera};
use livescan_core::error::{LiveScanError, Result};
use livescan_core::types::{CameraFacing, CapturedImage, JPEG_QUALITY, TARGET_ASPECT_RATIO};
use tracing::{debug, info, instrument, warn};

use crate::capture::geometry::CropRect;
use crate::integrity::hash_bytes;
use crate::raster::processor::ImageProcessor;

/// Whether the controller currently holds the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    CameraOff,
    CameraActive,
}

pub struct CaptureController {
    camera: Arc<dyn NativeCamera>,
    stream: Option<Box<dyn CameraStream>>,
}

impl CaptureController {
    pub fn new(camera: Arc<dyn NativeCamera>) -> Self {
        Self {
            camera,
            stream: None,
        }
    }

    pub fn state(&self) -> CameraState {
        match self.stream {
            Some(ref stream) if stream.is_live() => CameraState::CameraActive,
            _ => CameraState::CameraOff,
        }
    }

    /// Open the rear-facing camera.
    ///
    /// Any session that is still open is released first, so at most one
    /// stream exists at a time.
    #[instrument(skip(self))]
    pub fn acquire(&mut self) -> Result<()> {
        if self.stream.is_some() {
            debug!("releasing previous camera session before re-acquiring");
            self.release();
        }

        match self.camera.open_stream(CameraFacing::Environment) {
            Ok(stream) => {
                info!("camera acquired");
                self.stream = Some(stream);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "camera acquisition failed");
                Err(err)
            }
        }
    }

    /// Stop all tracks of the active session. Idempotent.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("camera released");
        }
    }

    /// Grab the current frame, crop it to 3:4 portrait around the centre and
    /// encode it. The camera is released afterwards whether or not the
    /// capture succeeded.
    #[instrument(skip(self))]
    pub fn capture_frame(&mut self) -> Result<CapturedImage> {
        let result = self.encode_current_frame();
        self.release();
        result
    }

    fn encode_current_frame(&mut self) -> Result<CapturedImage> {
        let stream = match self.stream {
            Some(ref mut stream) if stream.is_live() => stream,
            _ => return Err(LiveScanError::CameraNotActive),
        };

        let frame = stream.current_frame()?;
        let rect = CropRect::centered(frame.width, frame.height, TARGET_ASPECT_RATIO);
        debug!(
            source_width = frame.width,
            source_height = frame.height,
            ?rect,
            "computed portrait crop"
        );

        let processor = ImageProcessor::from_frame(frame)?.crop(rect);
        let (width, height) = (processor.width(), processor.height());
        let jpeg = processor.to_jpeg_bytes(JPEG_QUALITY)?;
        let digest = hash_bytes(&jpeg);

        info!(width, height, bytes = jpeg.len(), digest = %digest, "frame captured");
        Ok(CapturedImage::new(jpeg, width, height, digest))
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.release();
    }
}
