// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: wraps a captured frame, crops it and encodes it as JPEG.
// Operates on in-memory images using the `image` crate.

use image::{DynamicImage, RgbaImage};
use livescan_core::error::{LiveScanError, Result};
use tracing::{debug, info, instrument};

use crate::capture::geometry::CropRect;

/// Processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`,
/// enabling method chaining:
///
/// ```ignore
/// let jpeg = ImageProcessor::from_frame(frame)?
///     .crop(CropRect::centered(w, h, TARGET_ASPECT_RATIO))
///     .to_jpeg_bytes(90)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap a raw RGBA camera frame.
    pub fn from_frame(frame: livescan_core::types::RawFrame) -> Result<Self> {
        let (width, height) = (frame.width, frame.height);
        let buffer = RgbaImage::from_raw(width, height, frame.rgba).ok_or_else(|| {
            LiveScanError::ImageError(format!(
                "frame buffer does not match {width}x{height} RGBA"
            ))
        })?;
        debug!(width, height, "frame wrapped");
        Ok(Self {
            image: DynamicImage::ImageRgba8(buffer),
        })
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Transformations ------------------------------------------------------

    /// Crop to `rect`, snapped to whole pixels and clamped to image bounds.
    #[instrument(skip(self))]
    pub fn crop(self, rect: CropRect) -> Self {
        let (x, y, width, height) = rect.to_pixels(self.image.width(), self.image.height());
        info!(x, y, width, height, "Cropping image");
        Self {
            image: self.image.crop_imm(x, y, width, height),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder).map_err(|err| {
            LiveScanError::ImageError(format!("JPEG encoding failed: {err}"))
        })?;
        Ok(buffer)
    }
}
