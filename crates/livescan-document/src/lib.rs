// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// livescan-document: Turning camera frames into capture artifacts.
//
// Provides the camera acquisition lifecycle, the centred crop to the 3:4
// portrait target, JPEG encoding, and SHA-256 fingerprints of the result.

pub mod capture;
pub mod integrity;
pub mod raster;

pub use capture::controller::{CameraState, CaptureController};
pub use capture::geometry::CropRect;
pub use integrity::hash_bytes;
pub use raster::processor::ImageProcessor;
