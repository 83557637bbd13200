// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.

use std::path::{Path, PathBuf};

use livescan_core::error::Result;
use livescan_core::types::{CameraFacing, RawFrame};

/// Unified bridge that groups all native capabilities the journey uses.
pub trait PlatformBridge: NativeCamera + NativeHaptics + NativeFileSaver + Send + Sync {
    /// Human-readable platform name (e.g. "iOS 17", "Desktop").
    fn platform_name(&self) -> &str;
}

/// Live video capture from a device camera.
pub trait NativeCamera: Send + Sync {
    /// Open a live stream from the camera facing `facing`.
    ///
    /// Fails with `LiveScanError::Camera(Denied)` when the user refused
    /// access and `LiveScanError::Camera(Unavailable)` when no device exists.
    fn open_stream(&self, facing: CameraFacing) -> Result<Box<dyn CameraStream>>;
}

/// A running camera stream. Holds the device until [`CameraStream::stop`].
pub trait CameraStream: Send {
    /// Read the frame currently shown in the viewfinder at native resolution.
    fn current_frame(&mut self) -> Result<RawFrame>;

    /// Stop every media track of the stream. Safe to call more than once.
    fn stop(&mut self);

    /// Whether the stream still holds the camera.
    fn is_live(&self) -> bool;
}

/// Vibration feedback.
pub trait NativeHaptics: Send + Sync {
    /// Play an on/off pattern in milliseconds (`[on, off, on, ...]`).
    /// A no-op on devices without a vibration motor.
    fn vibrate(&self, pattern: &[u64]);
}

/// Hand a file over to the platform's download/save mechanism.
pub trait NativeFileSaver: Send + Sync {
    /// Save the file at `source` under `filename` and return where it ended
    /// up. `source` is transient and may be deleted as soon as this returns.
    fn save_file(&self, source: &Path, filename: &str) -> Result<PathBuf>;
}
