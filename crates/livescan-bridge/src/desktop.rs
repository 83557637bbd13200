// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge for the CLI and CI builds.
//
// There is no live camera on a desktop, so the "camera" serves a still image
// from disk as its only frame. Haptics are logged no-ops and saved artifacts
// are copied into a download directory.

use std::path::{Path, PathBuf};

use livescan_core::error::{CameraError, LiveScanError, Result};
use livescan_core::types::{CameraFacing, RawFrame};
use tracing::{debug, info, warn};

use crate::traits::*;

/// Bridge backed by the local file system.
pub struct DesktopBridge {
    frame_source: Option<PathBuf>,
    download_dir: PathBuf,
    haptics: bool,
}

impl DesktopBridge {
    pub fn new(frame_source: Option<PathBuf>, download_dir: PathBuf) -> Self {
        Self {
            frame_source,
            download_dir,
            haptics: true,
        }
    }

    pub fn with_haptics(mut self, enabled: bool) -> Self {
        self.haptics = enabled;
        self
    }
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        "Desktop"
    }
}

impl NativeCamera for DesktopBridge {
    fn open_stream(&self, facing: CameraFacing) -> Result<Box<dyn CameraStream>> {
        let Some(path) = self.frame_source.as_deref() else {
            warn!("no frame source configured, camera unavailable");
            return Err(CameraError::Unavailable.into());
        };

        let decoded = image::open(path).map_err(|err| match err {
            image::ImageError::IoError(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
                LiveScanError::Camera(CameraError::Denied)
            }
            image::ImageError::IoError(_) => LiveScanError::Camera(CameraError::Unavailable),
            other => LiveScanError::ImageError(format!(
                "failed to decode frame source {}: {other}",
                path.display()
            )),
        })?;

        let rgba = decoded.to_rgba8();
        info!(
            path = %path.display(),
            ?facing,
            width = rgba.width(),
            height = rgba.height(),
            "desktop camera stream opened"
        );
        Ok(Box::new(StillImageStream {
            frame: Some(RawFrame {
                width: rgba.width(),
                height: rgba.height(),
                rgba: rgba.into_raw(),
            }),
        }))
    }
}

/// A stream whose viewfinder never changes.
struct StillImageStream {
    frame: Option<RawFrame>,
}

impl CameraStream for StillImageStream {
    fn current_frame(&mut self) -> Result<RawFrame> {
        self.frame.clone().ok_or(LiveScanError::CameraNotActive)
    }

    fn stop(&mut self) {
        if self.frame.take().is_some() {
            debug!("desktop camera stream stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.frame.is_some()
    }
}

impl NativeHaptics for DesktopBridge {
    fn vibrate(&self, pattern: &[u64]) {
        if self.haptics {
            debug!(?pattern, "haptics requested (no motor on desktop)");
        }
    }
}

impl NativeFileSaver for DesktopBridge {
    fn save_file(&self, source: &Path, filename: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.download_dir)?;
        let target = self.download_dir.join(filename);
        let bytes = std::fs::copy(source, &target)?;
        info!(path = %target.display(), bytes, "file saved");
        Ok(target)
    }
}
