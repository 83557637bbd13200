// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live Scan: Native platform bridge abstractions.
//
// The workflow never touches a camera, vibration motor or file system
// directly. It holds trait objects from this crate, so every component can be
// driven by the desktop bridge in the CLI or by the scripted mock in tests.

pub mod desktop;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

use std::path::PathBuf;
use std::sync::Arc;

pub use desktop::DesktopBridge;
pub use traits::{CameraStream, NativeCamera, NativeFileSaver, NativeHaptics, PlatformBridge};

/// The native capabilities of one platform as separately shareable handles.
#[derive(Clone)]
pub struct Capabilities {
    pub platform_name: String,
    pub camera: Arc<dyn NativeCamera>,
    pub haptics: Arc<dyn NativeHaptics>,
    pub saver: Arc<dyn NativeFileSaver>,
}

impl Capabilities {
    pub fn from_bridge<B: PlatformBridge + 'static>(bridge: Arc<B>) -> Self {
        Self {
            platform_name: bridge.platform_name().to_owned(),
            camera: Arc::clone(&bridge) as Arc<dyn NativeCamera>,
            haptics: Arc::clone(&bridge) as Arc<dyn NativeHaptics>,
            saver: bridge,
        }
    }
}

/// Build the bridge for the current platform.
///
/// `frame_source` is the still image the desktop "camera" serves; `None` means
/// no camera is attached. Saved artifacts land in `download_dir`.
pub fn platform_bridge(
    frame_source: Option<PathBuf>,
    download_dir: PathBuf,
    haptics: bool,
) -> Capabilities {
    Capabilities::from_bridge(Arc::new(
        DesktopBridge::new(frame_source, download_dir).with_haptics(haptics),
    ))
}
