// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted bridge for tests. Records every vibration and save, counts stream
// opens/stops, and can be told to refuse the camera or fail a save.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use livescan_core::error::{CameraError, LiveScanError, Result};
use livescan_core::types::{CameraFacing, RawFrame};

use crate::traits::*;

/// A file handed to [`NativeFileSaver::save_file`].
#[derive(Debug, Clone)]
pub struct SavedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub source: PathBuf,
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    stopped: AtomicUsize,
}

/// Test double for every native capability.
pub struct MockBridge {
    frame: RawFrame,
    camera_failure: Mutex<Option<CameraError>>,
    fail_saves: Mutex<bool>,
    counters: Arc<Counters>,
    facings: Mutex<Vec<CameraFacing>>,
    vibrations: Mutex<Vec<Vec<u64>>>,
    saves: Mutex<Vec<SavedFile>>,
}

impl MockBridge {
    /// A bridge whose camera serves a solid grey `width` x `height` frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: solid_frame(width, height),
            camera_failure: Mutex::new(None),
            fail_saves: Mutex::new(false),
            counters: Arc::new(Counters::default()),
            facings: Mutex::new(Vec::new()),
            vibrations: Mutex::new(Vec::new()),
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Make every following `open_stream` fail with `err` (`None` heals it).
    pub fn set_camera_failure(&self, err: Option<CameraError>) {
        *self.camera_failure.lock().expect("mock lock poisoned") = err;
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().expect("mock lock poisoned") = fail;
    }

    pub fn streams_opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn streams_stopped(&self) -> usize {
        self.counters.stopped.load(Ordering::SeqCst)
    }

    /// Streams opened and not yet stopped.
    pub fn live_streams(&self) -> usize {
        self.streams_opened() - self.streams_stopped()
    }

    pub fn requested_facings(&self) -> Vec<CameraFacing> {
        self.facings.lock().expect("mock lock poisoned").clone()
    }

    pub fn vibrations(&self) -> Vec<Vec<u64>> {
        self.vibrations.lock().expect("mock lock poisoned").clone()
    }

    pub fn saved_files(&self) -> Vec<SavedFile> {
        self.saves.lock().expect("mock lock poisoned").clone()
    }
}

fn solid_frame(width: u32, height: u32) -> RawFrame {
    RawFrame {
        width,
        height,
        rgba: [128u8, 128, 128, 255].repeat((width * height) as usize),
    }
}

impl PlatformBridge for MockBridge {
    fn platform_name(&self) -> &str {
        "Mock"
    }
}

impl NativeCamera for MockBridge {
    fn open_stream(&self, facing: CameraFacing) -> Result<Box<dyn CameraStream>> {
        self.facings.lock().expect("mock lock poisoned").push(facing);
        if let Some(err) = *self.camera_failure.lock().expect("mock lock poisoned") {
            return Err(err.into());
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            frame: self.frame.clone(),
            live: true,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockStream {
    frame: RawFrame,
    live: bool,
    counters: Arc<Counters>,
}

impl CameraStream for MockStream {
    fn current_frame(&mut self) -> Result<RawFrame> {
        if self.live {
            Ok(self.frame.clone())
        } else {
            Err(LiveScanError::CameraNotActive)
        }
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl NativeHaptics for MockBridge {
    fn vibrate(&self, pattern: &[u64]) {
        self.vibrations
            .lock()
            .expect("mock lock poisoned")
            .push(pattern.to_vec());
    }
}

impl NativeFileSaver for MockBridge {
    fn save_file(&self, source: &Path, filename: &str) -> Result<PathBuf> {
        if *self.fail_saves.lock().expect("mock lock poisoned") {
            return Err(LiveScanError::Bridge("save refused".into()));
        }
        let bytes = std::fs::read(source)?;
        self.saves.lock().expect("mock lock poisoned").push(SavedFile {
            filename: filename.to_owned(),
            bytes,
            source: source.to_path_buf(),
        });
        Ok(PathBuf::from(filename))
    }
}
