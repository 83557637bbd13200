// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live Scan: Core types, consent rules and error definitions shared across
// all crates.

pub mod config;
pub mod consent;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::AppConfig;
pub use consent::{ConsentGate, RequiredConsents};
pub use error::{CameraError, LiveScanError, Result};
pub use types::*;
