// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LiveScanError, Result};

/// Environment variable overriding [`AppConfig::api_base`].
pub const ENV_API_BASE: &str = "LIVESCAN_API_BASE";
/// Environment variable overriding [`AppConfig::download_dir`].
pub const ENV_DOWNLOAD_DIR: &str = "LIVESCAN_DOWNLOAD_DIR";

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Origin of the delivery/redemption service, e.g. `https://scan.example.com`.
    pub api_base: String,
    /// Where redeemed artifacts are saved. `None` uses the data directory.
    pub download_dir: Option<PathBuf>,
    /// Send consent receipts to the service as the user ticks boxes.
    pub record_consents: bool,
    /// Enable haptic feedback on delivery success/failure.
    pub haptics: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8000".into(),
            download_dir: None,
            record_consents: false,
            haptics: true,
        }
    }
}

impl AppConfig {
    /// Apply `LIVESCAN_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (the environment in
    /// production, a map in tests). Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            debug!(api_base = %base, "api base overridden from environment");
            self.api_base = base;
        }
        if let Some(dir) = lookup(ENV_DOWNLOAD_DIR).filter(|v| !v.trim().is_empty()) {
            self.download_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Check the service origin and normalise it (no trailing slash).
    pub fn validated(mut self) -> Result<Self> {
        let trimmed = self.api_base.trim().trim_end_matches('/').to_owned();
        let parsed = url::Url::parse(&trimmed)
            .map_err(|e| LiveScanError::Config(format!("api_base '{trimmed}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LiveScanError::Config(format!(
                "api_base '{trimmed}' must use http or https"
            )));
        }
        if !parsed.has_host() {
            return Err(LiveScanError::Config(format!(
                "api_base '{trimmed}' has no host"
            )));
        }
        self.api_base = trimmed;
        Ok(self)
    }
}
