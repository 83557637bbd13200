// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

use livescan_core::error::Result;

const APP_DIR: &str = "livescan";

/// Return the application data directory, creating it if needed.
///
/// `$XDG_DATA_HOME/livescan`, else `~/.local/share/livescan`.
pub fn data_dir() -> Result<PathBuf> {
    let dir = base_dir(|key| std::env::var(key).ok()).join(APP_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn base_dir(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(xdg) = lookup("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = lookup("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}
