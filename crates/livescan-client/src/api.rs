// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared HTTP plumbing for the delivery service.

use livescan_core::AppConfig;
use livescan_core::error::{LiveScanError, Result};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = concat!("livescan/", env!("CARGO_PKG_VERSION"));

/// Async HTTP client bound to one service origin.
///
/// Cheap to clone; clones share the connection pool. Timeouts are left to
/// the transport's defaults.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// Create a client for the service at `base` (e.g. `https://scan.example.com`).
    pub fn new(base: &str) -> Result<Self> {
        let config = AppConfig {
            api_base: base.to_owned(),
            ..Default::default()
        }
        .validated()?;
        Self::from_config(&config)
    }

    /// Create a client for an already validated configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LiveScanError::Transport(format!("HTTP client setup: {e}")))?;
        Ok(Self {
            http,
            base: config.api_base.trim_end_matches('/').to_owned(),
        })
    }

    /// The service origin, without trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL for an absolute `path` such as `/api/scan`.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Probe `GET /`, which answers `{"status": "ok"}` when the service is up.
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn health(&self) -> Result<()> {
        let response = self
            .http
            .get(self.endpoint("/"))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "health check failed");
            return Err(LiveScanError::Transport(format!(
                "service answered {status}"
            )));
        }

        #[derive(Deserialize)]
        struct Health {
            status: String,
        }

        let health: Health = response.json().await.map_err(transport_error)?;
        debug!(status = %health.status, "health check answered");
        if health.status == "ok" {
            Ok(())
        } else {
            Err(LiveScanError::Transport(format!(
                "service reports status '{}'",
                health.status
            )))
        }
    }
}

/// Map a reqwest failure (connect, TLS, body read) to a transport error.
pub(crate) fn transport_error(err: reqwest::Error) -> LiveScanError {
    LiveScanError::Transport(err.to_string())
}

/// Read the human-readable `detail` of an error response, or `fallback`.
///
/// `detail` is only used when it is a string; validation errors that carry a
/// list of problems fall back to the generic message.
pub(crate) async fn error_detail(response: reqwest::Response, fallback: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<serde_json::Value>,
    }

    let status = response.status();
    let detail = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .and_then(|d| d.as_str().map(str::to_owned))
            .filter(|d| !d.trim().is_empty()),
        Err(err) => {
            warn!(error = %err, "could not read error body");
            None
        }
    };

    debug!(%status, ?detail, "service returned an error");
    detail.unwrap_or_else(|| fallback.to_owned())
}
