// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session bootstrap and consent receipts.
//
//   POST /api/init                 -> {session_id, session_token}
//   POST /api/consent/{document,sms}  {session_id, session_token} -> {status: "ok"}
//
// The service signs and stores the receipt; the client only proves which
// session ticked the box.

use livescan_core::error::{LiveScanError, Result};
use livescan_core::types::ConsentKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::api::{self, ApiClient};

/// Credentials issued by `POST /api/init`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
    pub session_id: Uuid,
    pub session_token: String,
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("session_id", &self.session_id)
            .field("session_token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct SessionClient {
    api: ApiClient,
}

impl SessionClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Ask the service for a fresh signed session.
    #[instrument(skip(self))]
    pub async fn init(&self) -> Result<SessionCredentials> {
        let response = self
            .api
            .http()
            .post(self.api.endpoint("/api/init"))
            .send()
            .await
            .map_err(api::transport_error)?;

        if !response.status().is_success() {
            let message = api::error_detail(response, "could not start a session").await;
            return Err(LiveScanError::Session(message));
        }

        let body = response.bytes().await.map_err(api::transport_error)?;
        let credentials: SessionCredentials = serde_json::from_slice(&body)
            .map_err(|e| LiveScanError::Session(format!("malformed session response: {e}")))?;
        info!(session_id = %credentials.session_id, "session started");
        Ok(credentials)
    }

    /// Record that the user gave consent of `kind` in this session.
    #[instrument(skip(self, credentials), fields(session_id = %credentials.session_id))]
    pub async fn record_consent(
        &self,
        credentials: &SessionCredentials,
        kind: ConsentKind,
    ) -> Result<()> {
        let path = format!("/api/consent/{}", kind.path_segment());
        let response = self
            .api
            .http()
            .post(self.api.endpoint(&path))
            .json(credentials)
            .send()
            .await
            .map_err(api::transport_error)?;

        if !response.status().is_success() {
            let message = api::error_detail(response, "consent was not recorded").await;
            return Err(LiveScanError::Session(message));
        }

        debug!(?kind, "consent receipt stored");
        Ok(())
    }
}
