// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live Scan Client. Request/response contracts with the delivery service
// for multipart scan submission, token + PIN redemption and the
// session/consent-receipt endpoints. The service itself (image processing,
// PDF generation, email/SMS dispatch, token expiry) is external.

pub mod api;
pub mod delivery;
pub mod download;
pub mod session;

pub use api::ApiClient;
pub use delivery::DeliverySubmitter;
pub use download::{DownloadVerifier, RedeemedArtifact};
pub use session::{SessionClient, SessionCredentials};
