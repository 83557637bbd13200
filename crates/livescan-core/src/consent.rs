// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Consent rules: which checkboxes are required, when the delivery form may be
// submitted, and which single consent boolean goes over the wire.

/// Which consents the current form needs before it can proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredConsents {
    pub document_consent_required: bool,
    pub sms_consent_required: bool,
}

/// Pure consent logic. Holds no state.
pub struct ConsentGate;

impl ConsentGate {
    /// Document consent is always required; SMS consent only with a phone.
    pub fn required_consents(has_phone: bool) -> RequiredConsents {
        RequiredConsents {
            document_consent_required: true,
            sms_consent_required: has_phone,
        }
    }

    /// Whether the delivery form's submit control is enabled.
    ///
    /// Leading and trailing whitespace does not count as an email.
    pub fn can_submit(
        primary_email: &str,
        has_phone: bool,
        sms_consent: bool,
        is_submitting: bool,
    ) -> bool {
        !primary_email.trim().is_empty() && !is_submitting && (!has_phone || sms_consent)
    }

    /// The `consent` field sent with a delivery.
    ///
    /// Document consent already gated entry to the delivery stage, so the
    /// transmitted flag encodes SMS opt-in and is affirmative when no phone
    /// channel is used.
    pub fn resolve_transmitted_consent(has_phone: bool, sms_consent: bool) -> bool {
        if has_phone { sms_consent } else { true }
    }
}
