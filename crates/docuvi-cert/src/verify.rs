//! Pure verification logic.
//!
//! Classification is separated from the database lookup so the check
//! order can be unit-tested without fixtures. The order is fixed:
//! revoked wins over every date check, then expiry, then not-yet-valid.
//! Expiry is computed against `today` rather than the stored status, so
//! verification stays correct between sweep runs.

use chrono::NaiveDate;
use docuvi_core::models::certificate::{
    Certificate, CertificateStatus, InvalidReason, Verification,
};

/// Classify a certificate against a reference date.
pub fn classify(certificate: &Certificate, today: NaiveDate) -> Verification {
    let reason = if certificate.status == CertificateStatus::Revoked {
        Some(InvalidReason::Revoked)
    } else if certificate.status == CertificateStatus::Expired || certificate.valid_to < today {
        Some(InvalidReason::Expired)
    } else if certificate.valid_from > today {
        Some(InvalidReason::NotYetValid)
    } else {
        None
    };

    Verification {
        valid: reason.is_none(),
        reason,
        certificate: Some(certificate.clone()),
    }
}

/// The verification result for a code that resolves to no certificate.
pub fn not_found() -> Verification {
    Verification {
        valid: false,
        reason: Some(InvalidReason::NotFound),
        certificate: None,
    }
}
