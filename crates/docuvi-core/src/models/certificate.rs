//! Certificate domain models.
//!
//! A certificate is the issued artifact proving a client's compliance at
//! a point in time. Detail rows snapshot which document satisfied which
//! requirement at issuance, so later uploads or approvals never change
//! what an existing certificate attests.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a certificate in its lifecycle.
///
/// `Active → Revoked` is manual and irreversible; `Active → Expired` is
/// automatic once the validity window has passed. Both are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CertificateStatus {
    Active,
    Revoked,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    /// Human-readable verification code (`CERT-<year>-<random>`), unique.
    pub code: String,
    /// SHA-256 fingerprint over the issuance snapshot, hex-encoded.
    /// Display consistency only — this is not a cryptographic signature.
    pub hash: String,
    pub client_id: Uuid,
    /// Reviewer who issued the certificate.
    pub issued_by: Uuid,
    pub issued_at: DateTime<Utc>,
    /// Validity window start (inclusive).
    pub valid_from: NaiveDate,
    /// Validity window end (inclusive).
    pub valid_to: NaiveDate,
    pub status: CertificateStatus,
    pub revocation_reason: Option<String>,
    pub revoked_by: Option<Uuid>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to persist a new certificate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCertificate {
    pub code: String,
    pub hash: String,
    pub client_id: Uuid,
    pub issued_by: Uuid,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
}

/// An immutable line item recording the document that satisfied one
/// requirement at issuance time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateDetail {
    pub id: Uuid,
    pub certificate_id: Uuid,
    pub requirement_id: Uuid,
    pub document_id: Uuid,
    /// Catalog name copied at issuance so later renames don't rewrite
    /// history.
    pub document_type_name: String,
    pub approved_at: DateTime<Utc>,
    pub expires_at: Option<NaiveDate>,
    pub approved_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fields required to persist one detail row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCertificateDetail {
    pub requirement_id: Uuid,
    pub document_id: Uuid,
    pub document_type_name: String,
    pub approved_at: DateTime<Utc>,
    pub expires_at: Option<NaiveDate>,
    pub approved_by: Uuid,
}

/// Why a verification did not come back valid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvalidReason {
    NotFound,
    Revoked,
    Expired,
    NotYetValid,
}

/// Outcome of verifying a certificate code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub valid: bool,
    /// `None` when the certificate is valid.
    pub reason: Option<InvalidReason>,
    /// Present whenever the code resolved to a certificate, even an
    /// invalid one, so the verifier page can show context.
    pub certificate: Option<Certificate>,
}
