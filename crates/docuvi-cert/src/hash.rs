//! Certificate content hash.
//!
//! SHA-256 over the canonical JSON of the issuance snapshot, printed as
//! lowercase hex. This is a display fingerprint that lets a reader
//! compare a printed certificate against the verifier page; it is not a
//! cryptographic signature.

use chrono::NaiveDate;
use docuvi_core::models::certificate::CreateCertificateDetail;
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Compute the hex-encoded SHA-256 fingerprint of an issuance snapshot.
///
/// Detail rows are hashed in the order given; the issuer passes them in
/// requirement order, so the same snapshot always produces the same
/// hash.
pub fn content_hash(
    code: &str,
    client_id: Uuid,
    valid_from: NaiveDate,
    valid_to: NaiveDate,
    details: &[CreateCertificateDetail],
) -> String {
    let snapshot = json!({
        "code": code,
        "client_id": client_id.to_string(),
        "valid_from": valid_from.format("%Y-%m-%d").to_string(),
        "valid_to": valid_to.format("%Y-%m-%d").to_string(),
        "details": details
            .iter()
            .map(|d| {
                json!({
                    "requirement_id": d.requirement_id.to_string(),
                    "document_id": d.document_id.to_string(),
                    "document_type_name": d.document_type_name,
                    "approved_at": d.approved_at.to_rfc3339(),
                    "expires_at": d.expires_at.map(|e| e.format("%Y-%m-%d").to_string()),
                })
            })
            .collect::<Vec<_>>(),
    });

    let mut hasher = Sha256::new();
    hasher.update(snapshot.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
