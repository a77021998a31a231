//! Document domain model.
//!
//! A document is one uploaded file satisfying a requirement. Re-uploads
//! create a new version instead of mutating history; the "current"
//! document of a requirement is the highest version among non-deleted
//! rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review state of a document. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub requirement_id: Uuid,
    /// Path of the file in external blob storage.
    pub storage_path: String,
    /// Original filename shown to users.
    pub file_name: String,
    /// Monotonically increasing per requirement, assigned on insert.
    pub version: u32,
    pub status: DocumentStatus,
    /// Set when the document is rejected.
    pub rejection_reason: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    /// Calendar date after which the underlying document is stale.
    pub expires_at: Option<NaiveDate>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    /// Soft-delete flag. Deleted documents are excluded from version
    /// resolution and compliance.
    pub deleted: bool,
    pub deleted_by: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to record a new upload. The version number is
/// assigned by the repository, not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    pub requirement_id: Uuid,
    pub storage_path: String,
    pub file_name: String,
    pub expires_at: Option<NaiveDate>,
}

/// A document nearing its expiry date, with the client context needed
/// to notify someone about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringDocument {
    pub document_id: Uuid,
    pub requirement_id: Uuid,
    pub client_id: Uuid,
    pub expires_at: NaiveDate,
    pub days_remaining: i64,
}
