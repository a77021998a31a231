//! Notification domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a notification is about. Stored as a string column with an
/// ASSERT constraint; typed here instead of an open-ended tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationKind {
    DocumentApproved,
    DocumentRejected,
    DocumentExpiringSoon,
    CertificateIssued,
    CertificateRevoked,
}

/// A per-user message. Mutated only by read-marking; deleted by the
/// owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub document_id: Option<Uuid>,
    pub certificate_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Fields required to create a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub document_id: Option<Uuid>,
    pub certificate_id: Option<Uuid>,
}
