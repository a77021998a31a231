//! Audit log domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One append-only record of a privileged mutation. Never updated or
/// deleted by the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    /// Verb, e.g. `certificate.issue`, `document.approve`.
    pub action: String,
    /// Entity kind, e.g. `certificate`, `document`.
    pub entity: String,
    pub entity_id: Option<Uuid>,
    /// Structured payload describing the mutation.
    pub detail: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Fields required to append an audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    pub actor_id: Uuid,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub detail: serde_json::Value,
}
