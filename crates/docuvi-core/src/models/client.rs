//! Client (contractor company) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A company whose document compliance is tracked.
///
/// Clients are created by reviewers and never hard-deleted; deactivation
/// flips the `active` flag so history (documents, certificates) survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub company_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    /// Account the client logs in with, if one has been provisioned.
    pub user_id: Option<Uuid>,
    /// Soft-disable flag. Inactive clients keep their data.
    pub active: bool,
    /// Reviewer who registered the client.
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to register a new client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClient {
    pub company_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_by: Uuid,
}

/// Fields that can be updated on an existing client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateClient {
    pub company_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<Option<String>>,
    pub user_id: Option<Option<Uuid>>,
}
