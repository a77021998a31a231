//! Requirement domain model — a client's obligation to keep an approved
//! document of a given type on file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binds a client to a document type.
///
/// At most one requirement exists per (client, document type) pair.
/// Only `mandatory` requirements affect the compliance verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub id: Uuid,
    pub client_id: Uuid,
    pub document_type_id: Uuid,
    pub mandatory: bool,
    /// Expected renewal cadence, if the document must be refreshed.
    pub renewal_months: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to assign a requirement to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequirement {
    pub client_id: Uuid,
    pub document_type_id: Uuid,
    pub mandatory: bool,
    pub renewal_months: Option<u32>,
}

/// Fields that can be updated on a requirement.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRequirement {
    pub mandatory: Option<bool>,
    pub renewal_months: Option<Option<u32>>,
}

/// Result of a compliance check over a client's mandatory requirements.
///
/// `compliant` is true iff every mandatory requirement has an approved,
/// non-deleted document. A client with zero mandatory requirements is
/// compliant by vacuity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplianceReport {
    pub compliant: bool,
    pub total_requirements: u32,
    pub fulfilled_requirements: u32,
    pub pending_requirements: u32,
}
