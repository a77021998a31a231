//! Document type catalog domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named category of required document (e.g. "Tax ID", "Insurance
/// policy"). Requirements reference catalog entries by id; toggling
/// `active` hides an entry from new assignments without breaking
/// existing requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: Uuid,
    /// Catalog name, unique system-wide.
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentType {
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
}

/// Fields that can be updated on a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateDocumentType {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}
