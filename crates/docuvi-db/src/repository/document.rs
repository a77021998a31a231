//! SurrealDB implementation of [`DocumentRepository`].
//!
//! Version numbers are assigned here, not by callers: the next version
//! for a requirement is one past the maximum over all rows, deleted
//! included, so versions never repeat. Expiry dates are stored as ISO
//! `YYYY-MM-DD` strings and range-filtered lexically.

use chrono::{DateTime, NaiveDate, Utc};
use docuvi_core::error::{DocuviError, DocuviResult};
use docuvi_core::models::document::{
    CreateDocument, Document, DocumentStatus, ExpiringDocument,
};
use docuvi_core::repository::DocumentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DbError::Decode(format!("invalid date '{s}': {e}")))
}

fn parse_status(s: &str) -> Result<DocumentStatus, DbError> {
    match s {
        "Pending" => Ok(DocumentStatus::Pending),
        "Approved" => Ok(DocumentStatus::Approved),
        "Rejected" => Ok(DocumentStatus::Rejected),
        other => Err(DbError::Decode(format!("unknown document status: {other}"))),
    }
}

fn parse_opt_uuid(s: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    s.map(|v| {
        Uuid::parse_str(&v).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
    })
    .transpose()
}

#[derive(Debug, SurrealValue)]
struct DocumentRow {
    requirement_id: String,
    storage_path: String,
    file_name: String,
    version: u32,
    status: String,
    rejection_reason: Option<String>,
    uploaded_at: DateTime<Utc>,
    expires_at: Option<String>,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    deleted: bool,
    deleted_by: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DocumentRowWithId {
    record_id: String,
    requirement_id: String,
    storage_path: String,
    file_name: String,
    version: u32,
    status: String,
    rejection_reason: Option<String>,
    uploaded_at: DateTime<Utc>,
    expires_at: Option<String>,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    deleted: bool,
    deleted_by: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_document(self, id: Uuid) -> Result<Document, DbError> {
        let requirement_id = Uuid::parse_str(&self.requirement_id)
            .map_err(|e| DbError::Decode(format!("invalid requirement_id UUID: {e}")))?;
        Ok(Document {
            id,
            requirement_id,
            storage_path: self.storage_path,
            file_name: self.file_name,
            version: self.version,
            status: parse_status(&self.status)?,
            rejection_reason: self.rejection_reason,
            uploaded_at: self.uploaded_at,
            expires_at: self.expires_at.as_deref().map(parse_date).transpose()?,
            approved_by: parse_opt_uuid(self.approved_by, "approved_by")?,
            approved_at: self.approved_at,
            deleted: self.deleted,
            deleted_by: parse_opt_uuid(self.deleted_by, "deleted_by")?,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DocumentRowWithId {
    fn try_into_document(self) -> Result<Document, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let requirement_id = Uuid::parse_str(&self.requirement_id)
            .map_err(|e| DbError::Decode(format!("invalid requirement_id UUID: {e}")))?;
        Ok(Document {
            id,
            requirement_id,
            storage_path: self.storage_path,
            file_name: self.file_name,
            version: self.version,
            status: parse_status(&self.status)?,
            rejection_reason: self.rejection_reason,
            uploaded_at: self.uploaded_at,
            expires_at: self.expires_at.as_deref().map(parse_date).transpose()?,
            approved_by: parse_opt_uuid(self.approved_by, "approved_by")?,
            approved_at: self.approved_at,
            deleted: self.deleted,
            deleted_by: parse_opt_uuid(self.deleted_by, "deleted_by")?,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct MaxVersionRow {
    max_version: Option<u32>,
}

#[derive(Debug, SurrealValue)]
struct RequirementClientRow {
    client_id: String,
}

/// SurrealDB implementation of the document repository.
#[derive(Clone)]
pub struct SurrealDocumentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDocumentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn next_version(&self, requirement_id: &str) -> Result<u32, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT math::max(version) AS max_version FROM document \
                 WHERE requirement_id = $requirement_id GROUP ALL",
            )
            .bind(("requirement_id", requirement_id.to_string()))
            .await?;

        let rows: Vec<MaxVersionRow> = result.take(0)?;
        let max = rows.first().and_then(|r| r.max_version).unwrap_or(0);
        Ok(max + 1)
    }

    /// An approve or reject matched no row: the document is absent,
    /// soft-deleted, or already reviewed. Re-read to report which.
    async fn review_miss(&self, id: Uuid) -> DocuviError {
        match self.get_by_id(id).await {
            Ok(document) if document.deleted => DocuviError::Validation {
                message: format!("document {id} is deleted"),
            },
            Ok(document) => DocuviError::Validation {
                message: format!(
                    "document {id} is not pending review (status {:?})",
                    document.status
                ),
            },
            Err(e) => e,
        }
    }
}

impl<C: Connection> DocumentRepository for SurrealDocumentRepository<C> {
    async fn create(&self, input: CreateDocument) -> DocuviResult<Document> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let requirement_id = input.requirement_id.to_string();

        // Unique index on (requirement_id, version) catches the race
        // where two uploads read the same max concurrently.
        let version = self.next_version(&requirement_id).await?;

        let result = self
            .db
            .query(
                "CREATE type::record('document', $id) SET \
                 requirement_id = $requirement_id, \
                 storage_path = $storage_path, \
                 file_name = $file_name, \
                 version = $version, \
                 status = 'Pending', \
                 expires_at = $expires_at, \
                 deleted = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("requirement_id", requirement_id))
            .bind(("storage_path", input.storage_path))
            .bind(("file_name", input.file_name))
            .bind(("version", version))
            .bind(("expires_at", input.expires_at.map(format_date)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "document"))?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "document".into(),
            id: id_str,
        })?;

        Ok(row.into_document(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> DocuviResult<Document> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('document', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "document".into(),
            id: id_str,
        })?;

        Ok(row.into_document(id)?)
    }

    async fn list_by_requirement(&self, requirement_id: Uuid) -> DocuviResult<Vec<Document>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM document \
                 WHERE requirement_id = $requirement_id AND deleted = false \
                 ORDER BY version DESC",
            )
            .bind(("requirement_id", requirement_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_document())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn latest(&self, requirement_id: Uuid) -> DocuviResult<Option<Document>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM document \
                 WHERE requirement_id = $requirement_id AND deleted = false \
                 ORDER BY version DESC LIMIT 1",
            )
            .bind(("requirement_id", requirement_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.try_into_document())
            .transpose()?)
    }

    async fn latest_approved(&self, requirement_id: Uuid) -> DocuviResult<Option<Document>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM document \
                 WHERE requirement_id = $requirement_id \
                 AND status = 'Approved' AND deleted = false \
                 ORDER BY version DESC LIMIT 1",
            )
            .bind(("requirement_id", requirement_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.try_into_document())
            .transpose()?)
    }

    async fn approve(
        &self,
        id: Uuid,
        approved_by: Uuid,
        expires_at: Option<NaiveDate>,
    ) -> DocuviResult<Document> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('document', $id) SET \
                 status = 'Approved', \
                 rejection_reason = NONE, \
                 approved_by = $approved_by, \
                 approved_at = time::now(), \
                 expires_at = $expires_at, \
                 updated_at = time::now() \
                 WHERE status = 'Pending' AND deleted = false",
            )
            .bind(("id", id_str))
            .bind(("approved_by", approved_by.to_string()))
            .bind(("expires_at", expires_at.map(format_date)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_document(id)?),
            None => Err(self.review_miss(id).await),
        }
    }

    async fn reject(&self, id: Uuid, reason: &str) -> DocuviResult<Document> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('document', $id) SET \
                 status = 'Rejected', \
                 rejection_reason = $reason, \
                 updated_at = time::now() \
                 WHERE status = 'Pending' AND deleted = false",
            )
            .bind(("id", id_str))
            .bind(("reason", reason.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_document(id)?),
            None => Err(self.review_miss(id).await),
        }
    }

    async fn mark_deleted(&self, id: Uuid, deleted_by: Uuid) -> DocuviResult<()> {
        self.db
            .query(
                "UPDATE type::record('document', $id) SET \
                 deleted = true, \
                 deleted_by = $deleted_by, \
                 deleted_at = time::now(), \
                 updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("deleted_by", deleted_by.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn restore(&self, id: Uuid) -> DocuviResult<()> {
        self.db
            .query(
                "UPDATE type::record('document', $id) SET \
                 deleted = false, \
                 deleted_by = NONE, \
                 deleted_at = NONE, \
                 updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_pending(&self) -> DocuviResult<Vec<Document>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM document \
                 WHERE status = 'Pending' AND deleted = false \
                 ORDER BY uploaded_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_document())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn list_expiring_within(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> DocuviResult<Vec<ExpiringDocument>> {
        let cutoff = today + chrono::Duration::days(days);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM document \
                 WHERE status = 'Approved' AND deleted = false \
                 AND expires_at != NONE \
                 AND expires_at >= $today AND expires_at <= $cutoff \
                 ORDER BY expires_at ASC",
            )
            .bind(("today", format_date(today)))
            .bind(("cutoff", format_date(cutoff)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;
        let docs = rows
            .into_iter()
            .map(|row| row.try_into_document())
            .collect::<Result<Vec<_>, DbError>>()?;

        let mut expiring = Vec::with_capacity(docs.len());
        for doc in docs {
            let expires_at = match doc.expires_at {
                Some(d) => d,
                None => continue,
            };

            // Resolve the owning client for notification routing.
            let mut req_result = self
                .db
                .query("SELECT client_id FROM type::record('requirement', $id)")
                .bind(("id", doc.requirement_id.to_string()))
                .await
                .map_err(DbError::from)?;
            let req_rows: Vec<RequirementClientRow> =
                req_result.take(0).map_err(DbError::from)?;
            let client_row = req_rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                entity: "requirement".into(),
                id: doc.requirement_id.to_string(),
            })?;
            let client_id = Uuid::parse_str(&client_row.client_id)
                .map_err(|e| DbError::Decode(format!("invalid client_id UUID: {e}")))?;

            expiring.push(ExpiringDocument {
                document_id: doc.id,
                requirement_id: doc.requirement_id,
                client_id,
                expires_at,
                days_remaining: (expires_at - today).num_days(),
            });
        }

        Ok(expiring)
    }
}
