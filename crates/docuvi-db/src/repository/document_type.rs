//! SurrealDB implementation of [`DocumentTypeRepository`].

use chrono::{DateTime, Utc};
use docuvi_core::error::DocuviResult;
use docuvi_core::models::document_type::{CreateDocumentType, DocumentType, UpdateDocumentType};
use docuvi_core::repository::DocumentTypeRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct DocumentTypeRow {
    name: String,
    description: Option<String>,
    active: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DocumentTypeRowWithId {
    record_id: String,
    name: String,
    description: Option<String>,
    active: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentTypeRow {
    fn into_document_type(self, id: Uuid) -> Result<DocumentType, DbError> {
        let created_by = Uuid::parse_str(&self.created_by)
            .map_err(|e| DbError::Decode(format!("invalid created_by UUID: {e}")))?;
        Ok(DocumentType {
            id,
            name: self.name,
            description: self.description,
            active: self.active,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DocumentTypeRowWithId {
    fn try_into_document_type(self) -> Result<DocumentType, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let created_by = Uuid::parse_str(&self.created_by)
            .map_err(|e| DbError::Decode(format!("invalid created_by UUID: {e}")))?;
        Ok(DocumentType {
            id,
            name: self.name,
            description: self.description,
            active: self.active,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the document type catalog repository.
#[derive(Clone)]
pub struct SurrealDocumentTypeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDocumentTypeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DocumentTypeRepository for SurrealDocumentTypeRepository<C> {
    async fn create(&self, input: CreateDocumentType) -> DocuviResult<DocumentType> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('document_type', $id) SET \
                 name = $name, \
                 description = $description, \
                 active = true, \
                 created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("created_by", input.created_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "document_type"))?;

        let rows: Vec<DocumentTypeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "document_type".into(),
            id: id_str,
        })?;

        Ok(row.into_document_type(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> DocuviResult<DocumentType> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('document_type', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentTypeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "document_type".into(),
            id: id_str,
        })?;

        Ok(row.into_document_type(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateDocumentType) -> DocuviResult<DocumentType> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('document_type', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "document_type"))?;

        let rows: Vec<DocumentTypeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "document_type".into(),
            id: id_str,
        })?;

        Ok(row.into_document_type(id)?)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> DocuviResult<DocumentType> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('document_type', $id) SET \
                 active = $active, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("active", active))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentTypeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "document_type".into(),
            id: id_str,
        })?;

        Ok(row.into_document_type(id)?)
    }

    async fn list(&self, active_only: bool) -> DocuviResult<Vec<DocumentType>> {
        let query = if active_only {
            "SELECT meta::id(id) AS record_id, * FROM document_type \
             WHERE active = true ORDER BY name ASC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM document_type \
             ORDER BY name ASC"
        };

        let mut result = self.db.query(query).await.map_err(DbError::from)?;

        let rows: Vec<DocumentTypeRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_document_type())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}
