//! Database-specific error types and conversions.

use docuvi_core::error::DocuviError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Row decode failed: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl DbError {
    /// Classify a per-statement error from `Response::check`. Unique
    /// index violations become `AlreadyExists` so callers (e.g. the
    /// certificate code generator) can react; everything else is a
    /// generic query failure.
    pub(crate) fn from_check(e: surrealdb::Error, entity: &str) -> Self {
        let msg = e.to_string();
        if msg.contains("already contains") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(msg)
        }
    }
}

impl From<DbError> for DocuviError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => DocuviError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => DocuviError::AlreadyExists { entity },
            other => DocuviError::Database(other.to_string()),
        }
    }
}
