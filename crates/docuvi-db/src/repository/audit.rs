//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! Entries are append-only; the table permissions reject updates and
//! deletes so there is no way to rewrite history through this layer.

use chrono::{DateTime, Utc};
use docuvi_core::error::DocuviResult;
use docuvi_core::models::audit::{AuditLogEntry, CreateAuditLogEntry};
use docuvi_core::repository::{AuditLogFilter, AuditLogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditRow {
    actor_id: String,
    action: String,
    entity: String,
    entity_id: Option<String>,
    detail: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    actor_id: String,
    action: String,
    entity: String,
    entity_id: Option<String>,
    detail: String,
    timestamp: DateTime<Utc>,
}

fn decode_detail(detail: &str) -> Result<serde_json::Value, DbError> {
    serde_json::from_str(detail)
        .map_err(|e| DbError::Decode(format!("invalid audit detail JSON: {e}")))
}

impl AuditRow {
    fn into_entry(self, id: Uuid) -> Result<AuditLogEntry, DbError> {
        let actor_id = Uuid::parse_str(&self.actor_id)
            .map_err(|e| DbError::Decode(format!("invalid actor_id UUID: {e}")))?;
        let entity_id = self
            .entity_id
            .map(|v| {
                Uuid::parse_str(&v)
                    .map_err(|e| DbError::Decode(format!("invalid entity_id UUID: {e}")))
            })
            .transpose()?;
        Ok(AuditLogEntry {
            id,
            actor_id,
            action: self.action,
            entity: self.entity,
            entity_id,
            detail: decode_detail(&self.detail)?,
            timestamp: self.timestamp,
        })
    }
}

impl AuditRowWithId {
    fn try_into_entry(self) -> Result<AuditLogEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let actor_id = Uuid::parse_str(&self.actor_id)
            .map_err(|e| DbError::Decode(format!("invalid actor_id UUID: {e}")))?;
        let entity_id = self
            .entity_id
            .map(|v| {
                Uuid::parse_str(&v)
                    .map_err(|e| DbError::Decode(format!("invalid entity_id UUID: {e}")))
            })
            .transpose()?;
        Ok(AuditLogEntry {
            id,
            actor_id,
            action: self.action,
            entity: self.entity,
            entity_id,
            detail: decode_detail(&self.detail)?,
            timestamp: self.timestamp,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the append-only audit log repository.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

fn filter_clauses(filter: &AuditLogFilter) -> Vec<&'static str> {
    let mut clauses = Vec::new();
    if filter.actor_id.is_some() {
        clauses.push("actor_id = $actor_id");
    }
    if filter.action.is_some() {
        clauses.push("action = $action");
    }
    if filter.entity.is_some() {
        clauses.push("entity = $entity");
    }
    if filter.from.is_some() {
        clauses.push("timestamp >= $from");
    }
    if filter.to.is_some() {
        clauses.push("timestamp <= $to");
    }
    clauses
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditLogEntry) -> DocuviResult<AuditLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let detail = serde_json::to_string(&input.detail)
            .map_err(|e| DbError::Query(format!("audit detail serialization failed: {e}")))?;

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 actor_id = $actor_id, \
                 action = $action, \
                 entity = $entity, \
                 entity_id = $entity_id, \
                 detail = $detail",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("action", input.action))
            .bind(("entity", input.entity))
            .bind(("entity_id", input.entity_id.map(|e| e.to_string())))
            .bind(("detail", detail))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "audit_log"))?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_log".into(),
            id: id_str,
        })?;

        Ok(row.into_entry(id)?)
    }

    async fn list(
        &self,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> DocuviResult<PaginatedResult<AuditLogEntry>> {
        let clauses = filter_clauses(&filter);
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", clauses.join(" AND "))
        };

        let count_query =
            format!("SELECT count() AS total FROM audit_log {where_clause}GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM audit_log \
             {where_clause}ORDER BY timestamp DESC \
             LIMIT $limit START $offset"
        );

        let mut count_builder = self.db.query(&count_query);
        let mut list_builder = self
            .db
            .query(&list_query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        if let Some(actor_id) = filter.actor_id {
            let v = actor_id.to_string();
            count_builder = count_builder.bind(("actor_id", v.clone()));
            list_builder = list_builder.bind(("actor_id", v));
        }
        if let Some(action) = filter.action {
            count_builder = count_builder.bind(("action", action.clone()));
            list_builder = list_builder.bind(("action", action));
        }
        if let Some(entity) = filter.entity {
            count_builder = count_builder.bind(("entity", entity.clone()));
            list_builder = list_builder.bind(("entity", entity));
        }
        if let Some(from) = filter.from {
            count_builder = count_builder.bind(("from", from));
            list_builder = list_builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            count_builder = count_builder.bind(("to", to));
            list_builder = list_builder.bind(("to", to));
        }

        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = list_builder.await.map_err(DbError::from)?;
        let rows: Vec<AuditRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
