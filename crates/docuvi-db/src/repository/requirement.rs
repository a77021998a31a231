//! SurrealDB implementation of [`RequirementRepository`].

use chrono::{DateTime, Utc};
use docuvi_core::error::DocuviResult;
use docuvi_core::models::requirement::{CreateRequirement, Requirement, UpdateRequirement};
use docuvi_core::repository::RequirementRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RequirementRow {
    client_id: String,
    document_type_id: String,
    mandatory: bool,
    renewal_months: Option<u32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RequirementRowWithId {
    record_id: String,
    client_id: String,
    document_type_id: String,
    mandatory: bool,
    renewal_months: Option<u32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RequirementRow {
    fn into_requirement(self, id: Uuid) -> Result<Requirement, DbError> {
        let client_id = Uuid::parse_str(&self.client_id)
            .map_err(|e| DbError::Decode(format!("invalid client_id UUID: {e}")))?;
        let document_type_id = Uuid::parse_str(&self.document_type_id)
            .map_err(|e| DbError::Decode(format!("invalid document_type_id UUID: {e}")))?;
        Ok(Requirement {
            id,
            client_id,
            document_type_id,
            mandatory: self.mandatory,
            renewal_months: self.renewal_months,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl RequirementRowWithId {
    fn try_into_requirement(self) -> Result<Requirement, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let client_id = Uuid::parse_str(&self.client_id)
            .map_err(|e| DbError::Decode(format!("invalid client_id UUID: {e}")))?;
        let document_type_id = Uuid::parse_str(&self.document_type_id)
            .map_err(|e| DbError::Decode(format!("invalid document_type_id UUID: {e}")))?;
        Ok(Requirement {
            id,
            client_id,
            document_type_id,
            mandatory: self.mandatory,
            renewal_months: self.renewal_months,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the requirement repository.
#[derive(Clone)]
pub struct SurrealRequirementRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRequirementRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RequirementRepository for SurrealRequirementRepository<C> {
    async fn create(&self, input: CreateRequirement) -> DocuviResult<Requirement> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('requirement', $id) SET \
                 client_id = $client_id, \
                 document_type_id = $document_type_id, \
                 mandatory = $mandatory, \
                 renewal_months = $renewal_months",
            )
            .bind(("id", id_str.clone()))
            .bind(("client_id", input.client_id.to_string()))
            .bind(("document_type_id", input.document_type_id.to_string()))
            .bind(("mandatory", input.mandatory))
            .bind(("renewal_months", input.renewal_months))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "requirement"))?;

        let rows: Vec<RequirementRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "requirement".into(),
            id: id_str,
        })?;

        Ok(row.into_requirement(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> DocuviResult<Requirement> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('requirement', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequirementRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "requirement".into(),
            id: id_str,
        })?;

        Ok(row.into_requirement(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateRequirement) -> DocuviResult<Requirement> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.mandatory.is_some() {
            sets.push("mandatory = $mandatory");
        }
        if input.renewal_months.is_some() {
            sets.push("renewal_months = $renewal_months");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('requirement', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(mandatory) = input.mandatory {
            builder = builder.bind(("mandatory", mandatory));
        }
        if let Some(renewal_months) = input.renewal_months {
            builder = builder.bind(("renewal_months", renewal_months));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "requirement"))?;

        let rows: Vec<RequirementRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "requirement".into(),
            id: id_str,
        })?;

        Ok(row.into_requirement(id)?)
    }

    async fn delete(&self, id: Uuid) -> DocuviResult<()> {
        self.db
            .query("DELETE type::record('requirement', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(e, "requirement"))?;

        Ok(())
    }

    async fn list_by_client(&self, client_id: Uuid) -> DocuviResult<Vec<Requirement>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM requirement \
                 WHERE client_id = $client_id \
                 ORDER BY created_at ASC",
            )
            .bind(("client_id", client_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequirementRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_requirement())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn list_mandatory_by_client(&self, client_id: Uuid) -> DocuviResult<Vec<Requirement>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM requirement \
                 WHERE client_id = $client_id AND mandatory = true \
                 ORDER BY created_at ASC",
            )
            .bind(("client_id", client_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequirementRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_requirement())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}
