//! SurrealDB implementation of [`ClientRepository`].

use chrono::{DateTime, Utc};
use docuvi_core::error::DocuviResult;
use docuvi_core::models::client::{Client, CreateClient, UpdateClient};
use docuvi_core::repository::{ClientRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ClientRow {
    company_name: String,
    contact_email: String,
    contact_phone: Option<String>,
    user_id: Option<String>,
    active: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ClientRowWithId {
    record_id: String,
    company_name: String,
    contact_email: String,
    contact_phone: Option<String>,
    user_id: Option<String>,
    active: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_opt_uuid(s: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    s.map(|v| {
        Uuid::parse_str(&v).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
    })
    .transpose()
}

impl ClientRow {
    fn into_client(self, id: Uuid) -> Result<Client, DbError> {
        let created_by = Uuid::parse_str(&self.created_by)
            .map_err(|e| DbError::Decode(format!("invalid created_by UUID: {e}")))?;
        Ok(Client {
            id,
            company_name: self.company_name,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            user_id: parse_opt_uuid(self.user_id, "user")?,
            active: self.active,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ClientRowWithId {
    fn try_into_client(self) -> Result<Client, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let created_by = Uuid::parse_str(&self.created_by)
            .map_err(|e| DbError::Decode(format!("invalid created_by UUID: {e}")))?;
        Ok(Client {
            id,
            company_name: self.company_name,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            user_id: parse_opt_uuid(self.user_id, "user")?,
            active: self.active,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Client repository.
#[derive(Clone)]
pub struct SurrealClientRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealClientRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ClientRepository for SurrealClientRepository<C> {
    async fn create(&self, input: CreateClient) -> DocuviResult<Client> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('client', $id) SET \
                 company_name = $company_name, \
                 contact_email = $contact_email, \
                 contact_phone = $contact_phone, \
                 user_id = $user_id, \
                 active = true, \
                 created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("company_name", input.company_name))
            .bind(("contact_email", input.contact_email))
            .bind(("contact_phone", input.contact_phone))
            .bind(("user_id", input.user_id.map(|u| u.to_string())))
            .bind(("created_by", input.created_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "client"))?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client".into(),
            id: id_str,
        })?;

        Ok(row.into_client(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> DocuviResult<Client> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('client', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client".into(),
            id: id_str,
        })?;

        Ok(row.into_client(id)?)
    }

    async fn get_by_user(&self, user_id: Uuid) -> DocuviResult<Client> {
        let user_id_str = user_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM client \
                 WHERE user_id = $user_id",
            )
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client".into(),
            id: format!("user_id={user_id_str}"),
        })?;

        Ok(row.try_into_client()?)
    }

    async fn update(&self, id: Uuid, input: UpdateClient) -> DocuviResult<Client> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.company_name.is_some() {
            sets.push("company_name = $company_name");
        }
        if input.contact_email.is_some() {
            sets.push("contact_email = $contact_email");
        }
        if input.contact_phone.is_some() {
            sets.push("contact_phone = $contact_phone");
        }
        if input.user_id.is_some() {
            sets.push("user_id = $user_id");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('client', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(company_name) = input.company_name {
            builder = builder.bind(("company_name", company_name));
        }
        if let Some(contact_email) = input.contact_email {
            builder = builder.bind(("contact_email", contact_email));
        }
        if let Some(contact_phone) = input.contact_phone {
            // Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("contact_phone", contact_phone));
        }
        if let Some(user_id) = input.user_id {
            builder = builder.bind(("user_id", user_id.map(|u| u.to_string())));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "client"))?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client".into(),
            id: id_str,
        })?;

        Ok(row.into_client(id)?)
    }

    async fn deactivate(&self, id: Uuid) -> DocuviResult<()> {
        // Soft-disable: history (documents, certificates) stays intact.
        self.db
            .query(
                "UPDATE type::record('client', $id) SET \
                 active = false, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> DocuviResult<PaginatedResult<Client>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM client GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM client \
                 ORDER BY company_name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_client())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn search(&self, term: &str) -> DocuviResult<Vec<Client>> {
        let pattern = term.to_lowercase();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM client \
                 WHERE string::lowercase(company_name) CONTAINS $term \
                 OR string::lowercase(contact_email) CONTAINS $term \
                 ORDER BY company_name ASC",
            )
            .bind(("term", pattern))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_client())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}
