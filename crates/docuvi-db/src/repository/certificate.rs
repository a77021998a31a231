//! SurrealDB implementation of [`CertificateRepository`].
//!
//! Validity dates are stored as ISO `YYYY-MM-DD` strings; the sweep and
//! expiry-window queries compare them lexically, which matches calendar
//! order for this format.

use chrono::{DateTime, NaiveDate, Utc};
use docuvi_core::error::{DocuviError, DocuviResult};
use docuvi_core::models::certificate::{
    Certificate, CertificateDetail, CertificateStatus, CreateCertificate,
    CreateCertificateDetail,
};
use docuvi_core::repository::{CertificateRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::document::{format_date, parse_date};

fn parse_status(s: &str) -> Result<CertificateStatus, DbError> {
    match s {
        "Active" => Ok(CertificateStatus::Active),
        "Revoked" => Ok(CertificateStatus::Revoked),
        "Expired" => Ok(CertificateStatus::Expired),
        other => Err(DbError::Decode(format!(
            "unknown certificate status: {other}"
        ))),
    }
}

fn parse_opt_uuid(s: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    s.map(|v| {
        Uuid::parse_str(&v).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
    })
    .transpose()
}

#[derive(Debug, SurrealValue)]
struct CertificateRow {
    code: String,
    hash: String,
    client_id: String,
    issued_by: String,
    issued_at: DateTime<Utc>,
    valid_from: String,
    valid_to: String,
    status: String,
    revocation_reason: Option<String>,
    revoked_by: Option<String>,
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CertificateRowWithId {
    record_id: String,
    code: String,
    hash: String,
    client_id: String,
    issued_by: String,
    issued_at: DateTime<Utc>,
    valid_from: String,
    valid_to: String,
    status: String,
    revocation_reason: Option<String>,
    revoked_by: Option<String>,
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CertificateRow {
    fn into_certificate(self, id: Uuid) -> Result<Certificate, DbError> {
        let client_id = Uuid::parse_str(&self.client_id)
            .map_err(|e| DbError::Decode(format!("invalid client_id UUID: {e}")))?;
        let issued_by = Uuid::parse_str(&self.issued_by)
            .map_err(|e| DbError::Decode(format!("invalid issued_by UUID: {e}")))?;
        Ok(Certificate {
            id,
            code: self.code,
            hash: self.hash,
            client_id,
            issued_by,
            issued_at: self.issued_at,
            valid_from: parse_date(&self.valid_from)?,
            valid_to: parse_date(&self.valid_to)?,
            status: parse_status(&self.status)?,
            revocation_reason: self.revocation_reason,
            revoked_by: parse_opt_uuid(self.revoked_by, "revoked_by")?,
            revoked_at: self.revoked_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CertificateRowWithId {
    fn try_into_certificate(self) -> Result<Certificate, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let client_id = Uuid::parse_str(&self.client_id)
            .map_err(|e| DbError::Decode(format!("invalid client_id UUID: {e}")))?;
        let issued_by = Uuid::parse_str(&self.issued_by)
            .map_err(|e| DbError::Decode(format!("invalid issued_by UUID: {e}")))?;
        Ok(Certificate {
            id,
            code: self.code,
            hash: self.hash,
            client_id,
            issued_by,
            issued_at: self.issued_at,
            valid_from: parse_date(&self.valid_from)?,
            valid_to: parse_date(&self.valid_to)?,
            status: parse_status(&self.status)?,
            revocation_reason: self.revocation_reason,
            revoked_by: parse_opt_uuid(self.revoked_by, "revoked_by")?,
            revoked_at: self.revoked_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct DetailRowWithId {
    record_id: String,
    certificate_id: String,
    requirement_id: String,
    document_id: String,
    document_type_name: String,
    approved_at: DateTime<Utc>,
    expires_at: Option<String>,
    approved_by: String,
    created_at: DateTime<Utc>,
}

impl DetailRowWithId {
    fn try_into_detail(self) -> Result<CertificateDetail, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let certificate_id = Uuid::parse_str(&self.certificate_id)
            .map_err(|e| DbError::Decode(format!("invalid certificate_id UUID: {e}")))?;
        let requirement_id = Uuid::parse_str(&self.requirement_id)
            .map_err(|e| DbError::Decode(format!("invalid requirement_id UUID: {e}")))?;
        let document_id = Uuid::parse_str(&self.document_id)
            .map_err(|e| DbError::Decode(format!("invalid document_id UUID: {e}")))?;
        let approved_by = Uuid::parse_str(&self.approved_by)
            .map_err(|e| DbError::Decode(format!("invalid approved_by UUID: {e}")))?;
        Ok(CertificateDetail {
            id,
            certificate_id,
            requirement_id,
            document_id,
            document_type_name: self.document_type_name,
            approved_at: self.approved_at,
            expires_at: self.expires_at.as_deref().map(parse_date).transpose()?,
            approved_by,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the certificate repository.
#[derive(Clone)]
pub struct SurrealCertificateRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCertificateRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CertificateRepository for SurrealCertificateRepository<C> {
    async fn create(&self, input: CreateCertificate) -> DocuviResult<Certificate> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('certificate', $id) SET \
                 code = $code, \
                 hash = $hash, \
                 client_id = $client_id, \
                 issued_by = $issued_by, \
                 valid_from = $valid_from, \
                 valid_to = $valid_to, \
                 status = 'Active'",
            )
            .bind(("id", id_str.clone()))
            .bind(("code", input.code))
            .bind(("hash", input.hash))
            .bind(("client_id", input.client_id.to_string()))
            .bind(("issued_by", input.issued_by.to_string()))
            .bind(("valid_from", format_date(input.valid_from)))
            .bind(("valid_to", format_date(input.valid_to)))
            .await
            .map_err(DbError::from)?;

        // Code collisions surface as AlreadyExists via the unique index.
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "certificate"))?;

        let rows: Vec<CertificateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "certificate".into(),
            id: id_str,
        })?;

        Ok(row.into_certificate(id)?)
    }

    async fn create_details(
        &self,
        certificate_id: Uuid,
        details: Vec<CreateCertificateDetail>,
    ) -> DocuviResult<Vec<CertificateDetail>> {
        let cert_id_str = certificate_id.to_string();
        let mut created = Vec::with_capacity(details.len());

        for detail in details {
            let id = Uuid::new_v4();
            let id_str = id.to_string();

            let result = self
                .db
                .query(
                    "CREATE type::record('certificate_detail', $id) SET \
                     certificate_id = $certificate_id, \
                     requirement_id = $requirement_id, \
                     document_id = $document_id, \
                     document_type_name = $document_type_name, \
                     approved_at = $approved_at, \
                     expires_at = $expires_at, \
                     approved_by = $approved_by",
                )
                .bind(("id", id_str.clone()))
                .bind(("certificate_id", cert_id_str.clone()))
                .bind(("requirement_id", detail.requirement_id.to_string()))
                .bind(("document_id", detail.document_id.to_string()))
                .bind(("document_type_name", detail.document_type_name.clone()))
                .bind(("approved_at", detail.approved_at))
                .bind(("expires_at", detail.expires_at.map(format_date)))
                .bind(("approved_by", detail.approved_by.to_string()))
                .await
                .map_err(DbError::from)?;

            result
                .check()
                .map_err(|e| DbError::from_check(e, "certificate_detail"))?;

            created.push(CertificateDetail {
                id,
                certificate_id,
                requirement_id: detail.requirement_id,
                document_id: detail.document_id,
                document_type_name: detail.document_type_name,
                approved_at: detail.approved_at,
                expires_at: detail.expires_at,
                approved_by: detail.approved_by,
                created_at: Utc::now(),
            });
        }

        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> DocuviResult<()> {
        let id_str = id.to_string();

        self.db
            .query("DELETE certificate_detail WHERE certificate_id = $id")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        self.db
            .query("DELETE type::record('certificate', $id)")
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> DocuviResult<Certificate> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('certificate', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "certificate".into(),
            id: id_str,
        })?;

        Ok(row.into_certificate(id)?)
    }

    async fn get_by_code(&self, code: &str) -> DocuviResult<Option<Certificate>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM certificate \
                 WHERE code = $code",
            )
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.try_into_certificate())
            .transpose()?)
    }

    async fn get_details(&self, certificate_id: Uuid) -> DocuviResult<Vec<CertificateDetail>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM certificate_detail \
                 WHERE certificate_id = $certificate_id \
                 ORDER BY document_type_name ASC",
            )
            .bind(("certificate_id", certificate_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DetailRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_detail())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn list_by_client(&self, client_id: Uuid) -> DocuviResult<Vec<Certificate>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM certificate \
                 WHERE client_id = $client_id \
                 ORDER BY issued_at DESC",
            )
            .bind(("client_id", client_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_certificate())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn list(&self, pagination: Pagination) -> DocuviResult<PaginatedResult<Certificate>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM certificate GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM certificate \
                 ORDER BY issued_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_certificate())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn revoke(&self, id: Uuid, reason: &str, revoked_by: Uuid) -> DocuviResult<Certificate> {
        // Active-only so a concurrent revoke or sweep can never
        // overwrite an earlier revocation's reason and actor.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('certificate', $id) SET \
                 status = 'Revoked', \
                 revocation_reason = $reason, \
                 revoked_by = $revoked_by, \
                 revoked_at = time::now(), \
                 updated_at = time::now() \
                 WHERE status = 'Active'",
            )
            .bind(("id", id.to_string()))
            .bind(("reason", reason.to_string()))
            .bind(("revoked_by", revoked_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_certificate(id)?),
            // Nothing matched: absent or already terminal. Re-read to
            // report which.
            None => {
                let current = self.get_by_id(id).await?;
                match current.status {
                    CertificateStatus::Revoked => {
                        Err(DocuviError::AlreadyRevoked { code: current.code })
                    }
                    _ => Err(DocuviError::CertificateNotActive { code: current.code }),
                }
            }
        }
    }

    async fn mark_expired_before(&self, today: NaiveDate) -> DocuviResult<u64> {
        let today_str = format_date(today);

        // Count first so the caller gets an accurate transition count
        // even though UPDATE returns full rows.
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM certificate \
                 WHERE status = 'Active' AND valid_to < $today GROUP ALL",
            )
            .bind(("today", today_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        if total > 0 {
            self.db
                .query(
                    "UPDATE certificate SET \
                     status = 'Expired', updated_at = time::now() \
                     WHERE status = 'Active' AND valid_to < $today",
                )
                .bind(("today", today_str))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(|e| DbError::from_check(e, "certificate"))?;
        }

        Ok(total)
    }

    async fn list_expiring_within(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> DocuviResult<Vec<Certificate>> {
        let cutoff = today + chrono::Duration::days(days);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM certificate \
                 WHERE status = 'Active' \
                 AND valid_to >= $today AND valid_to <= $cutoff \
                 ORDER BY valid_to ASC",
            )
            .bind(("today", format_date(today)))
            .bind(("cutoff", format_date(cutoff)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_certificate())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }
}
