//! SurrealDB implementation of [`NotificationRepository`].

use chrono::{DateTime, Utc};
use docuvi_core::error::DocuviResult;
use docuvi_core::models::notification::{CreateNotification, Notification, NotificationKind};
use docuvi_core::repository::NotificationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

fn parse_kind(s: &str) -> Result<NotificationKind, DbError> {
    match s {
        "DocumentApproved" => Ok(NotificationKind::DocumentApproved),
        "DocumentRejected" => Ok(NotificationKind::DocumentRejected),
        "DocumentExpiringSoon" => Ok(NotificationKind::DocumentExpiringSoon),
        "CertificateIssued" => Ok(NotificationKind::CertificateIssued),
        "CertificateRevoked" => Ok(NotificationKind::CertificateRevoked),
        other => Err(DbError::Decode(format!(
            "unknown notification kind: {other}"
        ))),
    }
}

fn kind_to_string(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::DocumentApproved => "DocumentApproved",
        NotificationKind::DocumentRejected => "DocumentRejected",
        NotificationKind::DocumentExpiringSoon => "DocumentExpiringSoon",
        NotificationKind::CertificateIssued => "CertificateIssued",
        NotificationKind::CertificateRevoked => "CertificateRevoked",
    }
}

fn parse_opt_uuid(s: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    s.map(|v| {
        Uuid::parse_str(&v).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
    })
    .transpose()
}

#[derive(Debug, SurrealValue)]
struct NotificationRow {
    user_id: String,
    kind: String,
    title: String,
    message: String,
    read: bool,
    document_id: Option<String>,
    certificate_id: Option<String>,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct NotificationRowWithId {
    record_id: String,
    user_id: String,
    kind: String,
    title: String,
    message: String,
    read: bool,
    document_id: Option<String>,
    certificate_id: Option<String>,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl NotificationRow {
    fn into_notification(self, id: Uuid) -> Result<Notification, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Decode(format!("invalid user_id UUID: {e}")))?;
        Ok(Notification {
            id,
            user_id,
            kind: parse_kind(&self.kind)?,
            title: self.title,
            message: self.message,
            read: self.read,
            document_id: parse_opt_uuid(self.document_id, "document")?,
            certificate_id: parse_opt_uuid(self.certificate_id, "certificate")?,
            created_at: self.created_at,
            read_at: self.read_at,
        })
    }
}

impl NotificationRowWithId {
    fn try_into_notification(self) -> Result<Notification, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Decode(format!("invalid user_id UUID: {e}")))?;
        Ok(Notification {
            id,
            user_id,
            kind: parse_kind(&self.kind)?,
            title: self.title,
            message: self.message,
            read: self.read,
            document_id: parse_opt_uuid(self.document_id, "document")?,
            certificate_id: parse_opt_uuid(self.certificate_id, "certificate")?,
            created_at: self.created_at,
            read_at: self.read_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the notification repository.
#[derive(Clone)]
pub struct SurrealNotificationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNotificationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> NotificationRepository for SurrealNotificationRepository<C> {
    async fn create(&self, input: CreateNotification) -> DocuviResult<Notification> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('notification', $id) SET \
                 user_id = $user_id, \
                 kind = $kind, \
                 title = $title, \
                 message = $message, \
                 read = false, \
                 document_id = $document_id, \
                 certificate_id = $certificate_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("kind", kind_to_string(input.kind).to_string()))
            .bind(("title", input.title))
            .bind(("message", input.message))
            .bind(("document_id", input.document_id.map(|d| d.to_string())))
            .bind((
                "certificate_id",
                input.certificate_id.map(|c| c.to_string()),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "notification"))?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> DocuviResult<Vec<Notification>> {
        let query = if unread_only {
            "SELECT meta::id(id) AS record_id, * FROM notification \
             WHERE user_id = $user_id AND read = false \
             ORDER BY created_at DESC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM notification \
             WHERE user_id = $user_id \
             ORDER BY created_at DESC"
        };

        let mut result = self
            .db
            .query(query)
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_notification())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn unread_count(&self, user_id: Uuid) -> DocuviResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM notification \
                 WHERE user_id = $user_id AND read = false GROUP ALL",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn mark_read(&self, id: Uuid) -> DocuviResult<Notification> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('notification', $id) SET \
                 read = true, read_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> DocuviResult<u64> {
        let user_id_str = user_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM notification \
                 WHERE user_id = $user_id AND read = false GROUP ALL",
            )
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        if total > 0 {
            self.db
                .query(
                    "UPDATE notification SET read = true, read_at = time::now() \
                     WHERE user_id = $user_id AND read = false",
                )
                .bind(("user_id", user_id_str))
                .await
                .map_err(DbError::from)?;
        }

        Ok(total)
    }

    async fn delete(&self, id: Uuid) -> DocuviResult<()> {
        self.db
            .query("DELETE type::record('notification', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
