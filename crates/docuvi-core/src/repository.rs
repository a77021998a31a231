//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The certificate lifecycle
//! services in `docuvi-cert` are generic over these traits so they carry
//! no dependency on the database crate.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::DocuviResult;
use crate::models::{
    audit::{AuditLogEntry, CreateAuditLogEntry},
    certificate::{
        Certificate, CertificateDetail, CreateCertificate, CreateCertificateDetail,
    },
    client::{Client, CreateClient, UpdateClient},
    document::{CreateDocument, Document, ExpiringDocument},
    document_type::{CreateDocumentType, DocumentType, UpdateDocumentType},
    notification::{CreateNotification, Notification},
    requirement::{CreateRequirement, Requirement, UpdateRequirement},
    user::{CreateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Accounts & clients
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = DocuviResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DocuviResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = DocuviResult<User>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = DocuviResult<PaginatedResult<User>>> + Send;
}

pub trait ClientRepository: Send + Sync {
    fn create(&self, input: CreateClient) -> impl Future<Output = DocuviResult<Client>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DocuviResult<Client>> + Send;
    /// Resolve the client a user account is linked to.
    fn get_by_user(&self, user_id: Uuid) -> impl Future<Output = DocuviResult<Client>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateClient,
    ) -> impl Future<Output = DocuviResult<Client>> + Send;
    /// Soft-disable: clears the `active` flag, keeps all data.
    fn deactivate(&self, id: Uuid) -> impl Future<Output = DocuviResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = DocuviResult<PaginatedResult<Client>>> + Send;
    /// Case-insensitive substring match on company name or contact email.
    fn search(&self, term: &str) -> impl Future<Output = DocuviResult<Vec<Client>>> + Send;
}

// ---------------------------------------------------------------------------
// Document catalog & requirements
// ---------------------------------------------------------------------------

pub trait DocumentTypeRepository: Send + Sync {
    /// Create a catalog entry. Duplicate names fail with `AlreadyExists`.
    fn create(
        &self,
        input: CreateDocumentType,
    ) -> impl Future<Output = DocuviResult<DocumentType>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DocuviResult<DocumentType>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateDocumentType,
    ) -> impl Future<Output = DocuviResult<DocumentType>> + Send;
    fn set_active(
        &self,
        id: Uuid,
        active: bool,
    ) -> impl Future<Output = DocuviResult<DocumentType>> + Send;
    /// List catalog entries; `active_only` filters out disabled ones.
    fn list(
        &self,
        active_only: bool,
    ) -> impl Future<Output = DocuviResult<Vec<DocumentType>>> + Send;
}

pub trait RequirementRepository: Send + Sync {
    /// Assign a requirement. A second requirement for the same
    /// (client, document type) pair fails with `AlreadyExists`.
    fn create(
        &self,
        input: CreateRequirement,
    ) -> impl Future<Output = DocuviResult<Requirement>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DocuviResult<Requirement>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateRequirement,
    ) -> impl Future<Output = DocuviResult<Requirement>> + Send;
    /// Hard delete. Available for corrections; normal flows never call it.
    fn delete(&self, id: Uuid) -> impl Future<Output = DocuviResult<()>> + Send;
    fn list_by_client(
        &self,
        client_id: Uuid,
    ) -> impl Future<Output = DocuviResult<Vec<Requirement>>> + Send;
    fn list_mandatory_by_client(
        &self,
        client_id: Uuid,
    ) -> impl Future<Output = DocuviResult<Vec<Requirement>>> + Send;
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

pub trait DocumentRepository: Send + Sync {
    /// Record a new upload. The repository assigns the next version
    /// number for the requirement (including deleted rows, so versions
    /// never repeat).
    fn create(&self, input: CreateDocument)
    -> impl Future<Output = DocuviResult<Document>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DocuviResult<Document>> + Send;
    /// Non-deleted documents of a requirement, newest version first.
    fn list_by_requirement(
        &self,
        requirement_id: Uuid,
    ) -> impl Future<Output = DocuviResult<Vec<Document>>> + Send;
    /// The current document: highest version among non-deleted rows.
    fn latest(
        &self,
        requirement_id: Uuid,
    ) -> impl Future<Output = DocuviResult<Option<Document>>> + Send;
    /// The current approved document, if any.
    fn latest_approved(
        &self,
        requirement_id: Uuid,
    ) -> impl Future<Output = DocuviResult<Option<Document>>> + Send;
    /// Pending → Approved. Records approver and timestamp; optionally
    /// sets the expiry date.
    fn approve(
        &self,
        id: Uuid,
        approved_by: Uuid,
        expires_at: Option<NaiveDate>,
    ) -> impl Future<Output = DocuviResult<Document>> + Send;
    /// Pending → Rejected with a reason.
    fn reject(
        &self,
        id: Uuid,
        reason: &str,
    ) -> impl Future<Output = DocuviResult<Document>> + Send;
    fn mark_deleted(
        &self,
        id: Uuid,
        deleted_by: Uuid,
    ) -> impl Future<Output = DocuviResult<()>> + Send;
    fn restore(&self, id: Uuid) -> impl Future<Output = DocuviResult<()>> + Send;
    /// All pending, non-deleted documents, oldest upload first (review
    /// queue order).
    fn list_pending(&self) -> impl Future<Output = DocuviResult<Vec<Document>>> + Send;
    /// Approved, non-deleted documents whose expiry date falls within
    /// `days` of `today`.
    fn list_expiring_within(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> impl Future<Output = DocuviResult<Vec<ExpiringDocument>>> + Send;
}

// ---------------------------------------------------------------------------
// Certificates
// ---------------------------------------------------------------------------

pub trait CertificateRepository: Send + Sync {
    /// Persist a certificate row in `Active` state. A code collision
    /// fails with `AlreadyExists` so the issuer can regenerate.
    fn create(
        &self,
        input: CreateCertificate,
    ) -> impl Future<Output = DocuviResult<Certificate>> + Send;
    /// Persist the snapshot line items for a certificate.
    fn create_details(
        &self,
        certificate_id: Uuid,
        details: Vec<CreateCertificateDetail>,
    ) -> impl Future<Output = DocuviResult<Vec<CertificateDetail>>> + Send;
    /// Hard delete. Only used as the compensating cleanup when detail
    /// insertion fails after the certificate row was written.
    fn delete(&self, id: Uuid) -> impl Future<Output = DocuviResult<()>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DocuviResult<Certificate>> + Send;
    fn get_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = DocuviResult<Option<Certificate>>> + Send;
    fn get_details(
        &self,
        certificate_id: Uuid,
    ) -> impl Future<Output = DocuviResult<Vec<CertificateDetail>>> + Send;
    fn list_by_client(
        &self,
        client_id: Uuid,
    ) -> impl Future<Output = DocuviResult<Vec<Certificate>>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = DocuviResult<PaginatedResult<Certificate>>> + Send;
    /// Active → Revoked with reason, actor, and timestamp. State guards
    /// live in the service layer.
    fn revoke(
        &self,
        id: Uuid,
        reason: &str,
        revoked_by: Uuid,
    ) -> impl Future<Output = DocuviResult<Certificate>> + Send;
    /// Sweep primitive: Active certificates with `valid_to` strictly
    /// before `today` become `Expired`. Returns the number of rows
    /// transitioned.
    fn mark_expired_before(
        &self,
        today: NaiveDate,
    ) -> impl Future<Output = DocuviResult<u64>> + Send;
    /// Active certificates whose `valid_to` lies in `[today, today + days]`.
    fn list_expiring_within(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> impl Future<Output = DocuviResult<Vec<Certificate>>> + Send;
}

// ---------------------------------------------------------------------------
// Notifications & audit
// ---------------------------------------------------------------------------

pub trait NotificationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateNotification,
    ) -> impl Future<Output = DocuviResult<Notification>> + Send;
    fn list_by_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> impl Future<Output = DocuviResult<Vec<Notification>>> + Send;
    fn unread_count(&self, user_id: Uuid) -> impl Future<Output = DocuviResult<u64>> + Send;
    fn mark_read(&self, id: Uuid) -> impl Future<Output = DocuviResult<Notification>> + Send;
    fn mark_all_read(&self, user_id: Uuid) -> impl Future<Output = DocuviResult<u64>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = DocuviResult<()>> + Send;
}

/// Query filters for audit log entries.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub entity: Option<String>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit log entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = DocuviResult<AuditLogEntry>> + Send;
    fn list(
        &self,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = DocuviResult<PaginatedResult<AuditLogEntry>>> + Send;
}
