//! Integration tests for the certificate lifecycle service against
//! in-memory SurrealDB.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use docuvi_cert::{CertConfig, CertificateService, EventBus};
use docuvi_core::error::{DocuviError, DocuviResult};
use docuvi_core::models::certificate::{
    Certificate, CertificateDetail, CertificateStatus, CreateCertificate,
    CreateCertificateDetail, InvalidReason,
};
use docuvi_core::models::document::CreateDocument;
use docuvi_core::models::document_type::CreateDocumentType;
use docuvi_core::models::requirement::CreateRequirement;
use docuvi_core::repository::{
    CertificateRepository, DocumentRepository, DocumentTypeRepository, PaginatedResult,
    Pagination, RequirementRepository,
};
use docuvi_db::repository::{
    SurrealCertificateRepository, SurrealDocumentRepository, SurrealDocumentTypeRepository,
    SurrealRequirementRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = CertificateService<
    SurrealRequirementRepository<Db>,
    SurrealDocumentRepository<Db>,
    SurrealDocumentTypeRepository<Db>,
    SurrealCertificateRepository<Db>,
>;

async fn setup() -> (Surreal<Db>, Service) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    docuvi_db::run_migrations(&db).await.unwrap();

    let service = CertificateService::new(
        SurrealRequirementRepository::new(db.clone()),
        SurrealDocumentRepository::new(db.clone()),
        SurrealDocumentTypeRepository::new(db.clone()),
        SurrealCertificateRepository::new(db.clone()),
        CertConfig::default(),
        EventBus::default(),
    );
    (db, service)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Seed one mandatory requirement for the client; optionally approve an
/// uploaded document for it. Returns the requirement id.
async fn seed_requirement(
    db: &Surreal<Db>,
    client_id: Uuid,
    type_name: &str,
    approved: bool,
) -> Uuid {
    let reviewer = Uuid::new_v4();
    let types = SurrealDocumentTypeRepository::new(db.clone());
    let requirements = SurrealRequirementRepository::new(db.clone());
    let documents = SurrealDocumentRepository::new(db.clone());

    let doc_type = types
        .create(CreateDocumentType {
            name: type_name.into(),
            description: None,
            created_by: reviewer,
        })
        .await
        .unwrap();
    let requirement = requirements
        .create(CreateRequirement {
            client_id,
            document_type_id: doc_type.id,
            mandatory: true,
            renewal_months: None,
        })
        .await
        .unwrap();

    let document = documents
        .create(CreateDocument {
            requirement_id: requirement.id,
            storage_path: format!("docs/{type_name}.pdf"),
            file_name: format!("{type_name}.pdf"),
            expires_at: None,
        })
        .await
        .unwrap();
    if approved {
        documents.approve(document.id, reviewer, None).await.unwrap();
    }

    requirement.id
}

// -----------------------------------------------------------------------
// Compliance
// -----------------------------------------------------------------------

#[tokio::test]
async fn two_of_three_mandatory_requirements_is_not_compliant() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();

    seed_requirement(&db, client_id, "Tax ID", true).await;
    seed_requirement(&db, client_id, "Insurance policy", true).await;
    seed_requirement(&db, client_id, "Safety training", false).await;

    let report = service.check_compliance(client_id).await.unwrap();
    assert!(!report.compliant);
    assert_eq!(report.total_requirements, 3);
    assert_eq!(report.fulfilled_requirements, 2);
    assert_eq!(report.pending_requirements, 1);
}

#[tokio::test]
async fn zero_mandatory_requirements_is_compliant() {
    let (_db, service) = setup().await;

    let report = service.check_compliance(Uuid::new_v4()).await.unwrap();
    assert!(report.compliant);
    assert_eq!(report.total_requirements, 0);
}

// -----------------------------------------------------------------------
// Issuance
// -----------------------------------------------------------------------

#[tokio::test]
async fn issue_fails_for_non_compliant_client() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", false).await;

    let result = service
        .issue(client_id, Uuid::new_v4(), date(2026, 1, 1), date(2026, 12, 31))
        .await;
    assert!(matches!(
        result,
        Err(DocuviError::NotCompliant {
            total: 1,
            fulfilled: 0,
            pending: 1
        })
    ));
}

#[tokio::test]
async fn issue_snapshots_every_mandatory_requirement() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();
    let issuer = Uuid::new_v4();

    seed_requirement(&db, client_id, "Tax ID", true).await;
    seed_requirement(&db, client_id, "Insurance policy", true).await;

    let cert = service
        .issue(client_id, issuer, date(2026, 1, 1), date(2026, 12, 31))
        .await
        .unwrap();

    assert_eq!(cert.status, CertificateStatus::Active);
    assert_eq!(cert.issued_by, issuer);
    assert!(cert.code.starts_with(&format!("CERT-{}-", Utc::now().year())));
    assert_eq!(cert.hash.len(), 64);

    let certs = SurrealCertificateRepository::new(db);
    let details = certs.get_details(cert.id).await.unwrap();
    assert_eq!(details.len(), 2);
    let mut names: Vec<_> = details
        .iter()
        .map(|d| d.document_type_name.clone())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Insurance policy", "Tax ID"]);
}

#[tokio::test]
async fn issue_rejects_inverted_validity_window() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    let result = service
        .issue(client_id, Uuid::new_v4(), date(2026, 12, 31), date(2026, 1, 1))
        .await;
    assert!(matches!(result, Err(DocuviError::Validation { .. })));
}

#[tokio::test]
async fn later_uploads_do_not_change_issued_snapshot() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();
    let reviewer = Uuid::new_v4();

    let requirement_id = seed_requirement(&db, client_id, "Permit", true).await;

    let cert = service
        .issue(client_id, reviewer, date(2026, 1, 1), date(2026, 12, 31))
        .await
        .unwrap();

    let certs = SurrealCertificateRepository::new(db.clone());
    let before = certs.get_details(cert.id).await.unwrap();

    // New upload and approval after issuance.
    let documents = SurrealDocumentRepository::new(db);
    let newer = documents
        .create(CreateDocument {
            requirement_id,
            storage_path: "docs/permit-v2.pdf".into(),
            file_name: "permit-v2.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();
    documents.approve(newer.id, reviewer, None).await.unwrap();

    let after = certs.get_details(cert.id).await.unwrap();
    assert_eq!(before.len(), after.len());
    assert_eq!(before[0].document_id, after[0].document_id);
    assert_ne!(after[0].document_id, newer.id);
}

// -----------------------------------------------------------------------
// Issuance atomicity: compensating delete on detail failure
// -----------------------------------------------------------------------

/// Wraps the real repository but fails every detail insertion.
struct FailingDetails<C: CertificateRepository> {
    inner: C,
}

impl<C: CertificateRepository> CertificateRepository for FailingDetails<C> {
    async fn create(&self, input: CreateCertificate) -> DocuviResult<Certificate> {
        self.inner.create(input).await
    }
    async fn create_details(
        &self,
        _certificate_id: Uuid,
        _details: Vec<CreateCertificateDetail>,
    ) -> DocuviResult<Vec<CertificateDetail>> {
        Err(DocuviError::Database("detail insertion refused".into()))
    }
    async fn delete(&self, id: Uuid) -> DocuviResult<()> {
        self.inner.delete(id).await
    }
    async fn get_by_id(&self, id: Uuid) -> DocuviResult<Certificate> {
        self.inner.get_by_id(id).await
    }
    async fn get_by_code(&self, code: &str) -> DocuviResult<Option<Certificate>> {
        self.inner.get_by_code(code).await
    }
    async fn get_details(&self, certificate_id: Uuid) -> DocuviResult<Vec<CertificateDetail>> {
        self.inner.get_details(certificate_id).await
    }
    async fn list_by_client(&self, client_id: Uuid) -> DocuviResult<Vec<Certificate>> {
        self.inner.list_by_client(client_id).await
    }
    async fn list(&self, pagination: Pagination) -> DocuviResult<PaginatedResult<Certificate>> {
        self.inner.list(pagination).await
    }
    async fn revoke(
        &self,
        id: Uuid,
        reason: &str,
        revoked_by: Uuid,
    ) -> DocuviResult<Certificate> {
        self.inner.revoke(id, reason, revoked_by).await
    }
    async fn mark_expired_before(&self, today: NaiveDate) -> DocuviResult<u64> {
        self.inner.mark_expired_before(today).await
    }
    async fn list_expiring_within(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> DocuviResult<Vec<Certificate>> {
        self.inner.list_expiring_within(today, days).await
    }
}

#[tokio::test]
async fn failed_detail_insertion_rolls_back_certificate() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    docuvi_db::run_migrations(&db).await.unwrap();

    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    let service = CertificateService::new(
        SurrealRequirementRepository::new(db.clone()),
        SurrealDocumentRepository::new(db.clone()),
        SurrealDocumentTypeRepository::new(db.clone()),
        FailingDetails {
            inner: SurrealCertificateRepository::new(db.clone()),
        },
        CertConfig::default(),
        EventBus::default(),
    );

    let result = service
        .issue(client_id, Uuid::new_v4(), date(2026, 1, 1), date(2026, 12, 31))
        .await;
    assert!(matches!(result, Err(DocuviError::Database(_))));

    // The certificate row must be gone: no zero-detail certificates.
    let certs = SurrealCertificateRepository::new(db);
    let listed = certs.list_by_client(client_id).await.unwrap();
    assert!(listed.is_empty());
}

// -----------------------------------------------------------------------
// Code collisions and concurrent issuance
// -----------------------------------------------------------------------

/// Shared observations of every `create` call: codes offered, calls
/// still to be rejected as collisions, and the overlap high-water mark.
#[derive(Default)]
struct CreateStats {
    rejections: AtomicU32,
    codes: StdMutex<Vec<String>>,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
}

/// Wraps the real repository to script `create`: rejects the next
/// `rejections` calls as code collisions and can dwell inside the call
/// so overlapping callers become observable.
struct ScriptedCreate<C: CertificateRepository> {
    inner: C,
    dwell: Duration,
    stats: Arc<CreateStats>,
}

impl<C: CertificateRepository> CertificateRepository for ScriptedCreate<C> {
    async fn create(&self, input: CreateCertificate) -> DocuviResult<Certificate> {
        let entered = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(entered, Ordering::SeqCst);
        if !self.dwell.is_zero() {
            tokio::time::sleep(self.dwell).await;
        }
        self.stats.codes.lock().unwrap().push(input.code.clone());

        let outcome = if self.stats.rejections.load(Ordering::SeqCst) > 0 {
            self.stats.rejections.fetch_sub(1, Ordering::SeqCst);
            Err(DocuviError::AlreadyExists {
                entity: "certificate".into(),
            })
        } else {
            self.inner.create(input).await
        };
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
    async fn create_details(
        &self,
        certificate_id: Uuid,
        details: Vec<CreateCertificateDetail>,
    ) -> DocuviResult<Vec<CertificateDetail>> {
        self.inner.create_details(certificate_id, details).await
    }
    async fn delete(&self, id: Uuid) -> DocuviResult<()> {
        self.inner.delete(id).await
    }
    async fn get_by_id(&self, id: Uuid) -> DocuviResult<Certificate> {
        self.inner.get_by_id(id).await
    }
    async fn get_by_code(&self, code: &str) -> DocuviResult<Option<Certificate>> {
        self.inner.get_by_code(code).await
    }
    async fn get_details(&self, certificate_id: Uuid) -> DocuviResult<Vec<CertificateDetail>> {
        self.inner.get_details(certificate_id).await
    }
    async fn list_by_client(&self, client_id: Uuid) -> DocuviResult<Vec<Certificate>> {
        self.inner.list_by_client(client_id).await
    }
    async fn list(&self, pagination: Pagination) -> DocuviResult<PaginatedResult<Certificate>> {
        self.inner.list(pagination).await
    }
    async fn revoke(
        &self,
        id: Uuid,
        reason: &str,
        revoked_by: Uuid,
    ) -> DocuviResult<Certificate> {
        self.inner.revoke(id, reason, revoked_by).await
    }
    async fn mark_expired_before(&self, today: NaiveDate) -> DocuviResult<u64> {
        self.inner.mark_expired_before(today).await
    }
    async fn list_expiring_within(
        &self,
        today: NaiveDate,
        days: i64,
    ) -> DocuviResult<Vec<Certificate>> {
        self.inner.list_expiring_within(today, days).await
    }
}

type ScriptedService = CertificateService<
    SurrealRequirementRepository<Db>,
    SurrealDocumentRepository<Db>,
    SurrealDocumentTypeRepository<Db>,
    ScriptedCreate<SurrealCertificateRepository<Db>>,
>;

fn scripted_service(db: &Surreal<Db>, stats: Arc<CreateStats>, dwell: Duration) -> ScriptedService {
    CertificateService::new(
        SurrealRequirementRepository::new(db.clone()),
        SurrealDocumentRepository::new(db.clone()),
        SurrealDocumentTypeRepository::new(db.clone()),
        ScriptedCreate {
            inner: SurrealCertificateRepository::new(db.clone()),
            dwell,
            stats,
        },
        CertConfig::default(),
        EventBus::default(),
    )
}

#[tokio::test]
async fn code_collision_regenerates_and_issuance_succeeds() {
    let (db, _) = setup().await;
    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    let stats = Arc::new(CreateStats::default());
    stats.rejections.store(1, Ordering::SeqCst);
    let service = scripted_service(&db, stats.clone(), Duration::ZERO);

    let cert = service
        .issue(client_id, Uuid::new_v4(), date(2026, 1, 1), date(2026, 12, 31))
        .await
        .unwrap();

    // The collision forced a second, distinct code.
    let codes = stats.codes.lock().unwrap();
    assert_eq!(codes.len(), 2);
    assert_ne!(codes[0], codes[1]);
    assert_eq!(cert.code, codes[1]);
}

#[tokio::test]
async fn exhausted_code_attempts_fail_issuance() {
    let (db, _) = setup().await;
    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    let stats = Arc::new(CreateStats::default());
    stats.rejections.store(u32::MAX, Ordering::SeqCst);
    let service = scripted_service(&db, stats.clone(), Duration::ZERO);

    let result = service
        .issue(client_id, Uuid::new_v4(), date(2026, 1, 1), date(2026, 12, 31))
        .await;
    assert!(matches!(
        result,
        Err(DocuviError::CodeGenerationFailed { attempts: 3 })
    ));
    assert_eq!(stats.codes.lock().unwrap().len(), 3);

    // Nothing was ever written.
    let certs = SurrealCertificateRepository::new(db);
    let listed = certs.list_by_client(client_id).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn concurrent_issue_calls_for_one_client_serialize() {
    let (db, _) = setup().await;
    let client_id = Uuid::new_v4();
    let issuer = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    let stats = Arc::new(CreateStats::default());
    let service = scripted_service(&db, stats.clone(), Duration::from_millis(25));

    let (a, b) = tokio::join!(
        service.issue(client_id, issuer, date(2026, 1, 1), date(2026, 6, 30)),
        service.issue(client_id, issuer, date(2026, 1, 1), date(2026, 12, 31)),
    );
    let a = a.unwrap();
    let b = b.unwrap();
    assert_ne!(a.code, b.code);

    // The per-client lock kept the insert sections from overlapping.
    assert_eq!(stats.max_in_flight.load(Ordering::SeqCst), 1);

    // Both certificates carry the full snapshot.
    let certs = SurrealCertificateRepository::new(db);
    assert_eq!(certs.get_details(a.id).await.unwrap().len(), 1);
    assert_eq!(certs.get_details(b.id).await.unwrap().len(), 1);
}

// -----------------------------------------------------------------------
// Verification
// -----------------------------------------------------------------------

#[tokio::test]
async fn verify_is_valid_immediately_after_issuance() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    let today = Utc::now().date_naive();
    let cert = service
        .issue(client_id, Uuid::new_v4(), today, today + chrono::Duration::days(365))
        .await
        .unwrap();

    let verification = service.verify(&cert.code).await.unwrap();
    assert!(verification.valid);
    assert_eq!(verification.reason, None);
    assert_eq!(verification.certificate.unwrap().id, cert.id);
}

#[tokio::test]
async fn verify_unknown_code_is_not_found() {
    let (_db, service) = setup().await;

    let verification = service.verify("CERT-2026-NOPE0000").await.unwrap();
    assert!(!verification.valid);
    assert_eq!(verification.reason, Some(InvalidReason::NotFound));
    assert!(verification.certificate.is_none());
}

#[tokio::test]
async fn expiry_is_lazy_and_revocation_takes_precedence() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    let cert = service
        .issue(client_id, Uuid::new_v4(), date(2026, 1, 1), date(2026, 6, 30))
        .await
        .unwrap();

    // Mid-window is valid.
    let mid = service.verify_on(&cert.code, date(2026, 3, 1)).await.unwrap();
    assert!(mid.valid);

    // Past the window, no sweep has run: still reported Expired.
    let past = service.verify_on(&cert.code, date(2026, 7, 1)).await.unwrap();
    assert!(!past.valid);
    assert_eq!(past.reason, Some(InvalidReason::Expired));

    // Before the window starts.
    let early = service.verify_on(&cert.code, date(2025, 12, 31)).await.unwrap();
    assert_eq!(early.reason, Some(InvalidReason::NotYetValid));

    // Revoke, then check a date past the window: Revoked wins.
    service
        .revoke(cert.id, "issued against stale documents", Uuid::new_v4())
        .await
        .unwrap();
    let revoked = service.verify_on(&cert.code, date(2026, 7, 1)).await.unwrap();
    assert!(!revoked.valid);
    assert_eq!(revoked.reason, Some(InvalidReason::Revoked));
    assert_eq!(
        revoked.certificate.unwrap().revocation_reason.as_deref(),
        Some("issued against stale documents")
    );
}

// -----------------------------------------------------------------------
// Revocation guards
// -----------------------------------------------------------------------

#[tokio::test]
async fn revoking_twice_fails_with_already_revoked() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    let cert = service
        .issue(client_id, Uuid::new_v4(), date(2026, 1, 1), date(2026, 12, 31))
        .await
        .unwrap();

    service.revoke(cert.id, "first", Uuid::new_v4()).await.unwrap();

    let second = service.revoke(cert.id, "second", Uuid::new_v4()).await;
    assert!(matches!(second, Err(DocuviError::AlreadyRevoked { .. })));

    // The original revocation is untouched.
    let certs = SurrealCertificateRepository::new(db);
    let fetched = certs.get_by_id(cert.id).await.unwrap();
    assert_eq!(fetched.revocation_reason.as_deref(), Some("first"));
}

#[tokio::test]
async fn revoking_expired_certificate_fails() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    // Window entirely in the past, then swept to Expired.
    let cert = service
        .issue(client_id, Uuid::new_v4(), date(2020, 1, 1), date(2020, 12, 31))
        .await
        .unwrap();
    let swept = service.sweep_expired().await.unwrap();
    assert_eq!(swept, 1);

    let result = service.revoke(cert.id, "too late", Uuid::new_v4()).await;
    assert!(matches!(
        result,
        Err(DocuviError::CertificateNotActive { .. })
    ));
}

// -----------------------------------------------------------------------
// Sweep
// -----------------------------------------------------------------------

#[tokio::test]
async fn sweep_is_idempotent() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    service
        .issue(client_id, Uuid::new_v4(), date(2020, 1, 1), date(2020, 12, 31))
        .await
        .unwrap();

    assert_eq!(service.sweep_expired().await.unwrap(), 1);
    assert_eq!(service.sweep_expired().await.unwrap(), 0);
}

// -----------------------------------------------------------------------
// Cached listing
// -----------------------------------------------------------------------

#[tokio::test]
async fn issue_invalidates_cached_certificate_list() {
    let (db, service) = setup().await;
    let client_id = Uuid::new_v4();
    seed_requirement(&db, client_id, "Tax ID", true).await;

    // Prime the cache while the client has no certificates.
    let empty = service.list_certificates(client_id).await.unwrap();
    assert!(empty.is_empty());

    let cert = service
        .issue(client_id, Uuid::new_v4(), date(2026, 1, 1), date(2026, 12, 31))
        .await
        .unwrap();

    // A fresh read must see the new certificate, not the cached miss.
    let listed = service.list_certificates(client_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, cert.id);
}
