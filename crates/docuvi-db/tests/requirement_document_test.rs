//! Integration tests for Requirement and Document repository
//! implementations using in-memory SurrealDB.

use chrono::NaiveDate;
use docuvi_core::error::DocuviError;
use docuvi_core::models::document::{CreateDocument, DocumentStatus};
use docuvi_core::models::requirement::{CreateRequirement, UpdateRequirement};
use docuvi_core::repository::{DocumentRepository, RequirementRepository};
use docuvi_db::repository::{SurrealDocumentRepository, SurrealRequirementRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    docuvi_db::run_migrations(&db).await.unwrap();
    db
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// -----------------------------------------------------------------------
// Requirement tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn requirement_pair_is_unique_per_client() {
    let db = setup().await;
    let repo = SurrealRequirementRepository::new(db);
    let client_id = Uuid::new_v4();
    let type_id = Uuid::new_v4();

    repo.create(CreateRequirement {
        client_id,
        document_type_id: type_id,
        mandatory: true,
        renewal_months: Some(12),
    })
    .await
    .unwrap();

    let dup = repo
        .create(CreateRequirement {
            client_id,
            document_type_id: type_id,
            mandatory: false,
            renewal_months: None,
        })
        .await;
    assert!(dup.is_err(), "same (client, type) pair should be rejected");

    // Same type for another client is fine.
    repo.create(CreateRequirement {
        client_id: Uuid::new_v4(),
        document_type_id: type_id,
        mandatory: true,
        renewal_months: None,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn mandatory_filter_excludes_optional_requirements() {
    let db = setup().await;
    let repo = SurrealRequirementRepository::new(db);
    let client_id = Uuid::new_v4();

    repo.create(CreateRequirement {
        client_id,
        document_type_id: Uuid::new_v4(),
        mandatory: true,
        renewal_months: None,
    })
    .await
    .unwrap();
    repo.create(CreateRequirement {
        client_id,
        document_type_id: Uuid::new_v4(),
        mandatory: false,
        renewal_months: None,
    })
    .await
    .unwrap();

    let all = repo.list_by_client(client_id).await.unwrap();
    assert_eq!(all.len(), 2);

    let mandatory = repo.list_mandatory_by_client(client_id).await.unwrap();
    assert_eq!(mandatory.len(), 1);
    assert!(mandatory[0].mandatory);
}

#[tokio::test]
async fn update_and_delete_requirement() {
    let db = setup().await;
    let repo = SurrealRequirementRepository::new(db);

    let req = repo
        .create(CreateRequirement {
            client_id: Uuid::new_v4(),
            document_type_id: Uuid::new_v4(),
            mandatory: true,
            renewal_months: Some(6),
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            req.id,
            UpdateRequirement {
                mandatory: Some(false),
                renewal_months: Some(None),
            },
        )
        .await
        .unwrap();
    assert!(!updated.mandatory);
    assert_eq!(updated.renewal_months, None);

    repo.delete(req.id).await.unwrap();
    assert!(repo.get_by_id(req.id).await.is_err());
}

// -----------------------------------------------------------------------
// Document tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn uploads_get_increasing_versions() {
    let db = setup().await;
    let repo = SurrealDocumentRepository::new(db);
    let requirement_id = Uuid::new_v4();

    let first = repo
        .create(CreateDocument {
            requirement_id,
            storage_path: "docs/a-v1.pdf".into(),
            file_name: "policy.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();
    assert_eq!(first.version, 1);
    assert_eq!(first.status, DocumentStatus::Pending);

    let second = repo
        .create(CreateDocument {
            requirement_id,
            storage_path: "docs/a-v2.pdf".into(),
            file_name: "policy.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();
    assert_eq!(second.version, 2);
}

#[tokio::test]
async fn deleted_versions_are_not_reused() {
    let db = setup().await;
    let repo = SurrealDocumentRepository::new(db);
    let requirement_id = Uuid::new_v4();
    let reviewer = Uuid::new_v4();

    let first = repo
        .create(CreateDocument {
            requirement_id,
            storage_path: "docs/b-v1.pdf".into(),
            file_name: "permit.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();

    repo.mark_deleted(first.id, reviewer).await.unwrap();

    let second = repo
        .create(CreateDocument {
            requirement_id,
            storage_path: "docs/b-v2.pdf".into(),
            file_name: "permit.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();
    assert_eq!(second.version, 2, "deleted rows still occupy versions");
}

#[tokio::test]
async fn latest_skips_deleted_and_latest_approved_skips_pending() {
    let db = setup().await;
    let repo = SurrealDocumentRepository::new(db);
    let requirement_id = Uuid::new_v4();
    let reviewer = Uuid::new_v4();

    let v1 = repo
        .create(CreateDocument {
            requirement_id,
            storage_path: "docs/c-v1.pdf".into(),
            file_name: "cert.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();
    repo.approve(v1.id, reviewer, Some(date(2027, 1, 31)))
        .await
        .unwrap();

    let v2 = repo
        .create(CreateDocument {
            requirement_id,
            storage_path: "docs/c-v2.pdf".into(),
            file_name: "cert.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();

    // Latest is the pending v2; latest approved is still v1.
    let latest = repo.latest(requirement_id).await.unwrap().unwrap();
    assert_eq!(latest.id, v2.id);

    let approved = repo.latest_approved(requirement_id).await.unwrap().unwrap();
    assert_eq!(approved.id, v1.id);
    assert_eq!(approved.expires_at, Some(date(2027, 1, 31)));

    // Deleting v2 makes v1 the latest again.
    repo.mark_deleted(v2.id, reviewer).await.unwrap();
    let latest = repo.latest(requirement_id).await.unwrap().unwrap();
    assert_eq!(latest.id, v1.id);

    // Restore brings it back.
    repo.restore(v2.id).await.unwrap();
    let latest = repo.latest(requirement_id).await.unwrap().unwrap();
    assert_eq!(latest.id, v2.id);
}

#[tokio::test]
async fn approve_records_reviewer_and_reject_records_reason() {
    let db = setup().await;
    let repo = SurrealDocumentRepository::new(db);
    let reviewer = Uuid::new_v4();

    let doc = repo
        .create(CreateDocument {
            requirement_id: Uuid::new_v4(),
            storage_path: "docs/d-v1.pdf".into(),
            file_name: "license.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();

    let approved = repo.approve(doc.id, reviewer, None).await.unwrap();
    assert_eq!(approved.status, DocumentStatus::Approved);
    assert_eq!(approved.approved_by, Some(reviewer));
    assert!(approved.approved_at.is_some());

    let other = repo
        .create(CreateDocument {
            requirement_id: Uuid::new_v4(),
            storage_path: "docs/e-v1.pdf".into(),
            file_name: "blurry.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();

    let rejected = repo.reject(other.id, "scan is unreadable").await.unwrap();
    assert_eq!(rejected.status, DocumentStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("scan is unreadable"));
}

#[tokio::test]
async fn reviewing_a_non_pending_document_reports_its_state() {
    let db = setup().await;
    let repo = SurrealDocumentRepository::new(db);
    let reviewer = Uuid::new_v4();

    let doc = repo
        .create(CreateDocument {
            requirement_id: Uuid::new_v4(),
            storage_path: "docs/f-v1.pdf".into(),
            file_name: "license.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();
    repo.approve(doc.id, reviewer, None).await.unwrap();

    // Already approved: a validation error, not a missing row.
    let again = repo.approve(doc.id, reviewer, None).await;
    assert!(matches!(again, Err(DocuviError::Validation { .. })));
    let rejected = repo.reject(doc.id, "second look").await;
    assert!(matches!(rejected, Err(DocuviError::Validation { .. })));

    // Soft-deleted rows are not reviewable either.
    repo.mark_deleted(doc.id, reviewer).await.unwrap();
    let deleted = repo.reject(doc.id, "gone").await;
    assert!(matches!(deleted, Err(DocuviError::Validation { .. })));

    // Unknown ids still surface NotFound.
    let missing = repo.approve(Uuid::new_v4(), reviewer, None).await;
    assert!(matches!(missing, Err(DocuviError::NotFound { .. })));
}

#[tokio::test]
async fn pending_queue_is_oldest_first() {
    let db = setup().await;
    let repo = SurrealDocumentRepository::new(db);

    let first = repo
        .create(CreateDocument {
            requirement_id: Uuid::new_v4(),
            storage_path: "docs/q-1.pdf".into(),
            file_name: "one.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();
    let second = repo
        .create(CreateDocument {
            requirement_id: Uuid::new_v4(),
            storage_path: "docs/q-2.pdf".into(),
            file_name: "two.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();

    let pending = repo.list_pending().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].id, first.id);
    assert_eq!(pending[1].id, second.id);
}

#[tokio::test]
async fn expiring_documents_window_and_days_remaining() {
    let db = setup().await;
    let doc_repo = SurrealDocumentRepository::new(db.clone());
    let req_repo = SurrealRequirementRepository::new(db);
    let reviewer = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let today = date(2026, 8, 23);

    let req = req_repo
        .create(CreateRequirement {
            client_id,
            document_type_id: Uuid::new_v4(),
            mandatory: true,
            renewal_months: Some(12),
        })
        .await
        .unwrap();

    // Expires in 10 days: inside a 30-day window.
    let soon = doc_repo
        .create(CreateDocument {
            requirement_id: req.id,
            storage_path: "docs/f-v1.pdf".into(),
            file_name: "soon.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();
    doc_repo
        .approve(soon.id, reviewer, Some(date(2026, 9, 2)))
        .await
        .unwrap();

    // Expires in 60 days: outside the window.
    let later = doc_repo
        .create(CreateDocument {
            requirement_id: req.id,
            storage_path: "docs/f-v2.pdf".into(),
            file_name: "later.pdf".into(),
            expires_at: None,
        })
        .await
        .unwrap();
    doc_repo
        .approve(later.id, reviewer, Some(date(2026, 10, 22)))
        .await
        .unwrap();

    let expiring = doc_repo.list_expiring_within(today, 30).await.unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].document_id, soon.id);
    assert_eq!(expiring[0].client_id, client_id);
    assert_eq!(expiring[0].days_remaining, 10);
}
