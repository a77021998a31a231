//! Integration tests for the Certificate repository implementation
//! using in-memory SurrealDB.

use chrono::{NaiveDate, Utc};
use docuvi_core::error::DocuviError;
use docuvi_core::models::certificate::{
    CertificateStatus, CreateCertificate, CreateCertificateDetail,
};
use docuvi_core::repository::{CertificateRepository, Pagination};
use docuvi_db::repository::SurrealCertificateRepository;
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

fn sample(code: &str, client_id: Uuid) -> CreateCertificate {
    CreateCertificate {
        code: code.into(),
        hash: "ab".repeat(32),
        client_id,
        issued_by: Uuid::new_v4(),
        valid_from: date(2026, 1, 1),
        valid_to: date(2026, 12, 31),
    }
}

#[tokio::test]
async fn create_and_get_by_code() {
    let db = setup().await;
    let repo = SurrealCertificateRepository::new(db);
    let client_id = Uuid::new_v4();

    let cert = repo.create(sample("CERT-2026-AAAA1111", client_id)).await.unwrap();
    assert_eq!(cert.status, CertificateStatus::Active);
    assert_eq!(cert.valid_from, date(2026, 1, 1));
    assert_eq!(cert.valid_to, date(2026, 12, 31));

    let found = repo.get_by_code("CERT-2026-AAAA1111").await.unwrap();
    assert_eq!(found.unwrap().id, cert.id);

    let missing = repo.get_by_code("CERT-2026-ZZZZ9999").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn duplicate_code_is_rejected() {
    let db = setup().await;
    let repo = SurrealCertificateRepository::new(db);

    repo.create(sample("CERT-2026-DUPDUP11", Uuid::new_v4()))
        .await
        .unwrap();

    let dup = repo
        .create(sample("CERT-2026-DUPDUP11", Uuid::new_v4()))
        .await;
    assert!(dup.is_err(), "code collision should be rejected");
}

#[tokio::test]
async fn details_round_trip_and_compensating_delete() {
    let db = setup().await;
    let repo = SurrealCertificateRepository::new(db);
    let client_id = Uuid::new_v4();

    let cert = repo.create(sample("CERT-2026-DETS0001", client_id)).await.unwrap();

    let details = repo
        .create_details(
            cert.id,
            vec![
                CreateCertificateDetail {
                    requirement_id: Uuid::new_v4(),
                    document_id: Uuid::new_v4(),
                    document_type_name: "Insurance policy".into(),
                    approved_at: Utc::now(),
                    expires_at: Some(date(2027, 3, 1)),
                    approved_by: Uuid::new_v4(),
                },
                CreateCertificateDetail {
                    requirement_id: Uuid::new_v4(),
                    document_id: Uuid::new_v4(),
                    document_type_name: "Tax ID".into(),
                    approved_at: Utc::now(),
                    expires_at: None,
                    approved_by: Uuid::new_v4(),
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(details.len(), 2);

    let fetched = repo.get_details(cert.id).await.unwrap();
    assert_eq!(fetched.len(), 2);
    // Ordered by document type name.
    assert_eq!(fetched[0].document_type_name, "Insurance policy");
    assert_eq!(fetched[1].document_type_name, "Tax ID");

    // Hard delete removes the certificate and its details.
    repo.delete(cert.id).await.unwrap();
    assert!(repo.get_by_id(cert.id).await.is_err());
    let leftover = repo.get_details(cert.id).await.unwrap();
    assert!(leftover.is_empty());
}

#[tokio::test]
async fn revoke_records_reason_actor_and_timestamp() {
    let db = setup().await;
    let repo = SurrealCertificateRepository::new(db);
    let revoker = Uuid::new_v4();

    let cert = repo
        .create(sample("CERT-2026-REVK0001", Uuid::new_v4()))
        .await
        .unwrap();

    let revoked = repo
        .revoke(cert.id, "issued against stale documents", revoker)
        .await
        .unwrap();
    assert_eq!(revoked.status, CertificateStatus::Revoked);
    assert_eq!(
        revoked.revocation_reason.as_deref(),
        Some("issued against stale documents")
    );
    assert_eq!(revoked.revoked_by, Some(revoker));
    assert!(revoked.revoked_at.is_some());
}

#[tokio::test]
async fn second_revoke_does_not_overwrite_the_first() {
    let db = setup().await;
    let repo = SurrealCertificateRepository::new(db);
    let first_actor = Uuid::new_v4();

    let cert = repo
        .create(sample("CERT-2026-REVK0002", Uuid::new_v4()))
        .await
        .unwrap();
    repo.revoke(cert.id, "first", first_actor).await.unwrap();

    let again = repo.revoke(cert.id, "second", Uuid::new_v4()).await;
    assert!(matches!(again, Err(DocuviError::AlreadyRevoked { .. })));

    let fetched = repo.get_by_id(cert.id).await.unwrap();
    assert_eq!(fetched.revocation_reason.as_deref(), Some("first"));
    assert_eq!(fetched.revoked_by, Some(first_actor));
}

#[tokio::test]
async fn revoking_a_swept_certificate_is_rejected() {
    let db = setup().await;
    let repo = SurrealCertificateRepository::new(db);

    let mut past = sample("CERT-2025-PAST0002", Uuid::new_v4());
    past.valid_from = date(2025, 1, 1);
    past.valid_to = date(2025, 12, 31);
    let cert = repo.create(past).await.unwrap();

    assert_eq!(repo.mark_expired_before(date(2026, 8, 23)).await.unwrap(), 1);

    let result = repo.revoke(cert.id, "too late", Uuid::new_v4()).await;
    assert!(matches!(
        result,
        Err(DocuviError::CertificateNotActive { .. })
    ));

    let fetched = repo.get_by_id(cert.id).await.unwrap();
    assert_eq!(fetched.status, CertificateStatus::Expired);
    assert!(fetched.revocation_reason.is_none());
}

#[tokio::test]
async fn sweep_expires_only_past_windows_and_is_idempotent() {
    let db = setup().await;
    let repo = SurrealCertificateRepository::new(db);
    let client_id = Uuid::new_v4();

    // valid_to in the past.
    let mut expired = sample("CERT-2025-PAST0001", client_id);
    expired.valid_from = date(2025, 1, 1);
    expired.valid_to = date(2025, 12, 31);
    let expired = repo.create(expired).await.unwrap();

    // Still inside its window.
    let current = repo
        .create(sample("CERT-2026-CURR0001", client_id))
        .await
        .unwrap();

    let today = date(2026, 8, 23);
    let swept = repo.mark_expired_before(today).await.unwrap();
    assert_eq!(swept, 1);

    let fetched = repo.get_by_id(expired.id).await.unwrap();
    assert_eq!(fetched.status, CertificateStatus::Expired);
    let fetched = repo.get_by_id(current.id).await.unwrap();
    assert_eq!(fetched.status, CertificateStatus::Active);

    // Second run has nothing left to transition.
    let swept = repo.mark_expired_before(today).await.unwrap();
    assert_eq!(swept, 0);
}

#[tokio::test]
async fn expiring_window_excludes_revoked_and_distant() {
    let db = setup().await;
    let repo = SurrealCertificateRepository::new(db);
    let client_id = Uuid::new_v4();
    let today = date(2026, 8, 23);

    let mut soon = sample("CERT-2026-SOON0001", client_id);
    soon.valid_to = date(2026, 9, 10);
    let soon = repo.create(soon).await.unwrap();

    let mut also_soon = sample("CERT-2026-SOON0002", client_id);
    also_soon.valid_to = date(2026, 9, 12);
    let also_soon = repo.create(also_soon).await.unwrap();
    repo.revoke(also_soon.id, "superseded", Uuid::new_v4())
        .await
        .unwrap();

    repo.create(sample("CERT-2026-FARR0001", client_id))
        .await
        .unwrap(); // valid_to in December

    let expiring = repo.list_expiring_within(today, 30).await.unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].id, soon.id);
}

#[tokio::test]
async fn list_by_client_and_paginated_list() {
    let db = setup().await;
    let repo = SurrealCertificateRepository::new(db);
    let client_a = Uuid::new_v4();
    let client_b = Uuid::new_v4();

    for i in 0..3 {
        repo.create(sample(&format!("CERT-2026-AAAA000{i}"), client_a))
            .await
            .unwrap();
    }
    repo.create(sample("CERT-2026-BBBB0001", client_b))
        .await
        .unwrap();

    let for_a = repo.list_by_client(client_a).await.unwrap();
    assert_eq!(for_a.len(), 3);

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.items.len(), 2);
}
