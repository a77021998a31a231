//! Certificate lifecycle orchestration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use docuvi_core::error::{DocuviError, DocuviResult};
use docuvi_core::models::certificate::{
    Certificate, CreateCertificate, CreateCertificateDetail, Verification,
};
use docuvi_core::models::document::ExpiringDocument;
use docuvi_core::models::requirement::ComplianceReport;
use docuvi_core::repository::{
    CertificateRepository, DocumentRepository, DocumentTypeRepository, RequirementRepository,
};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::TtlCache;
use crate::code::generate_code;
use crate::config::CertConfig;
use crate::error::CertError;
use crate::events::{DomainEvent, EventBus};
use crate::hash::content_hash;
use crate::verify;

/// Certificate lifecycle service.
///
/// Generic over repository implementations so this crate has no
/// dependency on the database crate.
pub struct CertificateService<R, D, T, C>
where
    R: RequirementRepository,
    D: DocumentRepository,
    T: DocumentTypeRepository,
    C: CertificateRepository,
{
    requirements: R,
    documents: D,
    document_types: T,
    certificates: C,
    config: CertConfig,
    events: EventBus,
    list_cache: TtlCache<Uuid, Vec<Certificate>>,
    // Per-client issuance locks so two concurrent issue calls for the
    // same client serialize. In-process only.
    issue_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl<R, D, T, C> CertificateService<R, D, T, C>
where
    R: RequirementRepository,
    D: DocumentRepository,
    T: DocumentTypeRepository,
    C: CertificateRepository,
{
    pub fn new(
        requirements: R,
        documents: D,
        document_types: T,
        certificates: C,
        config: CertConfig,
        events: EventBus,
    ) -> Self {
        let list_cache = TtlCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self {
            requirements,
            documents,
            document_types,
            certificates,
            config,
            events,
            list_cache,
            issue_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn client_lock(&self, client_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.issue_locks.lock().await;
        locks
            .entry(client_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Check whether every mandatory requirement of a client has an
    /// approved, non-deleted document. Read-only; a client with zero
    /// mandatory requirements is compliant.
    pub async fn check_compliance(&self, client_id: Uuid) -> DocuviResult<ComplianceReport> {
        let mandatory = self.requirements.list_mandatory_by_client(client_id).await?;
        let total = mandatory.len() as u32;

        let mut fulfilled = 0u32;
        for requirement in &mandatory {
            if self.documents.latest_approved(requirement.id).await?.is_some() {
                fulfilled += 1;
            }
        }

        Ok(ComplianceReport {
            compliant: fulfilled == total,
            total_requirements: total,
            fulfilled_requirements: fulfilled,
            pending_requirements: total - fulfilled,
        })
    }

    /// Issue a compliance certificate for a client.
    ///
    /// Fails with `NotCompliant` unless every mandatory requirement is
    /// fulfilled. Detail rows snapshot the satisfying documents; if
    /// persisting them fails the certificate row is deleted again, so a
    /// certificate never exists without its snapshot.
    pub async fn issue(
        &self,
        client_id: Uuid,
        issuer_id: Uuid,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
    ) -> DocuviResult<Certificate> {
        if valid_from > valid_to {
            return Err(CertError::InvalidWindow {
                from: valid_from,
                to: valid_to,
            }
            .into());
        }

        let lock = self.client_lock(client_id).await;
        let _guard = lock.lock().await;

        let report = self.check_compliance(client_id).await?;
        if !report.compliant {
            return Err(CertError::NotCompliant {
                total: report.total_requirements,
                fulfilled: report.fulfilled_requirements,
                pending: report.pending_requirements,
            }
            .into());
        }

        let details = self.snapshot_details(client_id).await?;
        let certificate = self
            .insert_with_fresh_code(client_id, issuer_id, valid_from, valid_to, &details)
            .await?;

        if let Err(e) = self
            .certificates
            .create_details(certificate.id, details)
            .await
        {
            warn!(
                certificate_id = %certificate.id,
                error = %e,
                "Detail insertion failed, rolling back certificate"
            );
            if let Err(cleanup) = self.certificates.delete(certificate.id).await {
                warn!(
                    certificate_id = %certificate.id,
                    error = %cleanup,
                    "Compensating delete failed; orphaned certificate row"
                );
            }
            return Err(e);
        }

        info!(
            certificate_id = %certificate.id,
            code = %certificate.code,
            client_id = %client_id,
            "Certificate issued"
        );

        self.events.publish(DomainEvent::CertificateIssued {
            certificate_id: certificate.id,
            client_id,
            code: certificate.code.clone(),
        });
        self.list_cache.invalidate(&client_id);

        Ok(certificate)
    }

    /// Build the snapshot line items for a compliant client: the latest
    /// approved document of each mandatory requirement, with the catalog
    /// name copied so later renames never rewrite history.
    async fn snapshot_details(
        &self,
        client_id: Uuid,
    ) -> DocuviResult<Vec<CreateCertificateDetail>> {
        let mandatory = self.requirements.list_mandatory_by_client(client_id).await?;
        let mut details = Vec::with_capacity(mandatory.len());

        for requirement in mandatory {
            let document = self
                .documents
                .latest_approved(requirement.id)
                .await?
                .ok_or(DocuviError::NotFound {
                    entity: "approved document".into(),
                    id: requirement.id.to_string(),
                })?;
            let document_type = self
                .document_types
                .get_by_id(requirement.document_type_id)
                .await?;
            let approved_by = document.approved_by.ok_or_else(|| {
                DocuviError::Internal(format!(
                    "approved document {} has no approver recorded",
                    document.id
                ))
            })?;

            details.push(CreateCertificateDetail {
                requirement_id: requirement.id,
                document_id: document.id,
                document_type_name: document_type.name,
                approved_at: document.approved_at.unwrap_or(document.updated_at),
                expires_at: document.expires_at,
                approved_by,
            });
        }

        Ok(details)
    }

    /// Insert the certificate row, regenerating the code on collision.
    /// The hash covers the code, so each attempt recomputes it.
    async fn insert_with_fresh_code(
        &self,
        client_id: Uuid,
        issuer_id: Uuid,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
        details: &[CreateCertificateDetail],
    ) -> DocuviResult<Certificate> {
        let year = Utc::now().year();
        let attempts = self.config.code_attempts.max(1);

        for attempt in 1..=attempts {
            let code = generate_code(year);
            let hash = content_hash(&code, client_id, valid_from, valid_to, details);

            match self
                .certificates
                .create(CreateCertificate {
                    code: code.clone(),
                    hash,
                    client_id,
                    issued_by: issuer_id,
                    valid_from,
                    valid_to,
                })
                .await
            {
                Ok(certificate) => return Ok(certificate),
                Err(DocuviError::AlreadyExists { .. }) => {
                    warn!(code = %code, attempt, "Certificate code collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(CertError::CodeGenerationFailed { attempts }.into())
    }

    /// Verify a certificate code against today's date.
    pub async fn verify(&self, code: &str) -> DocuviResult<Verification> {
        self.verify_on(code, Utc::now().date_naive()).await
    }

    /// Verify a certificate code against an explicit reference date.
    /// Unknown codes are a non-valid result, not an error.
    pub async fn verify_on(&self, code: &str, today: NaiveDate) -> DocuviResult<Verification> {
        match self.certificates.get_by_code(code).await? {
            Some(certificate) => Ok(verify::classify(&certificate, today)),
            None => Ok(verify::not_found()),
        }
    }

    /// Revoke an active certificate. Irreversible; only Active
    /// certificates can be revoked.
    pub async fn revoke(
        &self,
        certificate_id: Uuid,
        reason: &str,
        actor_id: Uuid,
    ) -> DocuviResult<Certificate> {
        let certificate = self.certificates.get_by_id(certificate_id).await?;

        use docuvi_core::models::certificate::CertificateStatus;
        match certificate.status {
            CertificateStatus::Active => {}
            CertificateStatus::Revoked => {
                return Err(CertError::AlreadyRevoked {
                    code: certificate.code,
                }
                .into());
            }
            CertificateStatus::Expired => {
                return Err(CertError::CertificateNotActive {
                    code: certificate.code,
                }
                .into());
            }
        }

        let revoked = self
            .certificates
            .revoke(certificate_id, reason, actor_id)
            .await?;

        info!(
            certificate_id = %revoked.id,
            code = %revoked.code,
            reason,
            "Certificate revoked"
        );

        self.events.publish(DomainEvent::CertificateRevoked {
            certificate_id: revoked.id,
            client_id: revoked.client_id,
            code: revoked.code.clone(),
            reason: reason.to_string(),
        });
        self.list_cache.invalidate(&revoked.client_id);

        Ok(revoked)
    }

    /// Transition Active certificates whose window has passed to
    /// Expired. Idempotent; returns the number of rows transitioned.
    pub async fn sweep_expired(&self) -> DocuviResult<u64> {
        let today = Utc::now().date_naive();
        let count = self.certificates.mark_expired_before(today).await?;
        if count > 0 {
            info!(count, "Expired certificates swept");
            self.list_cache.invalidate_all();
        }
        Ok(count)
    }

    /// Active certificates whose validity ends within `days` of today.
    pub async fn certificates_expiring_within(
        &self,
        days: i64,
    ) -> DocuviResult<Vec<Certificate>> {
        let today = Utc::now().date_naive();
        self.certificates.list_expiring_within(today, days).await
    }

    /// Approved documents expiring within `days` of today, with client
    /// context for notification routing.
    pub async fn documents_expiring_within(
        &self,
        days: i64,
    ) -> DocuviResult<Vec<ExpiringDocument>> {
        let today = Utc::now().date_naive();
        self.documents.list_expiring_within(today, days).await
    }

    /// A client's certificates, newest first, served through the TTL
    /// cache. Issue and revoke invalidate the affected entry.
    pub async fn list_certificates(&self, client_id: Uuid) -> DocuviResult<Vec<Certificate>> {
        if let Some(cached) = self.list_cache.get(&client_id) {
            return Ok(cached);
        }
        let certificates = self.certificates.list_by_client(client_id).await?;
        self.list_cache.insert(client_id, certificates.clone());
        Ok(certificates)
    }

    pub fn config(&self) -> &CertConfig {
        &self.config
    }
}
