//! Docuvi server — application entry point.
//!
//! Connects to SurrealDB, runs migrations, starts the notification
//! consumer, then drives the daily maintenance cycle: the certificate
//! expiry sweep and the expiring-document notice job.

use std::time::Duration;

use docuvi_cert::{CertConfig, CertificateService, DomainEvent, EventBus, Notifier};
use docuvi_db::repository::{
    SurrealCertificateRepository, SurrealClientRepository, SurrealDocumentRepository,
    SurrealDocumentTypeRepository, SurrealNotificationRepository, SurrealRequirementRepository,
};
use docuvi_db::{DbConfig, DbManager, run_migrations};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn cert_config_from_env() -> CertConfig {
    let defaults = CertConfig::default();
    CertConfig {
        verification_base_url: env_or(
            "DOCUVI_VERIFICATION_BASE_URL",
            &defaults.verification_base_url,
        ),
        expiring_notice_days: env_or("DOCUVI_EXPIRING_NOTICE_DAYS", "30")
            .parse()
            .unwrap_or(defaults.expiring_notice_days),
        ..defaults
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("docuvi=info".parse().unwrap()),
        )
        .json()
        .init();

    info!("Starting Docuvi server...");

    let db_config = DbConfig::from_env();
    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(e) => {
            error!(error = %e, "Database connection failed");
            std::process::exit(1);
        }
    };

    if let Err(e) = manager.health().await {
        error!(error = %e, "Database health check failed");
        std::process::exit(1);
    }

    if let Err(e) = run_migrations(manager.client()).await {
        error!(error = %e, "Migrations failed");
        std::process::exit(1);
    }

    let db = manager.client().clone();
    let events = EventBus::default();

    // Notification consumer: turns domain events into notification rows.
    let notifier = Notifier::new(
        SurrealClientRepository::new(db.clone()),
        SurrealNotificationRepository::new(db.clone()),
    );
    tokio::spawn(notifier.run(events.subscribe()));

    let cert_config = cert_config_from_env();
    let notice_days = cert_config.expiring_notice_days;
    let service = CertificateService::new(
        SurrealRequirementRepository::new(db.clone()),
        SurrealDocumentRepository::new(db.clone()),
        SurrealDocumentTypeRepository::new(db.clone()),
        SurrealCertificateRepository::new(db.clone()),
        cert_config,
        events.clone(),
    );

    info!("Docuvi server running, maintenance cycle every 24h");

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;

        match service.sweep_expired().await {
            Ok(count) => info!(count, "Certificate expiry sweep complete"),
            Err(e) => error!(error = %e, "Certificate expiry sweep failed"),
        }

        match service.documents_expiring_within(notice_days).await {
            Ok(expiring) => {
                info!(count = expiring.len(), "Expiring-document notices queued");
                for doc in expiring {
                    events.publish(DomainEvent::DocumentExpiringSoon {
                        document_id: doc.document_id,
                        client_id: doc.client_id,
                        expires_at: doc.expires_at,
                        days_remaining: doc.days_remaining,
                    });
                }
            }
            Err(e) => error!(error = %e, "Expiring-document scan failed"),
        }
    }
}
