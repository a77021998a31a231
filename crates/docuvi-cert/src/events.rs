//! Domain event bus.
//!
//! A thin wrapper over `tokio::sync::broadcast`. Publishers never block
//! and never fail: an event with no live subscribers is dropped, which
//! is the correct behavior for best-effort notification fan-out.

use chrono::NaiveDate;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted by the lifecycle services. Every variant carries
/// explicit typed fields; consumers never parse payloads.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    CertificateIssued {
        certificate_id: Uuid,
        client_id: Uuid,
        code: String,
    },
    CertificateRevoked {
        certificate_id: Uuid,
        client_id: Uuid,
        code: String,
        reason: String,
    },
    DocumentApproved {
        document_id: Uuid,
        client_id: Uuid,
        file_name: String,
    },
    DocumentRejected {
        document_id: Uuid,
        client_id: Uuid,
        file_name: String,
        reason: String,
    },
    DocumentExpiringSoon {
        document_id: Uuid,
        client_id: Uuid,
        expires_at: NaiveDate,
        days_remaining: i64,
    },
}

/// Broadcast bus for [`DomainEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Dropped silently when nobody is subscribed.
    pub fn publish(&self, event: DomainEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("domain event dropped: no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
