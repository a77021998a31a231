//! Event-to-notification consumer.
//!
//! Subscribes to the [`EventBus`] and turns domain events into
//! `notification` rows for the affected client's user account. The
//! lifecycle services never touch notification delivery; this consumer
//! is the only bridge.

use docuvi_core::models::notification::{CreateNotification, NotificationKind};
use docuvi_core::repository::{ClientRepository, NotificationRepository};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::events::DomainEvent;

pub struct Notifier<C, N>
where
    C: ClientRepository,
    N: NotificationRepository,
{
    clients: C,
    notifications: N,
}

impl<C, N> Notifier<C, N>
where
    C: ClientRepository,
    N: NotificationRepository,
{
    pub fn new(clients: C, notifications: N) -> Self {
        Self {
            clients,
            notifications,
        }
    }

    /// Consume events until the bus is closed. Delivery failures are
    /// logged and skipped; a lagging receiver resumes at the current
    /// position.
    pub async fn run(self, mut rx: broadcast::Receiver<DomainEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = self.handle(event).await {
                        warn!(error = %e, "Notification delivery failed");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Notification consumer lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Convert one event into a notification row, if the client has a
    /// linked user account.
    pub async fn handle(&self, event: DomainEvent) -> docuvi_core::error::DocuviResult<()> {
        let (client_id, input) = match event {
            DomainEvent::CertificateIssued {
                certificate_id,
                client_id,
                code,
            } => (
                client_id,
                PartialNotification {
                    kind: NotificationKind::CertificateIssued,
                    title: "Compliance certificate issued".into(),
                    message: format!("Certificate {code} has been issued for your company."),
                    document_id: None,
                    certificate_id: Some(certificate_id),
                },
            ),
            DomainEvent::CertificateRevoked {
                certificate_id,
                client_id,
                code,
                reason,
            } => (
                client_id,
                PartialNotification {
                    kind: NotificationKind::CertificateRevoked,
                    title: "Compliance certificate revoked".into(),
                    message: format!("Certificate {code} has been revoked: {reason}"),
                    document_id: None,
                    certificate_id: Some(certificate_id),
                },
            ),
            DomainEvent::DocumentApproved {
                document_id,
                client_id,
                file_name,
            } => (
                client_id,
                PartialNotification {
                    kind: NotificationKind::DocumentApproved,
                    title: "Document approved".into(),
                    message: format!("{file_name} has been approved."),
                    document_id: Some(document_id),
                    certificate_id: None,
                },
            ),
            DomainEvent::DocumentRejected {
                document_id,
                client_id,
                file_name,
                reason,
            } => (
                client_id,
                PartialNotification {
                    kind: NotificationKind::DocumentRejected,
                    title: "Document rejected".into(),
                    message: format!("{file_name} was rejected: {reason}"),
                    document_id: Some(document_id),
                    certificate_id: None,
                },
            ),
            DomainEvent::DocumentExpiringSoon {
                document_id,
                client_id,
                expires_at,
                days_remaining,
            } => (
                client_id,
                PartialNotification {
                    kind: NotificationKind::DocumentExpiringSoon,
                    title: "Document expiring soon".into(),
                    message: format!(
                        "A document expires on {expires_at} ({days_remaining} days left). \
                         Please upload a renewal."
                    ),
                    document_id: Some(document_id),
                    certificate_id: None,
                },
            ),
        };

        let client = self.clients.get_by_id(client_id).await?;
        let Some(user_id) = client.user_id else {
            debug!(%client_id, "Client has no linked user, notification skipped");
            return Ok(());
        };

        self.notifications
            .create(CreateNotification {
                user_id,
                kind: input.kind,
                title: input.title,
                message: input.message,
                document_id: input.document_id,
                certificate_id: input.certificate_id,
            })
            .await?;

        Ok(())
    }
}

struct PartialNotification {
    kind: NotificationKind,
    title: String,
    message: String,
    document_id: Option<uuid::Uuid>,
    certificate_id: Option<uuid::Uuid>,
}
