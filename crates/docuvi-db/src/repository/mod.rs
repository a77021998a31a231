//! SurrealDB repository implementations.

mod audit;
mod certificate;
mod client;
mod document;
mod document_type;
mod notification;
mod requirement;
mod user;

pub use audit::SurrealAuditLogRepository;
pub use certificate::SurrealCertificateRepository;
pub use client::SurrealClientRepository;
pub use document::SurrealDocumentRepository;
pub use document_type::SurrealDocumentTypeRepository;
pub use notification::SurrealNotificationRepository;
pub use requirement::SurrealRequirementRepository;
pub use user::SurrealUserRepository;
