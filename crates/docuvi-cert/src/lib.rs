//! Certificate lifecycle services for Docuvi.
//!
//! This crate owns everything between the repositories and the outside
//! world for compliance certificates: the compliance checker, the
//! issuer, the verifier, revocation, the expiry sweep, artifact
//! rendering, and the event bus that feeds notifications. It is generic
//! over the repository traits in `docuvi-core` and carries no database
//! dependency.

pub mod cache;
pub mod code;
pub mod config;
pub mod error;
pub mod events;
pub mod hash;
pub mod notifier;
pub mod render;
pub mod service;
pub mod verify;

pub use config::CertConfig;
pub use error::CertError;
pub use events::{DomainEvent, EventBus};
pub use notifier::Notifier;
pub use service::CertificateService;
