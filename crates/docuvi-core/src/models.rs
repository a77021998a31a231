//! Domain models for Docuvi.
//!
//! These are the core types shared across all crates.

pub mod audit;
pub mod certificate;
pub mod client;
pub mod document;
pub mod document_type;
pub mod notification;
pub mod requirement;
pub mod user;
