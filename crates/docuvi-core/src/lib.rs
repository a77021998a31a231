//! Docuvi Core — domain models, repository traits, and shared error
//! types for the document-compliance tracker.
//!
//! This crate has no I/O dependencies. Persistence implementations live
//! in `docuvi-db`; the certificate lifecycle services live in
//! `docuvi-cert`.

pub mod error;
pub mod models;
pub mod repository;
