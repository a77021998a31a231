//! Error types for the Docuvi system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocuviError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error(
        "Client does not meet all mandatory requirements: \
         {fulfilled} of {total} fulfilled, {pending} pending"
    )]
    NotCompliant {
        total: u32,
        fulfilled: u32,
        pending: u32,
    },

    #[error("Could not generate a unique certificate code after {attempts} attempts")]
    CodeGenerationFailed { attempts: u32 },

    #[error("Certificate {code} is already revoked")]
    AlreadyRevoked { code: String },

    #[error("Certificate {code} is not active")]
    CertificateNotActive { code: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Rendering error: {0}")]
    Rendering(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DocuviResult<T> = Result<T, DocuviError>;
