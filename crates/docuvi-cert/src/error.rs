//! Certificate-service error types.

use chrono::NaiveDate;
use docuvi_core::error::DocuviError;

/// Errors raised by the certificate lifecycle services.
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error(
        "Client is not compliant: {fulfilled}/{total} mandatory requirements fulfilled"
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

    #[error("Invalid validity window: {from} is after {to}")]
    InvalidWindow { from: NaiveDate, to: NaiveDate },

    #[error("Certificate rendering failed: {0}")]
    Rendering(String),
}

impl From<CertError> for DocuviError {
    fn from(err: CertError) -> Self {
        match err {
            CertError::NotCompliant {
                total,
                fulfilled,
                pending,
            } => DocuviError::NotCompliant {
                total,
                fulfilled,
                pending,
            },
            CertError::CodeGenerationFailed { attempts } => {
                DocuviError::CodeGenerationFailed { attempts }
            }
            CertError::AlreadyRevoked { code } => DocuviError::AlreadyRevoked { code },
            CertError::CertificateNotActive { code } => {
                DocuviError::CertificateNotActive { code }
            }
            CertError::InvalidWindow { from, to } => DocuviError::Validation {
                message: format!("valid_from {from} is after valid_to {to}"),
            },
            CertError::Rendering(msg) => DocuviError::Rendering(msg),
        }
    }
}
