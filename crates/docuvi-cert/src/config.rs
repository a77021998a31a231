//! Certificate service configuration.

/// Configuration for the certificate lifecycle services.
#[derive(Debug, Clone)]
pub struct CertConfig {
    /// Base URL of the public verifier; the artifact links and QR encode
    /// `<base>/verify/<code>`.
    pub verification_base_url: String,
    /// Max code-generation attempts before issuance fails (default: 3).
    pub code_attempts: u32,
    /// TTL for the per-client certificate list cache, in seconds
    /// (default: 60).
    pub cache_ttl_secs: u64,
    /// Look-ahead window for expiring-soon queries, in days
    /// (default: 30).
    pub expiring_notice_days: i64,
}

impl Default for CertConfig {
    fn default() -> Self {
        Self {
            verification_base_url: "https://docuvi.example".into(),
            code_attempts: 3,
            cache_ttl_secs: 60,
            expiring_notice_days: 30,
        }
    }
}

impl CertConfig {
    /// Full verification URL for a certificate code.
    pub fn verification_url(&self, code: &str) -> String {
        format!(
            "{}/verify/{code}",
            self.verification_base_url.trim_end_matches('/')
        )
    }
}
