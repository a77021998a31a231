//! Certificate code generation.
//!
//! Codes look like `CERT-2026-K7Q2M9XA`: the issue year plus eight
//! random characters from an uppercase alphanumeric alphabet. Uniqueness
//! is enforced by the database index, not here; the issuer retries on
//! collision.

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 8;

/// Generate a candidate certificate code for the given issue year.
pub fn generate_code(year: i32) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("CERT-{year}-{suffix}")
}
