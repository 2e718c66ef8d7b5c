//! SHA-256 helpers for values that must never be stored raw.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `input`.
pub(crate) fn sha256_hex(input: &[u8]) -> String {
    let digest = Sha256::digest(input);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
