//! Cache key builders for ParkHub cache entries.

use uuid::Uuid;

/// Namespace applied to all ParkHub cache keys.
const PREFIX: &str = "parkhub";

/// Cache key marking a token id as revoked.
pub fn revoked_token(token_id: Uuid) -> String {
    format!("{PREFIX}:revoked:{token_id}")
}
