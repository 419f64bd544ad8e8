//! Merchant model.
//!
//! Merchants authenticate payments with an API key. Keys are stored as
//! SHA-256 hex digests, never in plain text.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Represents a merchant record from the database.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Merchant {
    pub id: i32,
    pub name: String,

    /// SHA-256 hash of the merchant's API key (64 hex characters)
    #[serde(skip_serializing)]
    pub api_key_hash: String,

    /// User owning the merchant; payments are credited to this user's card
    pub user_id: i32,

    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Hash a presented API key the way it is stored.
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());

    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_hex_digest() {
        let hash = hash_api_key("merchant-key");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_api_key("merchant-key"));
        assert_ne!(hash, hash_api_key("other-key"));
    }
}
