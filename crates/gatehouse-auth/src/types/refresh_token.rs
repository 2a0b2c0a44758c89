//! Refresh-token record.
//!
//! # Security
//!
//! - The plaintext token is returned to the client and never persisted;
//!   only a SHA-256 hash is stored.
//! - At most one record exists per user: storing a new record replaces
//!   the previous one, so a superseded token is unusable immediately.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Refresh-token record held by the credential store.
///
/// Validating an incoming refresh token:
///
/// 1. Hash the presented token
/// 2. Look up by `(user_id, hash)`
/// 3. Check `is_valid()` before accepting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRecord {
    /// User the token was issued to. Unique key of the store.
    pub user_id: String,

    /// SHA-256 hash of the token value.
    pub token_hash: String,

    /// When this record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When this token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl RefreshTokenRecord {
    /// Creates a record for a freshly generated token.
    #[must_use]
    pub fn new(user_id: impl Into<String>, token: &str, lifetime: time::Duration) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            user_id: user_id.into(),
            token_hash: Self::hash_token(token),
            created_at: now,
            expires_at: now + lifetime,
        }
    }

    /// Returns `true` if this record has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }

    /// Returns `true` if this record is still usable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }

    /// Hashes a token value with SHA-256.
    ///
    /// Used both when storing new tokens and when looking up presented
    /// tokens.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Generates a cryptographically secure random token.
    ///
    /// Returns a 256-bit random value encoded as base64url (43 chars).
    #[must_use]
    pub fn generate_token() -> String {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_hash_token() {
        let hash = RefreshTokenRecord::hash_token("token-value");

        // SHA-256 renders as 64 hex characters
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, RefreshTokenRecord::hash_token("token-value"));
        assert_ne!(hash, RefreshTokenRecord::hash_token("other-value"));
    }

    #[test]
    fn test_generate_token_shape() {
        let token = RefreshTokenRecord::generate_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_token_uniqueness() {
        let tokens: Vec<String> = (0..100)
            .map(|_| RefreshTokenRecord::generate_token())
            .collect();
        let mut unique = tokens.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(tokens.len(), unique.len());
    }

    #[test]
    fn test_record_stores_hash_not_token() {
        let token = RefreshTokenRecord::generate_token();
        let record = RefreshTokenRecord::new("user-1", &token, Duration::hours(1));

        assert_ne!(record.token_hash, token);
        assert_eq!(record.token_hash, RefreshTokenRecord::hash_token(&token));
    }

    #[test]
    fn test_expiry() {
        let record = RefreshTokenRecord::new("user-1", "t", Duration::hours(1));
        assert!(record.is_valid());

        let mut expired = record.clone();
        expired.expires_at = OffsetDateTime::now_utc() - Duration::minutes(1);
        assert!(expired.is_expired());
        assert!(!expired.is_valid());
    }

    #[test]
    fn test_serialization_round_trip() {
        let record = RefreshTokenRecord::new("user-1", "t", Duration::hours(1));
        let json = serde_json::to_string(&record).unwrap();
        let back: RefreshTokenRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
