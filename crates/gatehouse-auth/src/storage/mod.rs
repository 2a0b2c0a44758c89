//! Storage seams for the authentication gate.
//!
//! The credential store is the gate's only shared mutable resource.
//! Implementations must keep the single-record-per-user invariant and
//! must not tear a record under interleaved writes; last writer wins is
//! acceptable for concurrent refreshes of the same user.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::RefreshTokenRecord;

pub mod directory;
pub mod memory;

pub use directory::{StaticUserDirectory, UserDirectory};
pub use memory::InMemoryRefreshTokenStore;

/// Storage trait for refresh-token records.
///
/// Lookups by user must be unique-resolving: [`put`](Self::put) replaces
/// any existing record for the same user rather than appending.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Stores a record, replacing any existing record for the same user.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    async fn put(&self, record: RefreshTokenRecord) -> AuthResult<()>;

    /// Finds the record for a user.
    ///
    /// Returns records regardless of expiration; callers check
    /// `is_valid()` before accepting.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    async fn find_by_user(&self, user_id: &str) -> AuthResult<Option<RefreshTokenRecord>>;

    /// Finds the record matching both user and token hash.
    ///
    /// This is the refresh-exchange lookup: a superseded token no longer
    /// matches because its record was replaced.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    async fn find_by_user_and_hash(
        &self,
        user_id: &str,
        token_hash: &str,
    ) -> AuthResult<Option<RefreshTokenRecord>>;

    /// Removes the record for a user (logout / revocation).
    ///
    /// Returns `true` if a record existed.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    async fn remove_by_user(&self, user_id: &str) -> AuthResult<bool>;

    /// Deletes expired records.
    ///
    /// Should be called periodically to bound store growth. Returns the
    /// number of records deleted.
    ///
    /// # Errors
    /// Returns an error if the cleanup fails.
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
