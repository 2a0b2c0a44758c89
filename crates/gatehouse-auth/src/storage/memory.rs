//! In-memory refresh-token store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::storage::RefreshTokenStore;
use crate::types::RefreshTokenRecord;

/// Refresh-token store backed by a `HashMap` keyed by user id.
///
/// Writers for the same user serialize on the lock, so records are never
/// torn: the last completed write wins, matching the
/// single-record-per-user invariant.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    records: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn put(&self, record: RefreshTokenRecord) -> AuthResult<()> {
        let mut records = self.records.write().await;
        records.insert(record.user_id.clone(), record);
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        let records = self.records.read().await;
        Ok(records.get(user_id).cloned())
    }

    async fn find_by_user_and_hash(
        &self,
        user_id: &str,
        token_hash: &str,
    ) -> AuthResult<Option<RefreshTokenRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(user_id)
            .filter(|record| record.token_hash == token_hash)
            .cloned())
    }

    async fn remove_by_user(&self, user_id: &str) -> AuthResult<bool> {
        let mut records = self.records.write().await;
        Ok(records.remove(user_id).is_some())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.is_valid());
        Ok((before - records.len()) as u64)
    }
}
