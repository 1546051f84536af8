//! The storage boundary used by the harvest engine and the HTTP surface.

use async_trait::async_trait;

use crate::error_handling::StorageError;

use super::models::ResolvedRecord;

/// Durable store for resolved records.
///
/// Implementations must accept concurrent inserts from many tasks.
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Persists one record.
    async fn insert(&self, record: &ResolvedRecord) -> Result<(), StorageError>;

    /// Records with at least one TXT value containing `keyword`
    /// (case-insensitive substring match).
    async fn find_by_keyword(&self, keyword: &str) -> Result<Vec<ResolvedRecord>, StorageError>;

    /// Every stored record, oldest first.
    async fn list_all(&self) -> Result<Vec<ResolvedRecord>, StorageError>;
}
