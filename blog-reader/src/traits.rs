use crate::types::{Cursor, Predicate, QueryOptions, QueryResponse, RawRecord, Result};
use async_trait::async_trait;

/// Read-only access to the remote document store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Human-readable name for this store, used in logs
    fn store_name(&self) -> String;

    /// Search documents matching every predicate
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse>;

    /// Dereference a cursor previously reported by `query` or `fetch_page`
    async fn fetch_page(&self, cursor: &Cursor) -> Result<QueryResponse>;

    /// Fetch one document by its uid; `None` when the store has no such document
    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawRecord>>;
}
