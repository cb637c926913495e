use std::{future::Future, pin::Pin};

use crate::config::{StoreConfig, StoreKind, VectorSpace};
use crate::errors::StoreError;
use crate::record::{PointRecord, SearchHit};

pub mod memory;
pub mod qdrant;

pub use memory::InMemoryStore;
pub use qdrant::QdrantStore;

/// Boxed future returned by [`VectorStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Collection lifecycle and point storage over vectors plus payloads.
pub trait VectorStore: Send + Sync {
    /// Creates `name` with the given vector space.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the collection is
    /// present; any other failure uses the remaining variants.
    fn create_collection<'a>(&'a self, name: &'a str, space: VectorSpace)
    -> StoreFuture<'a, ()>;

    fn collection_exists<'a>(&'a self, name: &'a str) -> StoreFuture<'a, bool>;

    /// Writes the whole batch in one call. Returns the number of points written.
    fn upsert<'a>(&'a self, name: &'a str, points: Vec<PointRecord>) -> StoreFuture<'a, u64>;

    /// Exact top-k similarity search, payload included.
    fn search<'a>(
        &'a self,
        name: &'a str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> StoreFuture<'a, Vec<SearchHit>>;
}

/// Builds the configured store handle. Does not check reachability.
///
/// # Errors
/// Returns [`StoreError::Backend`] if the client cannot be constructed.
pub fn connect(cfg: &StoreConfig) -> Result<Box<dyn VectorStore>, StoreError> {
    match cfg.kind {
        StoreKind::Qdrant => Ok(Box::new(QdrantStore::connect(cfg)?)),
        StoreKind::Memory => Ok(Box::new(InMemoryStore::new())),
    }
}
