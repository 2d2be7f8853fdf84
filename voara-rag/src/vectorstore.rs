//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{CollectionInfo, IndexedPoint, RetrievalResult};
use crate::error::Result;

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named collections of [`IndexedPoint`]s and hold a
/// single long-lived connection shared by all callers in the process; every
/// method is safe to call concurrently. An absent collection is never an
/// error here — callers check existence through
/// [`collection_info`](VectorStore::collection_info) — while connection and
/// backend failures surface as [`RagError::VectorStore`](crate::RagError::VectorStore).
///
/// # Example
///
/// ```rust,ignore
/// use voara_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.ensure_collection("voara_kb", 768).await?;
/// store.upsert("voara_kb", &points).await?;
/// let results = store.search("voara_kb", &query_vector, 3, Some(0.3)).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not exist, sized for `dimensions`.
    ///
    /// Idempotent. Returns whether the collection already existed.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch)
    /// if the collection exists with a different dimension — changing
    /// dimension requires recreating the collection, never silent
    /// migration.
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<bool>;

    /// Upsert points into a collection.
    ///
    /// Idempotent per id: existing ids are replaced, new ids inserted. The
    /// batch succeeds or fails as a whole; on failure the caller must treat
    /// every point in the batch as unconfirmed.
    async fn upsert(&self, collection: &str, points: &[IndexedPoint]) -> Result<()>;

    /// Delete all points whose payload `source` matches.
    ///
    /// Supports the supersede-on-re-ingest lifecycle: a re-ingested
    /// document replaces its chunks rather than accumulating stale ones.
    async fn delete_by_source(&self, collection: &str, source: &str) -> Result<()>;

    /// Search for the `top_k` most similar points to the given vector.
    ///
    /// Returns at most `top_k` results ordered by descending score,
    /// dropping matches below `score_threshold` when one is given.
    /// Equal-score tie-breaking is backend-defined: the in-memory backend
    /// prefers the most recently inserted point; the Qdrant backend
    /// returns the server's order.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<RetrievalResult>>;

    /// Point count and status of a collection, or `None` if it does not
    /// exist.
    async fn collection_info(&self, collection: &str) -> Result<Option<CollectionInfo>>;

    /// Release the underlying connection.
    ///
    /// Safe to call multiple times; calls after the first are no-ops.
    /// Other operations on a closed store fail with
    /// [`RagError::VectorStore`](crate::RagError::VectorStore).
    async fn close(&self) -> Result<()>;
}
