//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// What an embedding will be used for.
///
/// Some embedding models optimize document-side and query-side vectors
/// differently, so the intent travels with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingIntent {
    /// Embedding a document chunk at indexing time.
    Document,
    /// Embedding a user query at retrieval time.
    Query,
}

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend behind a unified
/// async interface. Providers hold no per-call mutable state and do no
/// caching; caching, if any, belongs to the caller.
///
/// # Example
///
/// ```rust,ignore
/// use voara_rag::{EmbeddingIntent, EmbeddingProvider};
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world", EmbeddingIntent::Query).await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str, intent: EmbeddingIntent) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// Output order matches input order: index `i` of the output is the
    /// embedding of index `i` of the input. An empty batch yields an empty
    /// result. The default implementation calls
    /// [`embed`](EmbeddingProvider::embed) sequentially; backends with
    /// native batching should override it.
    async fn embed_batch(&self, texts: &[&str], intent: EmbeddingIntent) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text, intent).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// The provider's batch-size cap, if it has one.
    ///
    /// The ingestion pipeline splits larger inputs into sub-batches of at
    /// most this size before calling
    /// [`embed_batch`](EmbeddingProvider::embed_batch).
    fn max_batch_size(&self) -> Option<usize> {
        None
    }
}
