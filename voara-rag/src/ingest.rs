//! Ingestion pipeline: chunk → embed → store.
//!
//! The [`IngestionPipeline`] turns raw documents into indexed points. Each
//! document flows through the [`Chunker`], the [`EmbeddingProvider`] (with
//! document intent, in provider-capped sub-batches), and the
//! [`VectorStore`]. Documents are processed concurrently up to a bounded
//! limit; one document's failure never aborts the others.
//!
//! # Example
//!
//! ```rust,ignore
//! use voara_rag::{Document, IngestionPipeline};
//!
//! let pipeline = IngestionPipeline::new(config, embedder, store, chunker);
//! let report = pipeline.ingest(&documents).await?;
//! for failed in report.failures() {
//!     eprintln!("{}: {}", failed.source, failed.error.as_deref().unwrap_or(""));
//! }
//! ```

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Document, IndexedPoint};
use crate::embedding::{EmbeddingIntent, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// The result of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// Source identifier of the document.
    pub source: String,
    /// Number of chunks produced from the document.
    pub chunks_created: usize,
    /// Number of vectors written to the store.
    pub vectors_written: usize,
    /// The failure, if ingestion of this document failed. A failed
    /// document leaves no partial state behind and can simply be re-run.
    pub error: Option<String>,
}

impl DocumentOutcome {
    /// Whether this document was ingested successfully.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate report for one ingestion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Total chunks created across successful documents.
    pub chunks_created: usize,
    /// Total vectors written across successful documents.
    pub vectors_written: usize,
    /// Per-document outcomes, in input order.
    pub outcomes: Vec<DocumentOutcome>,
}

impl IngestReport {
    /// Iterate over the documents that failed.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded())
    }

    /// Whether every document was ingested successfully.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(DocumentOutcome::succeeded)
    }
}

/// Orchestrates document ingestion into the vector store.
///
/// Cancellation-safe: dropping the future returned by
/// [`ingest`](IngestionPipeline::ingest) aborts in-flight provider calls,
/// and because upserts are idempotent per id a cancelled ingestion can be
/// re-run without corrupting the index.
pub struct IngestionPipeline {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
}

impl IngestionPipeline {
    /// Create a new pipeline over the given adapters.
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        chunker: Arc<dyn Chunker>,
    ) -> Self {
        Self { config, embedder, store, chunker }
    }

    /// Ingest a batch of documents, building or refreshing the index.
    ///
    /// The collection is ensured once up front, sized to the provider's
    /// dimensionality. Documents are then processed concurrently (bounded
    /// by `max_concurrency`), each through chunk → embed → supersede →
    /// upsert. The report enumerates every document's outcome in input
    /// order.
    ///
    /// # Errors
    ///
    /// Fails as a whole only when the collection cannot be ensured —
    /// including [`RagError::DimensionMismatch`] when it exists with a
    /// different dimension. Per-document failures are reported in the
    /// returned [`IngestReport`], not as an error.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IngestReport> {
        let collection = &self.config.collection_name;
        self.store.ensure_collection(collection, self.embedder.dimensions()).await?;

        let outcomes: Vec<DocumentOutcome> = stream::iter(documents)
            .map(|document| self.ingest_document(document))
            .buffered(self.config.max_concurrency)
            .collect()
            .await;

        let report = IngestReport {
            chunks_created: outcomes.iter().map(|o| o.chunks_created).sum(),
            vectors_written: outcomes.iter().map(|o| o.vectors_written).sum(),
            outcomes,
        };

        info!(
            documents = documents.len(),
            chunks_created = report.chunks_created,
            vectors_written = report.vectors_written,
            failures = report.failures().count(),
            "ingestion finished"
        );

        Ok(report)
    }

    async fn ingest_document(&self, document: &Document) -> DocumentOutcome {
        match self.try_ingest_document(document).await {
            Ok((chunks_created, vectors_written)) => DocumentOutcome {
                source: document.source.clone(),
                chunks_created,
                vectors_written,
                error: None,
            },
            Err(e) => {
                error!(source = %document.source, error = %e, "document ingestion failed");
                DocumentOutcome {
                    source: document.source.clone(),
                    chunks_created: 0,
                    vectors_written: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn try_ingest_document(&self, document: &Document) -> Result<(usize, usize)> {
        let chunks = self.chunker.chunk(document)?;
        if chunks.is_empty() {
            info!(source = %document.source, chunk_count = 0, "ingested document (empty)");
            return Ok((0, 0));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embed_document_texts(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Ingestion {
                doc_source: document.source.clone(),
                message: format!(
                    "provider returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }

        // The collection was sized from the provider's declared
        // dimensionality; a vector that disagrees must not reach the store.
        let expected = self.embedder.dimensions();
        for vector in &embeddings {
            if vector.len() != expected {
                return Err(RagError::DimensionMismatch { expected, actual: vector.len() });
            }
        }

        let points: Vec<IndexedPoint> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, vector)| IndexedPoint {
                id: chunk.id.clone(),
                vector,
                payload: chunk.into(),
            })
            .collect();

        let collection = &self.config.collection_name;
        // Supersede: drop any chunks from a prior ingestion of this source
        // before writing the new set, so shrinking documents leave no
        // stale tail behind.
        self.store.delete_by_source(collection, &document.source).await?;
        self.store.upsert(collection, &points).await?;

        info!(source = %document.source, chunk_count = points.len(), "ingested document");
        Ok((chunks.len(), points.len()))
    }

    /// Embed chunk texts with document intent, splitting into
    /// provider-capped sub-batches issued concurrently.
    ///
    /// `buffered` preserves input order, which the zip in
    /// [`try_ingest_document`](Self::try_ingest_document) relies on.
    async fn embed_document_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let batch_limit = self.embedder.max_batch_size().unwrap_or(texts.len()).max(1);

        let sub_results: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(batch_limit))
            .map(|batch| self.embedder.embed_batch(batch, EmbeddingIntent::Document))
            .buffered(self.config.max_concurrency)
            .try_collect()
            .await?;

        Ok(sub_results.into_iter().flatten().collect())
    }
}
