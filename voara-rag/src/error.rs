//! Error types for the `voara-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval-engine operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid chunking parameters or a chunking failure.
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A connection or backend error in the vector store.
    ///
    /// An absent collection is not an error; callers check existence
    /// through [`VectorStore::collection_info`](crate::VectorStore::collection_info).
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector's dimension does not match the collection's dimension.
    #[error("Dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension the collection was created with.
        expected: usize,
        /// The dimension that was actually observed.
        actual: usize,
    },

    /// A per-document failure during ingestion.
    #[error("Ingestion failed for document '{doc_source}': {message}")]
    Ingestion {
        /// The source identifier of the document that failed.
        doc_source: String,
        /// A description of the failure.
        message: String,
    },

    /// An aggregate failure while answering a retrieval request.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A failure reading or writing the shared last-context record.
    #[error("Last-context store error: {0}")]
    ContextStore(String),
}

/// A convenience result type for retrieval-engine operations.
pub type Result<T> = std::result::Result<T, RagError>;
