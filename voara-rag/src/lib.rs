//! Knowledge-base retrieval engine for the Voara voice agent.
//!
//! This crate turns raw documents into vector-indexed chunks (ingestion)
//! and turns a query into a ranked, deduplicated, context-budgeted set of
//! passages (retrieval):
//!
//! - [`MarkdownChunker`] — splits documents into overlapping chunks at
//!   natural boundaries, preserving section headers
//! - [`EmbeddingProvider`] / [`GeminiEmbeddingProvider`] — text to
//!   fixed-dimension vectors, with distinct document and query intents
//! - [`VectorStore`] / [`QdrantVectorStore`] / [`InMemoryVectorStore`] —
//!   collection management, upserts, and similarity search
//! - [`IngestionPipeline`] — chunk → embed → store with per-document
//!   failure isolation
//! - [`Retriever`] — embed → search → filter → format, the path exercised
//!   per conversational turn
//! - [`KnowledgeBaseTool`] — the never-failing `search_knowledge_base`
//!   boundary consumed by the conversation layer
//!
//! The voice session itself, the HTTP server, and the embedding/vector-DB
//! engines are external collaborators behind the seams above.

pub mod api;
pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod inmemory;
pub mod ingest;
#[cfg(feature = "qdrant")]
pub mod qdrant;
pub mod retriever;
pub mod tool;
pub mod vectorstore;

mod error;

pub use api::{
    CollectionStats, ConfigSnapshot, RagQueryRequest, RagQueryResponse, RagStats, collect_stats,
    handle_query,
};
pub use chunking::{Chunker, MarkdownChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use context::{LastContext, LastContextStore};
pub use document::{
    Chunk, CollectionInfo, Document, IndexedPoint, PointPayload, RetrievalResult, chunk_id,
};
pub use embedding::{EmbeddingIntent, EmbeddingProvider};
pub use error::{RagError, Result};
#[cfg(feature = "gemini")]
pub use gemini::GeminiEmbeddingProvider;
pub use inmemory::InMemoryVectorStore;
pub use ingest::{DocumentOutcome, IngestReport, IngestionPipeline};
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
pub use retriever::Retriever;
pub use tool::{ERROR_FALLBACK, KnowledgeBaseTool, NO_RESULTS_FALLBACK, SearchOutcome};
pub use vectorstore::VectorStore;
