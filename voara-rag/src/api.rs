//! Boundary types and handlers for the query and stats endpoints.
//!
//! The HTTP layer itself lives outside this crate; it deserializes a
//! [`RagQueryRequest`], calls [`handle_query`] / [`collect_stats`], and
//! serializes the result.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::RagConfig;
use crate::document::RetrievalResult;
use crate::error::{RagError, Result};
use crate::retriever::Retriever;
use crate::vectorstore::VectorStore;

/// Maximum query length in characters.
const MAX_QUERY_LEN: usize = 1000;

/// Maximum per-request `top_k` override.
const MAX_TOP_K: usize = 10;

/// A knowledge-base query request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagQueryRequest {
    /// The search query, 1–1000 characters.
    pub query: String,
    /// Number of results to return, 1–10; defaults to the configured
    /// value when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl RagQueryRequest {
    /// Validate the request bounds.
    pub fn validate(&self) -> Result<()> {
        let query_len = self.query.chars().count();
        if query_len == 0 || query_len > MAX_QUERY_LEN {
            return Err(RagError::Retrieval(format!(
                "query must be 1-{MAX_QUERY_LEN} characters, got {query_len}"
            )));
        }
        if let Some(top_k) = self.top_k {
            if top_k == 0 || top_k > MAX_TOP_K {
                return Err(RagError::Retrieval(format!(
                    "top_k must be 1-{MAX_TOP_K}, got {top_k}"
                )));
            }
        }
        Ok(())
    }
}

/// Response to a knowledge-base query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagQueryResponse {
    /// The original query.
    pub query: String,
    /// Retrieved results, ordered by descending score.
    pub results: Vec<RetrievalResult>,
    /// Formatted context for LLM injection.
    pub context: String,
    /// Retrieval time in milliseconds.
    pub retrieval_time_ms: f64,
}

/// Collection half of the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Configured collection name.
    pub name: String,
    /// Whether the collection exists.
    pub exists: bool,
    /// Number of stored points, 0 when the collection does not exist.
    pub points_count: u64,
    /// Backend status, `not_found` when the collection does not exist.
    pub status: String,
}

/// Active-configuration half of the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Embedding vector dimensionality.
    pub embedding_dimension: usize,
    /// Chunk size in characters.
    pub chunk_size: usize,
    /// Chunk overlap in characters.
    pub chunk_overlap: usize,
    /// Default number of results per search.
    pub top_k: usize,
    /// Minimum similarity score for relevant matches.
    pub score_threshold: f32,
}

/// Knowledge-base statistics for operators and the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagStats {
    /// Collection existence, point count, and status.
    pub collection: CollectionStats,
    /// The active retrieval configuration.
    pub config: ConfigSnapshot,
}

/// Run a validated query through the retriever, timing the retrieval.
pub async fn handle_query(
    retriever: &Retriever,
    request: &RagQueryRequest,
) -> Result<RagQueryResponse> {
    request.validate()?;

    let started = Instant::now();
    let results = retriever.retrieve(&request.query, request.top_k, None).await?;
    let context = retriever.format_context(&results, false);
    let retrieval_time_ms = started.elapsed().as_secs_f64() * 1000.0;

    Ok(RagQueryResponse { query: request.query.clone(), results, context, retrieval_time_ms })
}

/// Collect collection and configuration statistics.
///
/// An absent collection is reported as `exists: false` with zero points,
/// never as an error.
pub async fn collect_stats(store: &dyn VectorStore, config: &RagConfig) -> Result<RagStats> {
    let info = store.collection_info(&config.collection_name).await?;

    let collection = match info {
        Some(info) => CollectionStats {
            name: config.collection_name.clone(),
            exists: true,
            points_count: info.points_count,
            status: info.status,
        },
        None => CollectionStats {
            name: config.collection_name.clone(),
            exists: false,
            points_count: 0,
            status: "not_found".to_string(),
        },
    };

    Ok(RagStats {
        collection,
        config: ConfigSnapshot {
            embedding_model: config.embedding_model.clone(),
            embedding_dimension: config.embedding_dimension,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            top_k: config.top_k,
            score_threshold: config.score_threshold,
        },
    })
}
