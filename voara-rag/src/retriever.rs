//! Query-time retrieval: embed → search → filter → format.
//!
//! The [`Retriever`] answers one retrieval request per conversational
//! turn. It shares the embedding provider and vector store with the
//! ingestion pipeline but holds no mutable state of its own.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::RagConfig;
use crate::document::RetrievalResult;
use crate::embedding::{EmbeddingIntent, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Separator between formatted context blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

/// Answers retrieval requests against the knowledge-base collection.
///
/// An empty result set means "no relevant knowledge found" and is never an
/// error; callers that cannot tolerate failure at all (the conversational
/// boundary) wrap this in [`KnowledgeBaseTool`](crate::KnowledgeBaseTool).
pub struct Retriever {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    /// Create a new retriever over the given adapters.
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self { config, embedder, store }
    }

    /// Return a reference to the retriever's configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Retrieve the most relevant chunks for a query.
    ///
    /// `top_k` and `score_threshold` default to the configured values.
    /// Results are ordered by descending score, every score meets the
    /// threshold, and duplicates (identical text, or a repeated
    /// source + header pair) are collapsed to their highest-scoring
    /// instance. A query against a collection that does not exist yet
    /// returns an empty set.
    ///
    /// # Errors
    ///
    /// Embedding or search failures propagate as
    /// [`RagError::Retrieval`]; the caller is expected to degrade
    /// gracefully rather than fail the conversation.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: Option<usize>,
        score_threshold: Option<f32>,
    ) -> Result<Vec<RetrievalResult>> {
        let top_k = top_k.unwrap_or(self.config.top_k);
        let threshold = score_threshold.unwrap_or(self.config.score_threshold);
        let collection = &self.config.collection_name;

        let query_vector =
            self.embedder.embed(query, EmbeddingIntent::Query).await.map_err(|e| {
                error!(error = %e, "query embedding failed");
                RagError::Retrieval(format!("query embedding failed: {e}"))
            })?;

        let info = self.store.collection_info(collection).await.map_err(|e| {
            error!(collection, error = %e, "collection lookup failed");
            RagError::Retrieval(format!("collection lookup failed: {e}"))
        })?;
        if info.is_none() {
            debug!(collection, "collection does not exist, returning no results");
            return Ok(Vec::new());
        }

        let mut results = self
            .store
            .search(collection, &query_vector, top_k, Some(threshold))
            .await
            .map_err(|e| {
                error!(collection, error = %e, "vector store search failed");
                RagError::Retrieval(format!("search failed in collection '{collection}': {e}"))
            })?;

        // The backend already applied the threshold and ordering; enforce
        // both here so every backend presents identical guarantees.
        results.retain(|r| r.score >= threshold);
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        let results = dedupe(results);

        info!(result_count = results.len(), "retrieval completed");
        Ok(results)
    }

    /// Retrieve and format context for injection into a model's input.
    ///
    /// Returns an empty string when nothing relevant was found — callers
    /// must treat that as "no knowledge", not as an error.
    pub async fn retrieve_context(&self, query: &str, include_metadata: bool) -> Result<String> {
        let results = self.retrieve(query, None, None).await?;
        Ok(self.format_context(&results, include_metadata))
    }

    /// Retrieve context together with the distinct source identifiers of
    /// the results, in rank order.
    pub async fn retrieve_with_sources(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<(String, Vec<String>)> {
        let results = self.retrieve(query, top_k, None).await?;
        let context = self.format_context(&results, false);

        let mut sources = Vec::new();
        for result in &results {
            if !result.source.is_empty() && !sources.contains(&result.source) {
                sources.push(result.source.clone());
            }
        }
        Ok((context, sources))
    }

    /// Format results into a single context string within the configured
    /// budget.
    ///
    /// Blocks are joined with a blank line; when `include_metadata` is set
    /// each block is prefixed with a `[source | header]` line. Results are
    /// included whole, in order, until the next block would push the
    /// output past `max_context_length` characters — truncation happens
    /// only at chunk boundaries, never mid-chunk.
    pub fn format_context(&self, results: &[RetrievalResult], include_metadata: bool) -> String {
        let budget = self.config.max_context_length;
        let mut output = String::new();
        let mut used = 0;

        for result in results {
            let block = if include_metadata {
                let label = if result.header.is_empty() {
                    format!("[{}]", result.source)
                } else {
                    format!("[{} | {}]", result.source, result.header)
                };
                format!("{label}\n{}", result.text)
            } else {
                result.text.clone()
            };

            let block_len = block.chars().count();
            let needed =
                if output.is_empty() { block_len } else { BLOCK_SEPARATOR.len() + block_len };
            if used + needed > budget {
                debug!(used, budget, "context budget reached, truncating");
                break;
            }

            if !output.is_empty() {
                output.push_str(BLOCK_SEPARATOR);
            }
            output.push_str(&block);
            used += needed;
        }

        output
    }
}

/// Collapse duplicate results, keeping the highest-scoring instance.
///
/// Input must already be sorted by descending score; a result is dropped
/// when its text was already seen or its source + header pair repeats.
fn dedupe(results: Vec<RetrievalResult>) -> Vec<RetrievalResult> {
    let mut seen_texts: HashSet<String> = HashSet::new();
    let mut seen_locations: HashSet<(String, String)> = HashSet::new();

    results
        .into_iter()
        .filter(|result| {
            let location = (result.source.clone(), result.header.clone());
            if seen_texts.contains(&result.text) || seen_locations.contains(&location) {
                return false;
            }
            seen_texts.insert(result.text.clone());
            seen_locations.insert(location);
            true
        })
        .collect()
}
