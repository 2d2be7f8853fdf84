//! Shared test fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use voara_rag::{EmbeddingIntent, EmbeddingProvider, RagError, Result};

/// Dimensionality of the mock embeddings: one slot per letter and digit.
pub const MOCK_DIMENSIONS: usize = 36;

/// A deterministic embedding provider for tests and keyless demos.
///
/// Embeds text as an L2-normalized character-frequency histogram, so
/// texts sharing vocabulary score high cosine similarity and all scores
/// are non-negative. Supports injected failures (any text containing the
/// marker fails) and a configurable batch cap for sub-batching tests.
pub struct MockEmbeddingProvider {
    dimensions: usize,
    declared_dimensions: Option<usize>,
    batch_cap: Option<usize>,
    fail_on: Option<String>,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self {
            dimensions: MOCK_DIMENSIONS,
            declared_dimensions: None,
            batch_cap: None,
            fail_on: None,
        }
    }

    /// Report a different dimensionality than the vectors produced, to
    /// exercise defensive dimension checks.
    pub fn declaring_dimensions(mut self, dimensions: usize) -> Self {
        self.declared_dimensions = Some(dimensions);
        self
    }

    /// Cap the batch size the provider claims to support.
    pub fn with_batch_cap(mut self, cap: usize) -> Self {
        self.batch_cap = Some(cap);
        self
    }

    /// Fail any embedding whose text contains the marker.
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_on = Some(marker.into());
        self
    }

    /// The embedding this provider produces for the given text.
    pub fn embedding_for(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        for c in text.chars().flat_map(char::to_lowercase) {
            let slot = if c.is_ascii_lowercase() {
                Some((c as usize) - ('a' as usize))
            } else if c.is_ascii_digit() {
                Some(26 + (c as usize) - ('0' as usize))
            } else {
                None
            };
            if let Some(slot) = slot {
                embedding[slot % self.dimensions] += 1.0;
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str, _intent: EmbeddingIntent) -> Result<Vec<f32>> {
        if let Some(marker) = &self.fail_on {
            if text.contains(marker.as_str()) {
                return Err(RagError::Embedding {
                    provider: "Mock".to_string(),
                    message: format!("injected failure on '{marker}'"),
                });
            }
        }
        Ok(self.embedding_for(text))
    }

    fn dimensions(&self) -> usize {
        self.declared_dimensions.unwrap_or(self.dimensions)
    }

    fn max_batch_size(&self) -> Option<usize> {
        self.batch_cap
    }
}
