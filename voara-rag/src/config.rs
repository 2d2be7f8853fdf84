//! Configuration for the retrieval engine.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the retrieval engine.
///
/// Every recognized option with its default. Construct via
/// [`RagConfig::builder`] or [`RagConfig::from_env`]; both validate, and a
/// built config is passed by reference to the components that need it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Dimensionality of the embedding vectors.
    pub embedding_dimension: usize,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Default number of results to return from a search.
    pub top_k: usize,
    /// Minimum similarity score for a match to count as relevant.
    pub score_threshold: f32,
    /// Name of the vector store collection.
    pub collection_name: String,
    /// Qdrant endpoint URL.
    pub qdrant_url: String,
    /// Qdrant API key, if the endpoint requires one.
    pub qdrant_api_key: Option<String>,
    /// Maximum length in characters of a formatted retrieval context.
    pub max_context_length: usize,
    /// Bound on concurrent embedding/upsert work during ingestion.
    pub max_concurrency: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_model: "text-embedding-004".to_string(),
            embedding_dimension: 768,
            chunk_size: 512,
            chunk_overlap: 100,
            top_k: 3,
            score_threshold: 0.3,
            collection_name: "voara_kb".to_string(),
            qdrant_url: "http://localhost:6334".to_string(),
            qdrant_api_key: None,
            max_context_length: 4000,
            max_concurrency: 4,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Build a config from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `QDRANT_URL`, `QDRANT_API_KEY`,
    /// `QDRANT_COLLECTION_NAME`, `EMBEDDING_MODEL`, `EMBEDDING_DIMENSION`,
    /// `CHUNK_SIZE`, `CHUNK_OVERLAP`, `RAG_TOP_K`, `SCORE_THRESHOLD`,
    /// `MAX_CONTEXT_LENGTH`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a variable fails to parse or the
    /// resulting config is invalid.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.qdrant_url = url;
        }
        if let Ok(key) = std::env::var("QDRANT_API_KEY") {
            config.qdrant_api_key = Some(key);
        }
        if let Ok(name) = std::env::var("QDRANT_COLLECTION_NAME") {
            config.collection_name = name;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        config.embedding_dimension =
            parse_var("EMBEDDING_DIMENSION", config.embedding_dimension)?;
        config.chunk_size = parse_var("CHUNK_SIZE", config.chunk_size)?;
        config.chunk_overlap = parse_var("CHUNK_OVERLAP", config.chunk_overlap)?;
        config.top_k = parse_var("RAG_TOP_K", config.top_k)?;
        config.score_threshold = parse_var("SCORE_THRESHOLD", config.score_threshold)?;
        config.max_context_length = parse_var("MAX_CONTEXT_LENGTH", config.max_context_length)?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.embedding_dimension == 0 {
            return Err(RagError::Config(
                "embedding_dimension must be greater than zero".to_string(),
            ));
        }
        if !self.score_threshold.is_finite() {
            return Err(RagError::Config("score_threshold must be finite".to_string()));
        }
        if self.max_context_length == 0 {
            return Err(RagError::Config(
                "max_context_length must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(RagError::Config("max_concurrency must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Parse an environment variable, keeping the default when it is unset.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| RagError::Config(format!("invalid value for {name}: '{raw}'"))),
        Err(_) => Ok(default),
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the embedding model identifier.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the embedding vector dimensionality.
    pub fn embedding_dimension(mut self, dimension: usize) -> Self {
        self.config.embedding_dimension = dimension;
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the default number of results returned from a search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity score for relevant matches.
    pub fn score_threshold(mut self, threshold: f32) -> Self {
        self.config.score_threshold = threshold;
        self
    }

    /// Set the vector store collection name.
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    /// Set the Qdrant endpoint URL.
    pub fn qdrant_url(mut self, url: impl Into<String>) -> Self {
        self.config.qdrant_url = url.into();
        self
    }

    /// Set the Qdrant API key.
    pub fn qdrant_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.qdrant_api_key = Some(key.into());
        self
    }

    /// Set the maximum formatted context length in characters.
    pub fn max_context_length(mut self, length: usize) -> Self {
        self.config.max_context_length = length;
        self
    }

    /// Set the concurrency bound for ingestion work.
    pub fn max_concurrency(mut self, concurrency: usize) -> Self {
        self.config.max_concurrency = concurrency;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any parameter is out of range, e.g.
    /// `chunk_overlap >= chunk_size` or `top_k == 0`.
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RagConfig::default().validate().is_ok());
    }

    #[test]
    fn builder_rejects_overlap_not_less_than_chunk_size() {
        let result = RagConfig::builder().chunk_size(100).chunk_overlap(100).build();
        assert!(matches!(result, Err(RagError::Config(_))));
    }

    #[test]
    fn builder_rejects_zero_top_k() {
        let result = RagConfig::builder().top_k(0).build();
        assert!(matches!(result, Err(RagError::Config(_))));
    }

    #[test]
    fn builder_applies_custom_values() {
        let config = RagConfig::builder()
            .chunk_size(256)
            .chunk_overlap(50)
            .top_k(5)
            .score_threshold(0.5)
            .collection_name("test_kb")
            .build()
            .unwrap();

        assert_eq!(config.chunk_size, 256);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.top_k, 5);
        assert!((config.score_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.collection_name, "test_kb");
    }
}
