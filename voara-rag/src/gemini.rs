//! Gemini embedding provider using the Generative Language API.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::{EmbeddingIntent, EmbeddingProvider};
use crate::error::{RagError, Result};

/// The Generative Language API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
const DEFAULT_MODEL: &str = "text-embedding-004";

/// The fixed dimensionality of `text-embedding-004`.
const DEFAULT_DIMENSIONS: usize = 768;

/// Maximum number of requests the batch endpoint accepts per call.
const MAX_BATCH_SIZE: usize = 100;

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
///
/// Uses `reqwest` to call the `:embedContent` and `:batchEmbedContents`
/// endpoints directly. The [`EmbeddingIntent`] of each request maps to the
/// API's `RETRIEVAL_DOCUMENT` / `RETRIEVAL_QUERY` task types.
///
/// # Configuration
///
/// - `model` – defaults to `text-embedding-004` (768 dimensions).
/// - `dimensions` – optional `outputDimensionality` truncation.
/// - `api_key` – from the constructor or the `GOOGLE_API_KEY` environment
///   variable.
///
/// # Example
///
/// ```rust,ignore
/// use voara_rag::gemini::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::from_env()?;
/// let embedding = provider.embed("hello world", EmbeddingIntent::Query).await?;
/// ```
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
    /// If set, passed to the API to truncate the output vector.
    request_dimensionality: Option<usize>,
}

impl GeminiEmbeddingProvider {
    /// Create a new provider with the given API key.
    ///
    /// Uses the default model (`text-embedding-004`) and dimensions (768).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Embedding {
                provider: "Gemini".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensionality: None,
        })
    }

    /// Create a new provider using the `GOOGLE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| RagError::Embedding {
            provider: "Gemini".into(),
            message: "GOOGLE_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Set the model name (e.g. `gemini-embedding-001`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensionality (truncates the embedding vector).
    ///
    /// This also updates the value returned by
    /// [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensionality = Some(dims);
        self
    }

    fn qualified_model(&self) -> String {
        format!("models/{}", self.model)
    }

    fn embed_request<'a>(&'a self, text: &'a str, intent: EmbeddingIntent) -> EmbedRequest<'a> {
        EmbedRequest {
            model: self.qualified_model(),
            content: Content { parts: vec![Part { text }] },
            task_type: task_type(intent),
            output_dimensionality: self.request_dimensionality,
        }
    }

    async fn post<Req: Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> Result<Resp> {
        let url = format!("{GEMINI_API_BASE}/models/{}:{endpoint}", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Gemini", error = %e, "request failed");
                RagError::Embedding {
                    provider: "Gemini".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = "Gemini", %status, "API error");
            return Err(RagError::Embedding {
                provider: "Gemini".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        response.json().await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "failed to parse response");
            RagError::Embedding {
                provider: "Gemini".into(),
                message: format!("failed to parse response: {e}"),
            }
        })
    }
}

/// Map an [`EmbeddingIntent`] to the API's task type string.
fn task_type(intent: EmbeddingIntent) -> &'static str {
    match intent {
        EmbeddingIntent::Document => "RETRIEVAL_DOCUMENT",
        EmbeddingIntent::Query => "RETRIEVAL_QUERY",
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str, intent: EmbeddingIntent) -> Result<Vec<f32>> {
        debug!(provider = "Gemini", text_len = text.len(), ?intent, "embedding single text");

        let response: EmbedResponse =
            self.post("embedContent", &self.embed_request(text, intent)).await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str], intent: EmbeddingIntent) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "Gemini",
            batch_size = texts.len(),
            model = %self.model,
            ?intent,
            "embedding batch"
        );

        // The pipeline normally respects `max_batch_size`, but direct
        // callers may not; oversized inputs are split here too, in order.
        let mut results = Vec::with_capacity(texts.len());
        for sub_batch in texts.chunks(MAX_BATCH_SIZE) {
            let request = BatchEmbedRequest {
                requests: sub_batch.iter().map(|t| self.embed_request(t, intent)).collect(),
            };
            let response: BatchEmbedResponse =
                self.post("batchEmbedContents", &request).await?;

            if response.embeddings.len() != sub_batch.len() {
                return Err(RagError::Embedding {
                    provider: "Gemini".into(),
                    message: format!(
                        "API returned {} embeddings for {} inputs",
                        response.embeddings.len(),
                        sub_batch.len()
                    ),
                });
            }
            results.extend(response.embeddings.into_iter().map(|e| e.values));
        }

        Ok(results)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn max_batch_size(&self) -> Option<usize> {
        Some(MAX_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_request_serializes_task_type_and_model() {
        let provider = GeminiEmbeddingProvider::new("test-key").unwrap();
        let request = provider.embed_request("What is the pricing?", EmbeddingIntent::Query);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "models/text-embedding-004");
        assert_eq!(json["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(json["content"]["parts"][0]["text"], "What is the pricing?");
        assert!(json.get("outputDimensionality").is_none());
    }

    #[test]
    fn embed_request_includes_output_dimensionality_when_set() {
        let provider = GeminiEmbeddingProvider::new("test-key").unwrap().with_dimensions(256);
        assert_eq!(provider.dimensions(), 256);

        let request = provider.embed_request("chunk text", EmbeddingIntent::Document);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["taskType"], "RETRIEVAL_DOCUMENT");
        assert_eq!(json["outputDimensionality"], 256);
    }

    #[test]
    fn batch_response_parses_embeddings_in_order() {
        let body = r#"{"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]}"#;
        let parsed: BatchEmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[0].values, vec![0.1, 0.2]);
        assert_eq!(parsed.embeddings[1].values, vec![0.3, 0.4]);
    }

    #[test]
    fn error_response_parses_message() {
        let body = r#"{"error": {"code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Resource exhausted");
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(GeminiEmbeddingProvider::new("").is_err());
    }
}
