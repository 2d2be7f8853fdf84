//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! This module is only available when the `qdrant` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use voara_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334")?;
//! store.ensure_collection("voara_kb", 768).await?;
//! store.upsert("voara_kb", &points).await?;
//! let results = store.search("voara_kb", &query_vector, 3, Some(0.3)).await?;
//! store.close().await?;
//! ```

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CollectionInfo as QdrantCollectionInfo, CollectionStatus, Condition, CreateCollectionBuilder,
    DeletePointsBuilder, Distance, Filter, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder, vectors_config,
};
use qdrant_client::{Payload, Qdrant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::RagConfig;
use crate::document::{CollectionInfo, IndexedPoint, RetrievalResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Holds one long-lived [`qdrant_client::Qdrant`] client shared by every
/// caller in the process; the client supports concurrent requests, so no
/// additional locking is applied on the request path. [`close`] takes the
/// client out and drops it — afterwards every operation fails with a
/// store error and further closes are no-ops.
///
/// Collections are created with cosine distance. Chunk metadata is stored
/// as Qdrant payload.
///
/// [`close`]: VectorStore::close
pub struct QdrantVectorStore {
    client: RwLock<Option<Qdrant>>,
}

impl QdrantVectorStore {
    /// Create a new Qdrant vector store connecting to the given URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self::from_client(client))
    }

    /// Create a new Qdrant vector store from the configured endpoint and
    /// optional API key.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.qdrant_url);
        if let Some(api_key) = &config.qdrant_api_key {
            builder = builder.api_key(api_key.clone());
        }
        let client = builder.build().map_err(Self::map_err)?;
        Ok(Self::from_client(client))
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client: RwLock::new(Some(client)) }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStore { backend: "qdrant".to_string(), message: e.to_string() }
    }

    fn closed() -> RagError {
        RagError::VectorStore {
            backend: "qdrant".to_string(),
            message: "store has been closed".to_string(),
        }
    }

    /// Extract a string from a Qdrant payload value.
    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// The vector size the collection was created with, when it has a
    /// single unnamed vector config.
    fn vector_size(info: &QdrantCollectionInfo) -> Option<u64> {
        match info.config.as_ref()?.params.as_ref()?.vectors_config.as_ref()?.config.as_ref()? {
            vectors_config::Config::Params(params) => Some(params.size),
            vectors_config::Config::ParamsMap(_) => None,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<bool> {
        let guard = self.client.read().await;
        let client = guard.as_ref().ok_or_else(Self::closed)?;

        if client.collection_exists(name).await.map_err(Self::map_err)? {
            let info = client.collection_info(name).await.map_err(Self::map_err)?;
            if let Some(size) = info.result.as_ref().and_then(Self::vector_size) {
                if size as usize != dimensions {
                    return Err(RagError::DimensionMismatch {
                        expected: size as usize,
                        actual: dimensions,
                    });
                }
            }
            debug!(collection = name, "qdrant collection already exists, skipping creation");
            return Ok(true);
        }

        client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(false)
    }

    async fn upsert(&self, collection: &str, points: &[IndexedPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let guard = self.client.read().await;
        let client = guard.as_ref().ok_or_else(Self::closed)?;

        let qdrant_points: Vec<PointStruct> = points
            .iter()
            .map(|point| {
                let payload = serde_json::to_value(&point.payload)
                    .ok()
                    .and_then(|v| Payload::try_from(v).ok())
                    .unwrap_or_default();
                PointStruct::new(point.id.clone(), point.vector.clone(), payload)
            })
            .collect();

        client
            .upsert_points(UpsertPointsBuilder::new(collection, qdrant_points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = points.len(), "upserted points to qdrant");
        Ok(())
    }

    async fn delete_by_source(&self, collection: &str, source: &str) -> Result<()> {
        let guard = self.client.read().await;
        let client = guard.as_ref().ok_or_else(Self::closed)?;

        client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(Filter::must([Condition::matches("source", source.to_string())]))
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection, source, "deleted superseded points from qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<RetrievalResult>> {
        let guard = self.client.read().await;
        let client = guard.as_ref().ok_or_else(Self::closed)?;

        let mut request =
            SearchPointsBuilder::new(collection, vector.to_vec(), top_k as u64).with_payload(true);
        if let Some(threshold) = score_threshold {
            request = request.score_threshold(threshold);
        }

        let response = client.search_points(request).await.map_err(Self::map_err)?;

        let results = response
            .result
            .into_iter()
            .map(|scored| {
                let field = |name: &str| {
                    scored.payload.get(name).and_then(Self::extract_string).unwrap_or_default()
                };
                RetrievalResult {
                    text: field("text"),
                    score: scored.score,
                    header: field("header"),
                    source: field("source"),
                }
            })
            .collect();

        Ok(results)
    }

    async fn collection_info(&self, collection: &str) -> Result<Option<CollectionInfo>> {
        let guard = self.client.read().await;
        let client = guard.as_ref().ok_or_else(Self::closed)?;

        if !client.collection_exists(collection).await.map_err(Self::map_err)? {
            return Ok(None);
        }

        let info = client.collection_info(collection).await.map_err(Self::map_err)?;
        Ok(info.result.map(|info| CollectionInfo {
            points_count: info.points_count.unwrap_or(0),
            status: CollectionStatus::try_from(info.status)
                .map(|s| format!("{s:?}").to_lowercase())
                .unwrap_or_else(|_| "unknown".to_string()),
        }))
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.client.write().await;
        if guard.take().is_some() {
            debug!("closed qdrant connection");
        }
        Ok(())
    }
}
