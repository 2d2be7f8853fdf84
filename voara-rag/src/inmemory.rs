//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector
//! store backed by `HashMap`s protected by a `tokio::sync::RwLock`. It is
//! suitable for tests, demos, and small keyless deployments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{CollectionInfo, IndexedPoint, RetrievalResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A point plus the insertion sequence number used for tie-breaking.
#[derive(Debug, Clone)]
struct StoredPoint {
    point: IndexedPoint,
    seq: u64,
}

#[derive(Debug, Default)]
struct Collection {
    dimensions: usize,
    points: HashMap<String, StoredPoint>,
}

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as nested `HashMap`s: collection name → point id
/// → point. All operations are async-safe via `tokio::sync::RwLock`.
/// Equal-score search ties are broken by insertion recency: the most
/// recently upserted point sorts first.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
    seq: AtomicU64,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(collection: &str) -> RagError {
        RagError::VectorStore {
            backend: "InMemory".to_string(),
            message: format!("collection '{collection}' does not exist"),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<bool> {
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(name) {
            if existing.dimensions != dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: existing.dimensions,
                    actual: dimensions,
                });
            }
            return Ok(true);
        }
        collections.insert(name.to_string(), Collection { dimensions, points: HashMap::new() });
        Ok(false)
    }

    async fn upsert(&self, collection: &str, points: &[IndexedPoint]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;

        // Validate the whole batch before touching the map so a failed
        // batch leaves no partial state.
        for point in points {
            if point.vector.len() != store.dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: store.dimensions,
                    actual: point.vector.len(),
                });
            }
        }

        for point in points {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed);
            store.points.insert(point.id.clone(), StoredPoint { point: point.clone(), seq });
        }
        Ok(())
    }

    async fn delete_by_source(&self, collection: &str, source: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;
        store.points.retain(|_, stored| stored.point.payload.source != source);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<RetrievalResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| Self::missing(collection))?;

        if vector.len() != store.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: store.dimensions,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(f32, u64, &StoredPoint)> = store
            .points
            .values()
            .map(|stored| (cosine_similarity(&stored.point.vector, vector), stored.seq, stored))
            .filter(|(score, _, _)| score_threshold.is_none_or(|t| *score >= t))
            .collect();

        // Descending score; newest insertion wins on equal scores.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then(b.1.cmp(&a.1))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, _, stored)| RetrievalResult {
                text: stored.point.payload.text.clone(),
                score,
                header: stored.point.payload.header.clone(),
                source: stored.point.payload.source.clone(),
            })
            .collect())
    }

    async fn collection_info(&self, collection: &str) -> Result<Option<CollectionInfo>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map(|store| CollectionInfo {
            points_count: store.points.len() as u64,
            status: "green".to_string(),
        }))
    }

    async fn close(&self) -> Result<()> {
        // Nothing to release; the store lives and dies with the process.
        Ok(())
    }
}
