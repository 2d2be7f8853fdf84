//! Data types for documents, chunks, indexed points, and retrieval results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A source document to be ingested into the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Origin identifier, e.g. the knowledge-base file name.
    pub source: String,
    /// The full text content of the document.
    pub text: String,
}

impl Document {
    /// Create a document from a source identifier and its text.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source: source.into(), text: text.into() }
    }
}

/// A bounded span of source text, the unit of embedding and retrieval.
///
/// Chunks are immutable once embedded. Re-ingesting the same source
/// supersedes its chunks in the store rather than mutating them: ids are
/// derived deterministically from `source` and `position`, so the same
/// span always maps to the same point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Stable identifier derived from `source` and `position`.
    pub id: String,
    /// The chunk text, a verbatim slice of the source document.
    pub text: String,
    /// Origin document identifier.
    pub source: String,
    /// Nearest enclosing markdown heading, empty if none.
    pub header: String,
    /// Ordinal index of this chunk within its source document.
    pub position: usize,
}

/// Derive the stable chunk id for a source/position pair.
///
/// Qdrant accepts only UUIDs or unsigned integers as point ids, so the
/// `source + position` derivation goes through a namespaced UUIDv5.
pub fn chunk_id(source: &str, position: usize) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{source}:{position}").as_bytes()).to_string()
}

/// The payload stored alongside a vector in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointPayload {
    /// The chunk text.
    pub text: String,
    /// Origin document identifier.
    pub source: String,
    /// Nearest enclosing markdown heading, empty if none.
    pub header: String,
    /// Ordinal index of the chunk within its source document.
    pub position: usize,
}

impl From<&Chunk> for PointPayload {
    fn from(chunk: &Chunk) -> Self {
        Self {
            text: chunk.text.clone(),
            source: chunk.source.clone(),
            header: chunk.header.clone(),
            position: chunk.position,
        }
    }
}

/// The unit stored in the vector database: id, vector, and payload.
///
/// Upserting a point whose id already exists replaces the prior vector
/// and payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedPoint {
    /// Unique point id; one id identifies one [`Chunk`].
    pub id: String,
    /// The embedding vector for the chunk text.
    pub vector: Vec<f32>,
    /// Chunk text and metadata.
    pub payload: PointPayload,
}

/// One scored match from a similarity search.
///
/// Sequences of results are always ordered by descending score. The score
/// is cosine similarity; higher is more relevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The retrieved chunk text.
    pub text: String,
    /// Similarity score.
    pub score: f32,
    /// Section header of the chunk, empty if none.
    #[serde(default)]
    pub header: String,
    /// Origin document identifier.
    #[serde(default)]
    pub source: String,
}

/// Point count and status of a vector store collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionInfo {
    /// Number of points currently stored.
    pub points_count: u64,
    /// Backend-reported collection status, e.g. `green`.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ids_are_stable_and_distinct() {
        assert_eq!(chunk_id("faq.md", 0), chunk_id("faq.md", 0));
        assert_ne!(chunk_id("faq.md", 0), chunk_id("faq.md", 1));
        assert_ne!(chunk_id("faq.md", 0), chunk_id("pricing.md", 0));
    }

    #[test]
    fn chunk_ids_are_valid_uuids() {
        let id = chunk_id("company.md", 3);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
