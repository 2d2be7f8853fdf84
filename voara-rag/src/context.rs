//! Cross-process "last retrieved context" record.
//!
//! The conversational agent and the query-serving API run as separate
//! processes; the UI asks the API what context the agent last retrieved.
//! That state is modeled as one small file-backed record with an explicit
//! owner (the tool boundary writes it) and an explicit reset point (the
//! session start clears it) rather than an in-process global.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RagError, Result};

/// The most recent retrieval made on behalf of the agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LastContext {
    /// The query the agent searched for.
    pub query: String,
    /// The formatted context that was retrieved.
    pub context: String,
    /// When the retrieval happened.
    pub timestamp: Option<DateTime<Utc>>,
    /// Whether any context was retrieved.
    pub has_context: bool,
}

/// File-backed store for the [`LastContext`] record.
///
/// Reads never fail on a missing or unreadable file — the record simply
/// resets to empty, which is also what [`clear`](LastContextStore::clear)
/// writes at the start of each conversation session.
pub struct LastContextStore {
    path: PathBuf,
}

impl LastContextStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Record a retrieval, stamping it with the current time.
    pub async fn record(&self, query: &str, context: &str) -> Result<()> {
        let record = LastContext {
            query: query.to_string(),
            context: context.to_string(),
            timestamp: Some(Utc::now()),
            has_context: !context.is_empty(),
        };
        self.write(&record).await
    }

    /// Load the last recorded context.
    ///
    /// A missing or corrupt file yields the empty record.
    pub async fn load(&self) -> LastContext {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => LastContext::default(),
        }
    }

    /// Reset the record to empty. Called at the start of each new
    /// conversation session.
    pub async fn clear(&self) -> Result<()> {
        self.write(&LastContext::default()).await
    }

    async fn write(&self, record: &LastContext) -> Result<()> {
        let json = serde_json::to_vec(record)
            .map_err(|e| RagError::ContextStore(format!("serialize failed: {e}")))?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            RagError::ContextStore(format!("write to {} failed: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), has_context = record.has_context, "last context saved");
        Ok(())
    }
}
