//! The `search_knowledge_base` boundary for the conversational agent.
//!
//! [`KnowledgeBaseTool`] wraps a [`Retriever`] as a function tool the
//! conversation layer can register with its model. The tool never raises:
//! failures and empty results are converted to human-readable fallback
//! sentences so the agent can keep speaking without knowledge-base
//! context.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::context::LastContextStore;
use crate::retriever::Retriever;

/// Returned when the query matched nothing in the knowledge base.
pub const NO_RESULTS_FALLBACK: &str =
    "No specific information found in the knowledge base for this query.";

/// Returned when retrieval failed; the agent answers from general
/// instructions instead.
pub const ERROR_FALLBACK: &str =
    "I encountered an issue searching the knowledge base. Let me try to help you with what I know.";

/// The result of a background knowledge-base search, delivered over a
/// channel to the conversation driver.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The query that was searched.
    pub query: String,
    /// Retrieved context, or a fallback sentence.
    pub response: String,
}

/// A retrieval tool for the voice agent.
///
/// The conversation layer registers the tool by
/// [`name`](KnowledgeBaseTool::name) /
/// [`parameters_schema`](KnowledgeBaseTool::parameters_schema) and calls
/// [`search`](KnowledgeBaseTool::search) per model tool-call. When a
/// [`LastContextStore`] is attached, every search updates the shared
/// last-context record for UI display.
pub struct KnowledgeBaseTool {
    retriever: Arc<Retriever>,
    last_context: Option<Arc<LastContextStore>>,
}

impl KnowledgeBaseTool {
    /// Create a new tool backed by the given retriever.
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self { retriever, last_context: None }
    }

    /// Attach a last-context store updated on every search.
    pub fn with_last_context(mut self, store: Arc<LastContextStore>) -> Self {
        self.last_context = Some(store);
        self
    }

    /// The tool name the model calls.
    pub fn name(&self) -> &'static str {
        "search_knowledge_base"
    }

    /// The tool description shown to the model.
    pub fn description(&self) -> &'static str {
        "Search the Voara AI company knowledge base to find accurate information. \
         ALWAYS use this tool when the customer asks about: \
         company information, services, or products; pricing, plans, or packages; \
         features or capabilities; FAQs or common questions; \
         contact information or support; or any factual question about Voara AI. \
         The tool returns relevant information from the company documentation."
    }

    /// JSON schema for the tool's parameters.
    pub fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find relevant information"
                }
            },
            "required": ["query"]
        })
    }

    /// Search the knowledge base, returning retrieved context as plain
    /// text.
    ///
    /// Never fails: an empty result yields [`NO_RESULTS_FALLBACK`] and a
    /// retrieval error yields [`ERROR_FALLBACK`], so the conversational
    /// layer can always keep speaking.
    pub async fn search(&self, query: &str) -> String {
        info!(query, "searching knowledge base");

        match self.retriever.retrieve_context(query, false).await {
            Ok(context) if !context.is_empty() => {
                info!(context_len = context.len(), "knowledge base context retrieved");
                self.record(query, &context).await;
                context
            }
            Ok(_) => {
                info!(query, "no relevant knowledge found");
                self.record(query, "").await;
                NO_RESULTS_FALLBACK.to_string()
            }
            Err(e) => {
                error!(error = %e, "knowledge base search failed");
                ERROR_FALLBACK.to_string()
            }
        }
    }

    /// Spawn a search as a cancellable background task.
    ///
    /// One task is spawned per final transcript so retrieval never blocks
    /// the audio pipeline; the outcome is delivered over `tx`. Aborting
    /// the returned handle cancels the in-flight retrieval.
    pub fn spawn_search(
        self: &Arc<Self>,
        query: String,
        tx: mpsc::Sender<SearchOutcome>,
    ) -> JoinHandle<()> {
        let tool = Arc::clone(self);
        tokio::spawn(async move {
            let response = tool.search(&query).await;
            if tx.send(SearchOutcome { query, response }).await.is_err() {
                debug!("search outcome receiver dropped");
            }
        })
    }

    /// Update the shared last-context record; failures are logged, never
    /// surfaced.
    async fn record(&self, query: &str, context: &str) {
        if let Some(store) = &self.last_context {
            if let Err(e) = store.record(query, context).await {
                warn!(error = %e, "failed to save last context");
            }
        }
    }
}
