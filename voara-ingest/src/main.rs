//! # Knowledge-base ingestion
//!
//! Reads `.md` and `.txt` files from a directory and indexes them into the
//! Voara knowledge base: chunk → embed (Gemini) → upsert (Qdrant).
//!
//! Usage: `voara-ingest [documents-dir]` (defaults to `knowledge_base/`).
//!
//! Requires `GOOGLE_API_KEY`, and `QDRANT_URL` / `QDRANT_API_KEY` when the
//! store is not local. Documents that fail are listed in the report; re-run
//! after fixing the cause — re-ingestion replaces, never duplicates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use voara_rag::{
    Document, GeminiEmbeddingProvider, IngestionPipeline, MarkdownChunker, QdrantVectorStore,
    RagConfig, VectorStore,
};

/// Load every `.md` / `.txt` file in the directory as a document, sorted
/// by file name so runs are deterministic.
fn load_documents(dir: &Path) -> anyhow::Result<Vec<Document>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("md") | Some("txt")
            )
        })
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let source = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown")
            .to_string();
        documents.push(Document::new(source, text));
    }
    Ok(documents)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // -- 1. Resolve inputs -------------------------------------------------
    let dir = std::env::args().nth(1).unwrap_or_else(|| "knowledge_base".to_string());
    let documents = load_documents(Path::new(&dir))?;
    if documents.is_empty() {
        bail!("no .md or .txt documents found in {dir}");
    }
    info!(count = documents.len(), dir, "loaded documents");

    // -- 2. Wire the pipeline from the environment -------------------------
    let config = RagConfig::from_env()?;
    let embedder = Arc::new(GeminiEmbeddingProvider::from_env()?);
    let store = Arc::new(QdrantVectorStore::from_config(&config)?);
    let chunker = Arc::new(MarkdownChunker::new(config.chunk_size, config.chunk_overlap)?);
    let pipeline =
        IngestionPipeline::new(config.clone(), embedder, store.clone(), chunker);

    // -- 3. Ingest and report ----------------------------------------------
    let report = pipeline.ingest(&documents).await?;

    println!(
        "Ingested {} chunk(s), wrote {} vector(s) to '{}'",
        report.chunks_created, report.vectors_written, config.collection_name
    );
    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!("  ok   {} ({} chunks)", outcome.source, outcome.chunks_created),
            Some(error) => println!("  FAIL {}: {error}", outcome.source),
        }
    }

    if let Some(info) = store.collection_info(&config.collection_name).await? {
        println!("Collection '{}': {} point(s), status {}", config.collection_name, info.points_count, info.status);
    }
    store.close().await?;

    let failed = report.failures().count();
    if failed > 0 {
        bail!("{failed} document(s) failed to ingest; re-run after fixing the cause");
    }
    Ok(())
}
