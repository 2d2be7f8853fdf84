//! Ingestion pipeline tests over the in-memory store.

mod common;

use std::sync::Arc;

use common::MockEmbeddingProvider;
use voara_rag::{
    Chunker, Document, EmbeddingIntent, EmbeddingProvider, InMemoryVectorStore, IngestionPipeline,
    MarkdownChunker, RagConfig, RagError, VectorStore,
};

fn test_config(chunk_size: usize, chunk_overlap: usize) -> RagConfig {
    RagConfig::builder()
        .chunk_size(chunk_size)
        .chunk_overlap(chunk_overlap)
        .score_threshold(0.0)
        .build()
        .unwrap()
}

fn pipeline_with(
    config: RagConfig,
    embedder: MockEmbeddingProvider,
    store: Arc<InMemoryVectorStore>,
) -> IngestionPipeline {
    let chunker = MarkdownChunker::new(config.chunk_size, config.chunk_overlap).unwrap();
    IngestionPipeline::new(config, Arc::new(embedder), store, Arc::new(chunker))
}

#[tokio::test]
async fn ingest_builds_the_index_and_reports_counts() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(test_config(512, 100), MockEmbeddingProvider::new(), store.clone());

    let documents = vec![
        Document::new("company.md", "Voara AI builds voice-based customer service agents."),
        Document::new("pricing.md", "Pricing starts at $29/month for the basic plan."),
    ];

    let report = pipeline.ingest(&documents).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.chunks_created, 2);
    assert_eq!(report.vectors_written, 2);

    let info = store.collection_info("voara_kb").await.unwrap().unwrap();
    assert_eq!(info.points_count, 2);
}

#[tokio::test]
async fn reingesting_an_identical_document_does_not_duplicate_points() {
    let store = Arc::new(InMemoryVectorStore::new());
    let config = test_config(60, 10);
    let documents =
        vec![Document::new("faq.md", "How do I get support? Email us any time.\n\nWe reply within one business day, always.")];

    let pipeline = pipeline_with(config, MockEmbeddingProvider::new(), store.clone());
    pipeline.ingest(&documents).await.unwrap();
    let first = store.collection_info("voara_kb").await.unwrap().unwrap();

    pipeline.ingest(&documents).await.unwrap();
    let second = store.collection_info("voara_kb").await.unwrap().unwrap();

    assert!(first.points_count > 0);
    assert_eq!(first.points_count, second.points_count);
}

#[tokio::test]
async fn reingesting_a_shorter_document_drops_stale_chunks() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(test_config(30, 5), MockEmbeddingProvider::new(), store.clone());

    let long = Document::new(
        "changelog.md",
        "first entry about releases\n\nsecond entry about fixes\n\nthird entry about docs\n\nfourth entry about tests",
    );
    let report = pipeline.ingest(std::slice::from_ref(&long)).await.unwrap();
    let before = store.collection_info("voara_kb").await.unwrap().unwrap();
    assert!(before.points_count > 1);
    assert_eq!(before.points_count, report.vectors_written as u64);

    let short = Document::new("changelog.md", "rewritten entry");
    pipeline.ingest(std::slice::from_ref(&short)).await.unwrap();
    let after = store.collection_info("voara_kb").await.unwrap().unwrap();

    assert_eq!(after.points_count, 1);
}

#[tokio::test]
async fn one_failing_document_does_not_abort_the_batch() {
    let store = Arc::new(InMemoryVectorStore::new());
    let embedder = MockEmbeddingProvider::new().failing_on("POISON");
    let pipeline = pipeline_with(test_config(512, 100), embedder, store.clone());

    let documents = vec![
        Document::new("good.md", "Voara AI supports English and Arabic conversations."),
        Document::new("bad.md", "POISON this document cannot be embedded"),
        Document::new("also-good.md", "Our agents answer around the clock."),
    ];

    let report = pipeline.ingest(&documents).await.unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.failures().count(), 1);

    let failed = report.failures().next().unwrap();
    assert_eq!(failed.source, "bad.md");
    assert_eq!(failed.vectors_written, 0);
    assert!(failed.error.as_deref().unwrap().contains("injected failure"));

    // Only the two good documents reached the store.
    let info = store.collection_info("voara_kb").await.unwrap().unwrap();
    assert_eq!(info.points_count, 2);
}

#[tokio::test]
async fn sub_batched_embeddings_stay_zipped_to_their_chunks() {
    let store = Arc::new(InMemoryVectorStore::new());
    let config = test_config(40, 0);
    let embedder = MockEmbeddingProvider::new().with_batch_cap(2);
    let reference = MockEmbeddingProvider::new();

    let text = "alpha alpha alpha alpha\n\nbravo bravo bravo bravo\n\ncharlie charlie charlie\n\n\
                delta delta delta delta\n\necho echo echo echo echo\n\nfoxtrot foxtrot foxtrot";
    let document = Document::new("phonetic.md", text);

    let chunker = MarkdownChunker::new(config.chunk_size, config.chunk_overlap).unwrap();
    let expected_chunks = chunker.chunk(&document).unwrap();
    assert!(expected_chunks.len() > 2, "document must span several sub-batches");

    let pipeline = pipeline_with(config, embedder, store.clone());
    let report = pipeline.ingest(std::slice::from_ref(&document)).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.vectors_written, expected_chunks.len());

    // Each chunk's stored vector must be the embedding of its own text:
    // searching with that embedding returns the chunk itself at score ~1.
    for chunk in &expected_chunks {
        let query = reference.embedding_for(&chunk.text);
        let results = store.search("voara_kb", &query, 1, None).await.unwrap();
        assert_eq!(results[0].text, chunk.text);
        assert!(results[0].score > 0.999);
    }
}

#[tokio::test]
async fn existing_collection_with_wrong_dimension_fails_the_whole_call() {
    let store = Arc::new(InMemoryVectorStore::new());
    store.ensure_collection("voara_kb", 8).await.unwrap();

    let pipeline = pipeline_with(test_config(512, 100), MockEmbeddingProvider::new(), store);
    let documents = vec![Document::new("doc.md", "some text")];

    let err = pipeline.ingest(&documents).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 8, .. }));
}

#[tokio::test]
async fn misreported_provider_dimension_fails_per_document_before_upsert() {
    let store = Arc::new(InMemoryVectorStore::new());
    let embedder = MockEmbeddingProvider::new().declaring_dimensions(40);
    let pipeline = pipeline_with(test_config(512, 100), embedder, store.clone());

    let report =
        pipeline.ingest(&[Document::new("doc.md", "some text")]).await.unwrap();

    assert_eq!(report.failures().count(), 1);
    let failed = report.failures().next().unwrap();
    assert!(failed.error.as_deref().unwrap().contains("Dimension mismatch"));

    // Nothing was written for the failed document.
    let info = store.collection_info("voara_kb").await.unwrap().unwrap();
    assert_eq!(info.points_count, 0);
}

#[tokio::test]
async fn empty_document_batch_yields_an_empty_report() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(test_config(512, 100), MockEmbeddingProvider::new(), store);

    let report = pipeline.ingest(&[]).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.chunks_created, 0);
    assert_eq!(report.vectors_written, 0);
    assert!(report.outcomes.is_empty());
}

#[tokio::test]
async fn embed_batch_preserves_length_and_order() {
    let embedder = MockEmbeddingProvider::new();

    let empty: Vec<Vec<f32>> =
        embedder.embed_batch(&[], EmbeddingIntent::Document).await.unwrap();
    assert!(empty.is_empty());

    let texts = ["alpha", "bravo", "charlie"];
    let batch = embedder.embed_batch(&texts, EmbeddingIntent::Document).await.unwrap();

    assert_eq!(batch.len(), texts.len());
    for (text, vector) in texts.iter().zip(&batch) {
        assert_eq!(vector, &embedder.embedding_for(text));
    }
}
