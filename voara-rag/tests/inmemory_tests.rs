//! Property and contract tests for the in-memory vector store.

use proptest::prelude::*;
use voara_rag::{
    IndexedPoint, InMemoryVectorStore, PointPayload, RagError, VectorStore, chunk_id,
};

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a point with a normalized embedding.
fn arb_point(dim: usize) -> impl Strategy<Value = IndexedPoint> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, vector)| IndexedPoint {
            id,
            vector,
            payload: PointPayload {
                text,
                source: "doc.md".to_string(),
                header: String::new(),
                position: 0,
            },
        },
    )
}

fn point(id: &str, vector: Vec<f32>, source: &str, text: &str) -> IndexedPoint {
    IndexedPoint {
        id: id.to_string(),
        vector,
        payload: PointPayload {
            text: text.to_string(),
            source: source.to_string(),
            header: String::new(),
            position: 0,
        },
    }
}

/// **Search ordering property**: for any set of stored points, search
/// returns at most `top_k` results ordered by descending cosine
/// similarity, and every score meets the threshold when one is given.
mod prop_search_ordering {
    use super::*;
    use std::collections::HashMap;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_bounded_and_thresholded(
            points in proptest::collection::vec(arb_point(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
            threshold in -1.0f32..1.0f32,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, unique_count) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.ensure_collection("test", DIM).await.unwrap();

                // Deduplicate points by id to avoid upsert overwriting
                let mut deduped: HashMap<String, IndexedPoint> = HashMap::new();
                for point in &points {
                    deduped.entry(point.id.clone()).or_insert_with(|| point.clone());
                }
                let unique: Vec<IndexedPoint> = deduped.into_values().collect();
                let count = unique.len();

                store.upsert("test", &unique).await.unwrap();
                let results =
                    store.search("test", &query, top_k, Some(threshold)).await.unwrap();
                (results, count)
            });

            // Result count is at most top_k and at most the number of stored points
            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= unique_count);

            // Every score meets the threshold
            for result in &results {
                prop_assert!(result.score >= threshold);
            }

            // Results are ordered by descending score
            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}

#[tokio::test]
async fn upsert_is_idempotent_per_id() {
    let store = InMemoryVectorStore::new();
    store.ensure_collection("kb", 4).await.unwrap();

    let points = vec![
        point(&chunk_id("a.md", 0), vec![1.0, 0.0, 0.0, 0.0], "a.md", "alpha"),
        point(&chunk_id("a.md", 1), vec![0.0, 1.0, 0.0, 0.0], "a.md", "beta"),
    ];

    store.upsert("kb", &points).await.unwrap();
    let first = store.collection_info("kb").await.unwrap().unwrap();

    store.upsert("kb", &points).await.unwrap();
    let second = store.collection_info("kb").await.unwrap().unwrap();

    assert_eq!(first.points_count, 2);
    assert_eq!(second.points_count, 2);
}

#[tokio::test]
async fn ensure_collection_reports_existence_and_guards_dimension() {
    let store = InMemoryVectorStore::new();

    assert!(!store.ensure_collection("kb", 8).await.unwrap());
    assert!(store.ensure_collection("kb", 8).await.unwrap());

    let err = store.ensure_collection("kb", 16).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 8, actual: 16 }));
}

#[tokio::test]
async fn upsert_and_search_reject_mismatched_dimensions() {
    let store = InMemoryVectorStore::new();
    store.ensure_collection("kb", 4).await.unwrap();

    let bad = vec![point("p1", vec![1.0, 0.0], "a.md", "short vector")];
    assert!(matches!(
        store.upsert("kb", &bad).await.unwrap_err(),
        RagError::DimensionMismatch { expected: 4, actual: 2 }
    ));

    assert!(matches!(
        store.search("kb", &[1.0, 0.0], 3, None).await.unwrap_err(),
        RagError::DimensionMismatch { expected: 4, actual: 2 }
    ));
}

#[tokio::test]
async fn absent_collection_is_none_for_info_and_error_for_operations() {
    let store = InMemoryVectorStore::new();

    assert!(store.collection_info("missing").await.unwrap().is_none());
    assert!(matches!(
        store.search("missing", &[1.0], 3, None).await.unwrap_err(),
        RagError::VectorStore { .. }
    ));
    assert!(matches!(
        store.upsert("missing", &[]).await.unwrap_err(),
        RagError::VectorStore { .. }
    ));
}

#[tokio::test]
async fn equal_scores_break_ties_by_insertion_recency() {
    let store = InMemoryVectorStore::new();
    store.ensure_collection("kb", 4).await.unwrap();

    let vector = vec![0.5, 0.5, 0.5, 0.5];
    store.upsert("kb", &[point("older", vector.clone(), "a.md", "older text")]).await.unwrap();
    store.upsert("kb", &[point("newer", vector.clone(), "b.md", "newer text")]).await.unwrap();

    let results = store.search("kb", &vector, 2, None).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].score, results[1].score);
    assert_eq!(results[0].text, "newer text");
}

#[tokio::test]
async fn delete_by_source_removes_only_that_source() {
    let store = InMemoryVectorStore::new();
    store.ensure_collection("kb", 4).await.unwrap();

    store
        .upsert(
            "kb",
            &[
                point("a0", vec![1.0, 0.0, 0.0, 0.0], "a.md", "from a"),
                point("a1", vec![0.0, 1.0, 0.0, 0.0], "a.md", "also from a"),
                point("b0", vec![0.0, 0.0, 1.0, 0.0], "b.md", "from b"),
            ],
        )
        .await
        .unwrap();

    store.delete_by_source("kb", "a.md").await.unwrap();

    let info = store.collection_info("kb").await.unwrap().unwrap();
    assert_eq!(info.points_count, 1);

    let results = store.search("kb", &[0.0, 0.0, 1.0, 0.0], 3, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source, "b.md");
}

#[tokio::test]
async fn close_is_an_idempotent_no_op() {
    let store = InMemoryVectorStore::new();
    store.ensure_collection("kb", 4).await.unwrap();

    store.close().await.unwrap();
    store.close().await.unwrap();
}
