//! Hybrid search over the corpus fixture, with failing and slow collaborators

use async_trait::async_trait;
use hybridrag::config::RetrievalConfig;
use hybridrag::lexicon::Lexicon;
use hybridrag::retrieval::{HybridSearchEngine, RetrievalMethod, SearchRequest};
use hybridrag::store::{Corpus, Filters, GraphStore, RelatedEntity, StoreError};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn corpus() -> Corpus {
    Corpus::from_file(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/corpus.json"))
        .expect("Failed to load corpus fixture")
}

fn engine_with_graph(graph: Arc<dyn GraphStore>) -> HybridSearchEngine {
    HybridSearchEngine::new(
        Arc::new(corpus().vector_store()),
        graph,
        Arc::new(Lexicon::builtin().unwrap()),
        &RetrievalConfig::default(),
    )
    .unwrap()
}

fn engine() -> HybridSearchEngine {
    engine_with_graph(Arc::new(corpus().graph_store().unwrap()))
}

struct FailingGraphStore;

#[async_trait]
impl GraphStore for FailingGraphStore {
    async fn find_related_entities(
        &self,
        _entity_name: &str,
        _max_hops: usize,
    ) -> Result<Vec<RelatedEntity>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

struct SlowGraphStore;

#[async_trait]
impl GraphStore for SlowGraphStore {
    async fn find_related_entities(
        &self,
        _entity_name: &str,
        _max_hops: usize,
    ) -> Result<Vec<RelatedEntity>, StoreError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(vec![RelatedEntity::new("Late", "Technology")])
    }
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[tokio::test]
async fn test_fused_ranking() {
    let result = engine()
        .search(&SearchRequest::new("Qdrant database", 5))
        .await;

    assert_eq!(result.vector_results, 2);
    assert_eq!(result.graph_results, 2);
    assert_eq!(result.keyword_results, 2);
    assert_eq!(result.total_results, 4);
    assert!(result.failures.is_empty());

    let contents: Vec<&str> = result.results.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(
        contents,
        vec![
            "Qdrant is an open source vector database written in Rust.",
            "Neo4j is a graph database that stores entities and relationships.",
            "Entity: Rust (Type: Language)",
            "Entity: Mozilla (Type: Organization)",
        ]
    );

    // vector 1.0 * 0.5 + keyword 2/2 * 0.2
    assert!(approx(result.results[0].score, 0.7));
    // vector 0.5 * 0.5 + keyword 1/2 * 0.2
    assert!(approx(result.results[1].score, 0.35));
    // confidence 0.95 * 0.3
    assert!(approx(result.results[2].score, 0.285));
    // default confidence 0.7 * 0.3
    assert!(approx(result.results[3].score, 0.21));

    assert_eq!(result.results[0].retrieval_method, RetrievalMethod::Vector);
    assert_eq!(result.results[0].source, "databases.md");
    assert_eq!(result.results[2].source, "languages.md");
    assert_eq!(result.results[3].source, "unknown");
}

#[tokio::test]
async fn test_top_k_bounds_fused_results() {
    let result = engine()
        .search(&SearchRequest::new("Qdrant database", 2))
        .await;

    assert_eq!(result.results.len(), 2);
    assert!(result
        .results
        .windows(2)
        .all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_filters_apply_to_vector_and_keyword() {
    let filters = Filters::from([("section".to_string(), json!("graph"))]);
    let request = SearchRequest::new("database", 5).with_filters(filters);

    let result = engine().search(&request).await;
    assert_eq!(result.results.len(), 1);
    assert_eq!(
        result.results[0].content,
        "Neo4j is a graph database that stores entities and relationships."
    );
    assert!(approx(result.results[0].score, 0.7));
}

#[tokio::test]
async fn test_graph_failure_is_isolated() {
    let engine = engine_with_graph(Arc::new(FailingGraphStore));
    let result = engine.search(&SearchRequest::new("Qdrant database", 5)).await;

    assert_eq!(result.graph_results, 0);
    assert_eq!(result.vector_results, 2);
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].method, RetrievalMethod::Graph);
    assert!(result.failures[0].reason.contains("connection refused"));
}

#[tokio::test]
async fn test_disabled_method_is_never_called() {
    let engine = engine_with_graph(Arc::new(FailingGraphStore));
    let request = SearchRequest::new("Qdrant database", 5).with_graph(false);

    let result = engine.search(&request).await;
    assert!(result.failures.is_empty());
    assert_eq!(result.graph_results, 0);
}

#[tokio::test]
async fn test_deadline_keeps_finished_methods() {
    let engine = engine_with_graph(Arc::new(SlowGraphStore));
    let started = Instant::now();
    let deadline = tokio::time::Instant::now() + Duration::from_millis(100);

    let result = engine
        .search_with_deadline(&SearchRequest::new("Qdrant database", 5), deadline)
        .await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(result.graph_results, 0);
    assert_eq!(result.vector_results, 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].method, RetrievalMethod::Graph);
    assert!(result.failures[0].reason.contains("deadline"));
}

#[tokio::test]
async fn test_configured_timeout() {
    let config = RetrievalConfig {
        timeout_ms: 100,
        ..RetrievalConfig::default()
    };
    let engine = HybridSearchEngine::new(
        Arc::new(corpus().vector_store()),
        Arc::new(SlowGraphStore),
        Arc::new(Lexicon::builtin().unwrap()),
        &config,
    )
    .unwrap();

    let result = engine.search(&SearchRequest::new("Qdrant", 5)).await;
    assert_eq!(result.failures.len(), 1);
    assert!(!result.is_empty());
}

#[tokio::test]
async fn test_invalid_weights_rejected() {
    let config = RetrievalConfig {
        vector_weight: 0.0,
        graph_weight: 0.0,
        keyword_weight: 0.0,
        ..RetrievalConfig::default()
    };
    let built = HybridSearchEngine::new(
        Arc::new(corpus().vector_store()),
        Arc::new(corpus().graph_store().unwrap()),
        Arc::new(Lexicon::builtin().unwrap()),
        &config,
    );
    assert!(built.is_err());
}

#[tokio::test]
async fn test_concurrent_searches_share_engine() {
    let engine = Arc::new(engine());

    let handles: Vec<_> = ["Qdrant database", "Rust Mozilla", "hybrid retrieval"]
        .into_iter()
        .map(|query| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.search(&SearchRequest::new(query, 3)).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(!result.is_empty());
        assert!(result.results.len() <= 3);
    }
}
