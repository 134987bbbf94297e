//! Hybrid search combining vector, graph, and keyword retrieval

use crate::config::RetrievalConfig;
use crate::lexicon::{Lexicon, StopWordSet};
use crate::retrieval::{
    keyword_match_ratio, merge_and_rerank, FusionConfig, HybridSearchResult, MethodFailure,
    RetrievalMethod, SearchRequest, SearchResult,
};
use crate::store::{GraphStore, StoreError, VectorStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

const UNKNOWN_SOURCE: &str = "unknown";

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Vector search failed: {0}")]
    VectorSearchError(StoreError),

    #[error("Graph search failed for entity '{entity}': {source}")]
    GraphSearchError { entity: String, source: StoreError },

    #[error("Keyword search failed: {0}")]
    KeywordSearchError(StoreError),

    #[error("{0} search exceeded its deadline")]
    DeadlineExceeded(RetrievalMethod),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Outcome of one guarded sub-search
struct MethodOutcome {
    results: Vec<SearchResult>,
    failure: Option<MethodFailure>,
}

/// Hybrid search engine fusing vector, graph and keyword sub-searches
///
/// Holds no per-request state, so one instance can serve concurrent searches.
pub struct HybridSearchEngine {
    vector_store: Arc<dyn VectorStore>,
    graph_store: Arc<dyn GraphStore>,
    lexicon: Arc<Lexicon>,
    fusion: FusionConfig,
    graph_max_hops: usize,
    graph_max_entities: usize,
    default_entity_confidence: f32,
    dedup_key_chars: usize,
    timeout: Option<Duration>,
}

impl HybridSearchEngine {
    /// Create a new hybrid search engine
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        graph_store: Arc<dyn GraphStore>,
        lexicon: Arc<Lexicon>,
        config: &RetrievalConfig,
    ) -> Result<Self, SearchError> {
        let fusion = FusionConfig::from_config(config)
            .map_err(|e| SearchError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            vector_store,
            graph_store,
            lexicon,
            fusion,
            graph_max_hops: config.graph_max_hops,
            graph_max_entities: config.graph_max_entities,
            default_entity_confidence: config.default_entity_confidence,
            dedup_key_chars: config.dedup_key_chars,
            timeout: (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms)),
        })
    }

    pub fn fusion(&self) -> &FusionConfig {
        &self.fusion
    }

    pub fn dedup_key_chars(&self) -> usize {
        self.dedup_key_chars
    }

    /// Perform hybrid search, bounded by the configured timeout if any
    pub async fn search(&self, request: &SearchRequest) -> HybridSearchResult {
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        self.run(request, deadline).await
    }

    /// Perform hybrid search, abandoning sub-searches still running at `deadline`
    ///
    /// Methods that finished in time still contribute to the merge.
    pub async fn search_with_deadline(
        &self,
        request: &SearchRequest,
        deadline: Instant,
    ) -> HybridSearchResult {
        self.run(request, Some(deadline)).await
    }

    async fn run(&self, request: &SearchRequest, deadline: Option<Instant>) -> HybridSearchResult {
        let start = std::time::Instant::now();

        // Step 1: Fan out the enabled sub-searches
        let (vector, graph, keyword) = tokio::join!(
            guarded(
                RetrievalMethod::Vector,
                request.use_vector,
                deadline,
                self.vector_search(request)
            ),
            guarded(
                RetrievalMethod::Graph,
                request.use_graph,
                deadline,
                self.graph_search(request)
            ),
            guarded(
                RetrievalMethod::Keyword,
                request.use_keyword,
                deadline,
                self.keyword_search(request)
            ),
        );

        let vector_results = vector.results.len();
        let graph_results = graph.results.len();
        let keyword_results = keyword.results.len();

        // Step 2: Collect failures and results in vector -> graph -> keyword order
        let mut failures = Vec::new();
        let mut all_results = Vec::with_capacity(vector_results + graph_results + keyword_results);
        for outcome in [vector, graph, keyword] {
            failures.extend(outcome.failure);
            all_results.extend(outcome.results);
        }

        // Step 3: Weighted fusion
        let results = merge_and_rerank(all_results, request.top_k, self.dedup_key_chars);
        let retrieval_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!(
            "Hybrid search: {} results (vector={}, graph={}, keyword={}, failures={}) in {:.1}ms",
            results.len(),
            vector_results,
            graph_results,
            keyword_results,
            failures.len(),
            retrieval_time_ms
        );

        HybridSearchResult {
            total_results: results.len(),
            results,
            vector_results,
            graph_results,
            keyword_results,
            retrieval_time_ms,
            failures,
        }
    }

    /// Semantic search against the vector store
    async fn vector_search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        let hits = self
            .vector_store
            .search(&request.query, request.top_k, request.filters.as_ref())
            .await
            .map_err(SearchError::VectorSearchError)?;

        Ok(hits
            .into_iter()
            .map(|hit| SearchResult {
                score: self.fusion.weighted(RetrievalMethod::Vector, hit.score),
                source: hit.source_file().unwrap_or(UNKNOWN_SOURCE).to_string(),
                content: hit.text,
                metadata: hit.metadata,
                retrieval_method: RetrievalMethod::Vector,
            })
            .collect())
    }

    /// Graph traversal from the entity candidates named in the query
    async fn graph_search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        let mut results = Vec::new();

        for entity_name in self
            .lexicon
            .entity_candidates(&request.query)
            .into_iter()
            .take(self.graph_max_entities)
        {
            let related = self
                .graph_store
                .find_related_entities(&entity_name, self.graph_max_hops)
                .await
                .map_err(|source| SearchError::GraphSearchError {
                    entity: entity_name.clone(),
                    source,
                })?;

            for entity in related.into_iter().take(request.top_k) {
                let confidence = entity.confidence.unwrap_or(self.default_entity_confidence);
                results.push(SearchResult {
                    content: entity.headline(),
                    score: self.fusion.weighted(RetrievalMethod::Graph, confidence),
                    source: entity
                        .source_file
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
                    metadata: entity.to_metadata(),
                    retrieval_method: RetrievalMethod::Graph,
                });
            }
        }

        Ok(results)
    }

    /// Keyword re-query scored by the fraction of keywords each hit contains
    ///
    /// Keywords keep their punctuation. The store is queried even when no
    /// keywords remain; its hits then score zero but still count.
    async fn keyword_search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        let keywords = self.lexicon.raw_keywords(&request.query, StopWordSet::Search);

        let hits = self
            .vector_store
            .search(&keywords.join(" "), request.top_k, request.filters.as_ref())
            .await
            .map_err(SearchError::KeywordSearchError)?;

        Ok(hits
            .into_iter()
            .map(|hit| {
                let match_score = keyword_match_ratio(&keywords, &hit.text);
                SearchResult {
                    score: self.fusion.weighted(RetrievalMethod::Keyword, match_score),
                    source: hit.source_file().unwrap_or(UNKNOWN_SOURCE).to_string(),
                    content: hit.text,
                    metadata: hit.metadata,
                    retrieval_method: RetrievalMethod::Keyword,
                }
            })
            .collect())
    }
}

/// Run one sub-search inside its own failure boundary
///
/// A disabled method is never polled. Errors and missed deadlines are logged and
/// become an empty contribution plus a recorded failure.
async fn guarded<F>(
    method: RetrievalMethod,
    enabled: bool,
    deadline: Option<Instant>,
    search: F,
) -> MethodOutcome
where
    F: Future<Output = Result<Vec<SearchResult>, SearchError>>,
{
    if !enabled {
        return MethodOutcome {
            results: Vec::new(),
            failure: None,
        };
    }

    let outcome = match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, search)
            .await
            .unwrap_or_else(|_| Err(SearchError::DeadlineExceeded(method))),
        None => search.await,
    };

    match outcome {
        Ok(results) => MethodOutcome {
            results,
            failure: None,
        },
        Err(e) => {
            tracing::warn!("{} search error: {}", method, e);
            MethodOutcome {
                results: Vec::new(),
                failure: Some(MethodFailure {
                    method,
                    reason: e.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Filters, RelatedEntity, VectorHit};
    use async_trait::async_trait;
    use serde_json::{json, Map};

    struct FixedVectorStore {
        hits: Vec<VectorHit>,
    }

    #[async_trait]
    impl VectorStore for FixedVectorStore {
        async fn search(
            &self,
            _query: &str,
            top_k: usize,
            _filters: Option<&Filters>,
        ) -> Result<Vec<VectorHit>, StoreError> {
            Ok(self.hits.iter().take(top_k).cloned().collect())
        }
    }

    struct FixedGraphStore {
        related: Vec<RelatedEntity>,
    }

    #[async_trait]
    impl GraphStore for FixedGraphStore {
        async fn find_related_entities(
            &self,
            _entity_name: &str,
            _max_hops: usize,
        ) -> Result<Vec<RelatedEntity>, StoreError> {
            Ok(self.related.clone())
        }
    }

    /// Records every query text it receives
    struct RecordingVectorStore {
        hits: Vec<VectorHit>,
        queries: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VectorStore for RecordingVectorStore {
        async fn search(
            &self,
            query: &str,
            top_k: usize,
            _filters: Option<&Filters>,
        ) -> Result<Vec<VectorHit>, StoreError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.hits.iter().take(top_k).cloned().collect())
        }
    }

    fn recording_engine(hits: Vec<VectorHit>) -> (HybridSearchEngine, Arc<RecordingVectorStore>) {
        let store = Arc::new(RecordingVectorStore {
            hits,
            queries: std::sync::Mutex::new(Vec::new()),
        });
        let engine = HybridSearchEngine::new(
            store.clone(),
            Arc::new(FixedGraphStore { related: vec![] }),
            Arc::new(Lexicon::builtin().unwrap()),
            &RetrievalConfig::default(),
        )
        .unwrap();
        (engine, store)
    }

    fn hit(text: &str, score: f32) -> VectorHit {
        let mut metadata = Map::new();
        metadata.insert("source_file".to_string(), json!("notes.md"));
        VectorHit {
            text: text.to_string(),
            score,
            metadata,
        }
    }

    fn engine(hits: Vec<VectorHit>, related: Vec<RelatedEntity>) -> HybridSearchEngine {
        HybridSearchEngine::new(
            Arc::new(FixedVectorStore { hits }),
            Arc::new(FixedGraphStore { related }),
            Arc::new(Lexicon::builtin().unwrap()),
            &RetrievalConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_vector_and_keyword_hits_are_fused() {
        let engine = engine(vec![hit("Qdrant stores vectors", 0.8)], vec![]);
        let request = SearchRequest::new("qdrant vectors", 5).with_graph(false);

        let result = engine.search(&request).await;
        assert_eq!(result.vector_results, 1);
        assert_eq!(result.keyword_results, 1);
        assert_eq!(result.results.len(), 1);

        // 0.8 * 0.5 + (2/2) * 0.2
        assert!((result.results[0].score - 0.6).abs() < 1e-6);
        assert_eq!(result.results[0].source, "notes.md");
    }

    #[tokio::test]
    async fn test_graph_scores_use_default_confidence() {
        let mut known = RelatedEntity::new("Rust", "Language");
        known.confidence = Some(1.0);
        let unknown = RelatedEntity::new("Mozilla", "Organization");

        let engine = engine(vec![], vec![known, unknown]);
        let request = SearchRequest::new("Qdrant", 5)
            .with_vector(false)
            .with_keyword(false);

        let result = engine.search(&request).await;
        assert_eq!(result.graph_results, 2);
        assert_eq!(result.results[0].content, "Entity: Rust (Type: Language)");
        assert!((result.results[0].score - 0.3).abs() < 1e-6);
        assert!((result.results[1].score - 0.21).abs() < 1e-6);
        assert_eq!(result.results[1].source, "unknown");
    }

    #[tokio::test]
    async fn test_all_methods_disabled() {
        let engine = engine(vec![hit("anything", 1.0)], vec![]);
        let request = SearchRequest::new("anything", 5)
            .with_vector(false)
            .with_graph(false)
            .with_keyword(false);

        let result = engine.search(&request).await;
        assert!(result.is_empty());
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn test_keywords_keep_punctuation_in_requery() {
        let (engine, store) = recording_engine(vec![hit("Qdrant is a vector database", 0.9)]);
        let request = SearchRequest::new("What is Qdrant?", 5)
            .with_vector(false)
            .with_graph(false);

        let result = engine.search(&request).await;
        assert_eq!(*store.queries.lock().unwrap(), vec!["what qdrant?"]);
        assert_eq!(result.keyword_results, 1);
        // neither "what" nor "qdrant?" appears in the hit text
        assert_eq!(result.results[0].score, 0.0);
    }

    #[tokio::test]
    async fn test_stop_word_query_still_requeries() {
        let (engine, store) = recording_engine(vec![hit("anything", 0.5), hit("else", 0.4)]);
        let request = SearchRequest::new("a to", 5)
            .with_vector(false)
            .with_graph(false);

        let result = engine.search(&request).await;
        assert_eq!(*store.queries.lock().unwrap(), vec![""]);
        assert_eq!(result.keyword_results, 2);
        assert!(result.results.iter().all(|r| r.score == 0.0));
    }
}
