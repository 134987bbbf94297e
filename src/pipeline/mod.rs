//! Retrieval pipeline
//!
//! Wires query understanding, hybrid search and agent routing into a single
//! `retrieve` call that always returns an outcome: contexts for the answer
//! generator, or a notice explaining why there are none.

mod outcome;

pub use outcome::{Notice, RankedContext, RetrievalOutcome, RetrievalStats};

use crate::agents::{AgentRouter, AgentStores};
use crate::config::{Config, RetrievalMode};
use crate::error::{RagError, Result};
use crate::lexicon::Lexicon;
use crate::query::{MultiQueryGenerator, ProcessedQuery, QueryExpander, QueryProcessor};
use crate::retrieval::{merge_and_rerank, HybridSearchEngine, HybridSearchResult, SearchRequest};
use crate::store::{GraphStore, VectorStore};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// End-to-end retrieval over shared, immutable components
pub struct QueryPipeline {
    processor: QueryProcessor,
    expander: QueryExpander,
    multi: MultiQueryGenerator,
    engine: HybridSearchEngine,
    router: AgentRouter,
    mode: RetrievalMode,
    top_k: usize,
    multi_query: usize,
    rewrite: bool,
}

impl QueryPipeline {
    /// Build every component from a validated configuration
    pub fn from_config(
        config: &Config,
        vector_store: Arc<dyn VectorStore>,
        graph_store: Arc<dyn GraphStore>,
    ) -> Result<Self> {
        let lexicon = Arc::new(match &config.lexicon.file {
            Some(path) => Lexicon::from_file(path)?,
            None => Lexicon::builtin()?,
        });

        let processor = QueryProcessor::new(lexicon.clone(), &config.query);
        let expander = QueryExpander::new(lexicon.clone(), config.expansion.max_expansions);
        let multi = MultiQueryGenerator::new(lexicon.clone(), expander.clone());
        let engine = HybridSearchEngine::new(
            vector_store.clone(),
            graph_store.clone(),
            lexicon.clone(),
            &config.retrieval,
        )
        .map_err(|e| RagError::Config(e.to_string()))?;
        let router = AgentRouter::new(
            AgentStores::new(vector_store, graph_store, lexicon),
            &config.agents,
        );

        tracing::debug!(
            "Pipeline ready: mode={}, top_k={}, multi_query={}, rewrite={}",
            config.pipeline.mode,
            config.pipeline.top_k,
            config.pipeline.multi_query,
            config.pipeline.rewrite
        );

        Ok(Self {
            processor,
            expander,
            multi,
            engine,
            router,
            mode: config.pipeline.mode,
            top_k: config.pipeline.top_k,
            multi_query: config.pipeline.multi_query,
            rewrite: config.pipeline.rewrite,
        })
    }

    pub fn mode(&self) -> RetrievalMode {
        self.mode
    }

    pub fn processor(&self) -> &QueryProcessor {
        &self.processor
    }

    pub fn engine(&self) -> &HybridSearchEngine {
        &self.engine
    }

    pub fn router(&self) -> &AgentRouter {
        &self.router
    }

    /// Retrieve contexts for one question
    pub async fn retrieve(&self, question: &str) -> RetrievalOutcome {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("retrieve", request_id = %request_id, mode = %self.mode);

        self.retrieve_inner(question, request_id)
            .instrument(span)
            .await
    }

    /// Retrieve contexts for several questions concurrently
    ///
    /// Outcomes are returned in input order.
    pub async fn retrieve_batch<S: AsRef<str>>(&self, questions: &[S]) -> Vec<RetrievalOutcome> {
        join_all(questions.iter().map(|q| self.retrieve(q.as_ref()))).await
    }

    async fn retrieve_inner(&self, question: &str, request_id: String) -> RetrievalOutcome {
        let start = Instant::now();
        let mut processed = self.processor.process(question);

        let mut outcome = RetrievalOutcome {
            request_id,
            question: question.to_string(),
            processed: processed.clone(),
            mode: self.mode,
            contexts: Vec::new(),
            confidence: 0.0,
            notice: None,
            stats: None,
            retrieval_time_ms: 0.0,
        };

        if let Some(error) = &processed.validation_error {
            tracing::info!("Validation failed: {}", error);
            outcome.notice = Some(Notice::ValidationFailed {
                reason: error.to_string(),
            });
            return outcome;
        }

        if self.rewrite {
            let rewritten = self
                .expander
                .rewrite(&processed.processed_query, Some(processed.query_type));
            processed = processed.with_rewrite(rewritten);
        }

        let (contexts, confidence, stats, processed) = match self.mode {
            RetrievalMode::Hybrid => self.hybrid(processed).await,
            RetrievalMode::Routed => self.routed(processed).await,
        };

        outcome.processed = processed;
        outcome.retrieval_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        outcome.stats = Some(stats);

        if contexts.is_empty() {
            outcome.notice = Some(Notice::NoContext);
        } else {
            outcome.contexts = contexts;
            outcome.confidence = confidence;
        }

        tracing::info!(
            "Retrieved {} contexts (type={}, confidence={:.2}) in {:.1}ms",
            outcome.contexts.len(),
            outcome.processed.query_type,
            outcome.confidence,
            outcome.retrieval_time_ms
        );

        outcome
    }

    async fn hybrid(
        &self,
        processed: ProcessedQuery,
    ) -> (Vec<RankedContext>, f32, RetrievalStats, ProcessedQuery) {
        let search_text = processed.search_text().to_string();

        let (search, queries, processed) = if self.multi_query > 1 {
            let variants = self.multi.generate_multi_queries(&search_text, self.multi_query);
            tracing::debug!("Searching {} query variants", variants.len());
            let search = self.multi_search(&variants).await;
            let count = variants.len();
            (search, count, processed.with_expansions(variants))
        } else {
            let request = SearchRequest::new(search_text, self.top_k);
            (self.engine.search(&request).await, 1, processed)
        };

        let confidence = search
            .results
            .first()
            .map(|r| r.score.clamp(0.0, 1.0))
            .unwrap_or(0.0);

        let stats = RetrievalStats::Hybrid {
            queries,
            vector_results: search.vector_results,
            graph_results: search.graph_results,
            keyword_results: search.keyword_results,
            failures: search.failures,
        };
        let contexts = search.results.into_iter().map(RankedContext::from).collect();

        (contexts, confidence, stats, processed)
    }

    /// One hybrid search per variant, fused with the same merge policy
    async fn multi_search(&self, variants: &[String]) -> HybridSearchResult {
        let start = Instant::now();
        let requests: Vec<SearchRequest> = variants
            .iter()
            .map(|q| SearchRequest::new(q.clone(), self.top_k))
            .collect();

        let searches = join_all(requests.iter().map(|r| self.engine.search(r))).await;

        let mut fused = HybridSearchResult {
            results: Vec::new(),
            total_results: 0,
            vector_results: 0,
            graph_results: 0,
            keyword_results: 0,
            retrieval_time_ms: 0.0,
            failures: Vec::new(),
        };
        let mut all_results = Vec::new();
        for search in searches {
            fused.vector_results += search.vector_results;
            fused.graph_results += search.graph_results;
            fused.keyword_results += search.keyword_results;
            fused.failures.extend(search.failures);
            all_results.extend(search.results);
        }

        fused.results = merge_and_rerank(all_results, self.top_k, self.engine.dedup_key_chars());
        fused.total_results = fused.results.len();
        fused.retrieval_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        fused
    }

    async fn routed(
        &self,
        processed: ProcessedQuery,
    ) -> (Vec<RankedContext>, f32, RetrievalStats, ProcessedQuery) {
        let result = self
            .router
            .route(processed.search_text(), Some(processed.query_type), self.top_k)
            .await;

        let contexts = result
            .contexts
            .into_iter()
            .map(|content| RankedContext {
                content,
                source: result.agent_name.clone(),
                score: result.confidence,
            })
            .collect();

        let stats = RetrievalStats::Routed {
            agent_name: result.agent_name,
            metadata: result.metadata,
        };

        (contexts, result.confidence, stats, processed)
    }
}
