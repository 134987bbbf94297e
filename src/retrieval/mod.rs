//! Hybrid Retrieval & Weighted Fusion
//!
//! This module runs vector, graph and keyword sub-searches side by side and fuses
//! their differently-scaled scores into one bounded, deterministic ranking.

mod deduplication;
mod fusion;
mod hybrid;

pub use deduplication::dedup_key;
pub use fusion::{keyword_match_ratio, merge_and_rerank, FusionConfig, FusionError};
pub use hybrid::{HybridSearchEngine, SearchError};

use crate::store::Filters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Retrieval method that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMethod {
    Vector,
    Graph,
    Keyword,
}

impl RetrievalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMethod::Vector => "vector",
            RetrievalMethod::Graph => "graph",
            RetrievalMethod::Keyword => "keyword",
        }
    }
}

impl fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,

    /// Weighted relevance; summed across methods after fusion
    pub score: f32,

    pub source: String,

    pub metadata: Map<String, Value>,

    pub retrieval_method: RetrievalMethod,
}

impl SearchResult {
    /// Short preview of the content (first N characters)
    pub fn preview(&self, max_chars: usize) -> String {
        match self.content.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &self.content[..idx]),
            None => self.content.clone(),
        }
    }
}

/// Sub-search that failed or missed its deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodFailure {
    pub method: RetrievalMethod,
    pub reason: String,
}

/// Result from one hybrid search invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridSearchResult {
    /// Deduplicated results, descending score, at most `top_k`
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    /// Raw per-method counts before merging
    pub vector_results: usize,
    pub graph_results: usize,
    pub keyword_results: usize,
    pub retrieval_time_ms: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<MethodFailure>,
}

impl HybridSearchResult {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Hybrid search request with per-method switches and optional filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: usize,
    pub use_vector: bool,
    pub use_graph: bool,
    pub use_keyword: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
}

impl SearchRequest {
    /// All three methods enabled, no filters
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
            use_vector: true,
            use_graph: true,
            use_keyword: true,
            filters: None,
        }
    }

    pub fn with_vector(mut self, enabled: bool) -> Self {
        self.use_vector = enabled;
        self
    }

    pub fn with_graph(mut self, enabled: bool) -> Self {
        self.use_graph = enabled;
        self
    }

    pub fn with_keyword(mut self, enabled: bool) -> Self {
        self.use_keyword = enabled;
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = if filters.is_empty() { None } else { Some(filters) };
        self
    }
}
