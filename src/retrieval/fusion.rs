//! Weighted score fusion for combining search results

use crate::config::RetrievalConfig;
use crate::retrieval::{dedup_key, RetrievalMethod, SearchResult};
use ahash::{HashMap, HashMapExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Invalid weight configuration: weights must be non-negative and finite")]
    InvalidWeights,

    #[error("Invalid weight configuration: at least one weight must be positive")]
    AllWeightsZero,
}

/// Per-method weights applied to raw scores before fusion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionConfig {
    pub vector_weight: f32,
    pub graph_weight: f32,
    pub keyword_weight: f32,
}

impl FusionConfig {
    pub fn new(vector_weight: f32, graph_weight: f32, keyword_weight: f32) -> Result<Self, FusionError> {
        let weights = [vector_weight, graph_weight, keyword_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(FusionError::InvalidWeights);
        }
        if weights.iter().all(|w| *w == 0.0) {
            return Err(FusionError::AllWeightsZero);
        }

        Ok(Self {
            vector_weight,
            graph_weight,
            keyword_weight,
        })
    }

    pub fn from_config(config: &RetrievalConfig) -> Result<Self, FusionError> {
        Self::new(config.vector_weight, config.graph_weight, config.keyword_weight)
    }

    pub fn weight(&self, method: RetrievalMethod) -> f32 {
        match method {
            RetrievalMethod::Vector => self.vector_weight,
            RetrievalMethod::Graph => self.graph_weight,
            RetrievalMethod::Keyword => self.keyword_weight,
        }
    }

    /// Scale a method-local score into the shared fusion space
    pub fn weighted(&self, method: RetrievalMethod, raw_score: f32) -> f32 {
        raw_score * self.weight(method)
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            vector_weight: 0.5,
            graph_weight: 0.3,
            keyword_weight: 0.2,
        }
    }
}

/// Merge results sharing a content-prefix key and rank them
///
/// Scores of results with the same key are summed into the first-inserted
/// result, so content found by several methods outranks content found by one.
/// The sort is stable: ties keep insertion order.
///
/// # Arguments
/// * `results` - weighted results in discovery order
/// * `top_k` - maximum number of results to keep
/// * `key_chars` - number of leading content characters forming the key
pub fn merge_and_rerank(results: Vec<SearchResult>, top_k: usize, key_chars: usize) -> Vec<SearchResult> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(results.len());
    let mut merged: Vec<SearchResult> = Vec::with_capacity(results.len());

    for result in results {
        let key = dedup_key(&result.content, key_chars);

        if let Some(&idx) = positions.get(key) {
            merged[idx].score += result.score;
        } else {
            positions.insert(key.to_string(), merged.len());
            merged.push(result);
        }
    }

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.truncate(top_k);
    merged
}

/// Fraction of `keywords` found (as substrings) in the lower-cased text
pub fn keyword_match_ratio(keywords: &[String], text: &str) -> f32 {
    if keywords.is_empty() {
        return 0.0;
    }

    let text_lower = text.to_lowercase();
    let matches = keywords
        .iter()
        .filter(|kw| text_lower.contains(kw.as_str()))
        .count();

    matches as f32 / keywords.len() as f32
}
