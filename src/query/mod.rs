//! Query understanding
//!
//! Validation and classification of raw questions, type-aware rewriting, expansion
//! into variants, and decomposition of compound questions into sub-queries.

mod expander;
mod multi;
mod processor;

pub use expander::QueryExpander;
pub use multi::MultiQueryGenerator;
pub use processor::QueryProcessor;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of query types driving agent selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Factual,
    Lookup,
    Summarization,
    SemanticLinkage,
    Reasoning,
}

impl QueryType {
    pub fn all() -> [QueryType; 5] {
        [
            QueryType::Factual,
            QueryType::Lookup,
            QueryType::Summarization,
            QueryType::SemanticLinkage,
            QueryType::Reasoning,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Factual => "factual",
            QueryType::Lookup => "lookup",
            QueryType::Summarization => "summarization",
            QueryType::SemanticLinkage => "semantic_linkage",
            QueryType::Reasoning => "reasoning",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        QueryType::all()
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("Unknown query type: {}", s))
    }
}

/// Reason a raw query was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryError {
    #[error("Query is empty")]
    Empty,

    #[error("Query too short (min {min} chars)")]
    TooShort { min: usize },

    #[error("Query too long (max {max} chars)")]
    TooLong { max: usize },
}

/// Validated and classified query
///
/// Built once by [`QueryProcessor::process`]; the optional expansions and rewrite
/// are attached by consuming builders, never by mutation in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedQuery {
    /// Text as received from the caller
    pub original_query: String,

    /// Trimmed text with whitespace runs collapsed (empty when invalid)
    pub processed_query: String,

    /// Assigned type (Factual when invalid; never consulted in that case)
    pub query_type: QueryType,

    pub is_valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<QueryError>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded_queries: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten_query: Option<String>,
}

impl ProcessedQuery {
    pub fn valid(original: impl Into<String>, processed: String, query_type: QueryType) -> Self {
        Self {
            original_query: original.into(),
            processed_query: processed,
            query_type,
            is_valid: true,
            validation_error: None,
            expanded_queries: None,
            rewritten_query: None,
        }
    }

    pub fn invalid(original: impl Into<String>, error: QueryError) -> Self {
        Self {
            original_query: original.into(),
            processed_query: String::new(),
            query_type: QueryType::Factual,
            is_valid: false,
            validation_error: Some(error),
            expanded_queries: None,
            rewritten_query: None,
        }
    }

    pub fn with_expansions(self, expansions: Vec<String>) -> Self {
        Self {
            expanded_queries: Some(expansions),
            ..self
        }
    }

    pub fn with_rewrite(self, rewritten: String) -> Self {
        Self {
            rewritten_query: Some(rewritten),
            ..self
        }
    }

    /// Text retrieval should run against: the rewrite if present, else the cleaned query
    pub fn search_text(&self) -> &str {
        self.rewritten_query
            .as_deref()
            .unwrap_or(&self.processed_query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_parsing() {
        assert_eq!("lookup".parse::<QueryType>(), Ok(QueryType::Lookup));
        assert_eq!(
            "Semantic-Linkage".parse::<QueryType>(),
            Ok(QueryType::SemanticLinkage)
        );
        assert!("unknown".parse::<QueryType>().is_err());

        for t in QueryType::all() {
            assert_eq!(t.to_string().parse::<QueryType>(), Ok(t));
        }
    }

    #[test]
    fn test_query_error_messages() {
        assert_eq!(QueryError::Empty.to_string(), "Query is empty");
        assert_eq!(
            QueryError::TooShort { min: 3 }.to_string(),
            "Query too short (min 3 chars)"
        );
        assert_eq!(
            QueryError::TooLong { max: 500 }.to_string(),
            "Query too long (max 500 chars)"
        );
    }

    #[test]
    fn test_search_text_prefers_rewrite() {
        let query = ProcessedQuery::valid("What is Qdrant?", "What is Qdrant?".into(), QueryType::Factual);
        assert_eq!(query.search_text(), "What is Qdrant?");

        let rewritten = query.with_rewrite("qdrant?".to_string());
        assert_eq!(rewritten.search_text(), "qdrant?");
    }
}
