//! Retrieval outcome handed to answer generation

use crate::agents::AgentMetadata;
use crate::config::RetrievalMode;
use crate::query::ProcessedQuery;
use crate::retrieval::{MethodFailure, SearchResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const NO_CONTEXT_MESSAGE: &str = "I couldn't find relevant information to answer your question. \
This might be outside my current knowledge base. Please try rephrasing or asking about a different topic.";

/// User-facing message returned instead of contexts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The question failed validation; no collaborator was called
    ValidationFailed { reason: String },
    /// Retrieval ran but nothing relevant came back
    NoContext,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ValidationFailed { reason } => write!(
                f,
                "Input validation failed: {}. Please check your input and try again.",
                reason
            ),
            Notice::NoContext => f.write_str(NO_CONTEXT_MESSAGE),
        }
    }
}

/// Context passed to the answer generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedContext {
    pub content: String,
    pub source: String,
    pub score: f32,
}

impl From<SearchResult> for RankedContext {
    fn from(result: SearchResult) -> Self {
        Self {
            content: result.content,
            source: result.source,
            score: result.score,
        }
    }
}

/// How the contexts were obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetrievalStats {
    Hybrid {
        /// Query variants searched (1 without multi-query)
        queries: usize,
        vector_results: usize,
        graph_results: usize,
        keyword_results: usize,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        failures: Vec<MethodFailure>,
    },
    Routed {
        agent_name: String,
        metadata: AgentMetadata,
    },
}

/// Everything retrieval produced for one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    pub request_id: String,
    pub question: String,
    pub processed: ProcessedQuery,
    pub mode: RetrievalMode,
    pub contexts: Vec<RankedContext>,
    /// 0.0 whenever there are no contexts
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RetrievalStats>,
    pub retrieval_time_ms: f64,
}

impl RetrievalOutcome {
    /// True when contexts are available for answer generation
    pub fn has_contexts(&self) -> bool {
        self.notice.is_none() && !self.contexts.is_empty()
    }

    /// Notice text, if any
    pub fn message(&self) -> Option<String> {
        self.notice.as_ref().map(Notice::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryError;

    #[test]
    fn test_notice_messages() {
        let notice = Notice::ValidationFailed {
            reason: QueryError::TooShort { min: 3 }.to_string(),
        };
        assert_eq!(
            notice.to_string(),
            "Input validation failed: Query too short (min 3 chars). Please check your input and try again."
        );
        assert!(Notice::NoContext
            .to_string()
            .starts_with("I couldn't find relevant information to answer your question."));
    }

    #[test]
    fn test_notice_serializes_with_kind_tag() {
        let json = serde_json::to_value(Notice::NoContext).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "no_context" }));
    }
}
