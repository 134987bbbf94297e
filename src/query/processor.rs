//! Query validation and classification

use crate::config::QueryConfig;
use crate::lexicon::Lexicon;
use crate::query::{ProcessedQuery, QueryError, QueryType};
use std::sync::Arc;

/// Validates, normalizes and classifies raw questions
///
/// Pure: no I/O and no collaborator calls.
#[derive(Debug, Clone)]
pub struct QueryProcessor {
    lexicon: Arc<Lexicon>,
    min_length: usize,
    max_length: usize,
}

impl QueryProcessor {
    pub fn new(lexicon: Arc<Lexicon>, config: &QueryConfig) -> Self {
        Self {
            lexicon,
            min_length: config.min_length,
            max_length: config.max_length,
        }
    }

    /// Process and validate a query
    pub fn process(&self, query: &str) -> ProcessedQuery {
        if let Err(error) = self.validate(query) {
            tracing::debug!("Rejected query: {}", error);
            return ProcessedQuery::invalid(query, error);
        }

        let processed = normalize(query);
        let query_type = self.classify(&processed);

        ProcessedQuery::valid(query, processed, query_type)
    }

    /// Check length bounds on the trimmed query, counted in characters
    pub fn validate(&self, query: &str) -> Result<(), QueryError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }

        let length = trimmed.chars().count();
        if length < self.min_length {
            return Err(QueryError::TooShort {
                min: self.min_length,
            });
        }

        if length > self.max_length {
            return Err(QueryError::TooLong {
                max: self.max_length,
            });
        }

        Ok(())
    }

    /// First-match keyword classification, Factual when nothing matches
    pub fn classify(&self, query: &str) -> QueryType {
        self.lexicon
            .classify(&query.to_lowercase())
            .unwrap_or(QueryType::Factual)
    }
}

/// Trim and collapse internal whitespace runs to single spaces
pub(crate) fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn processor() -> QueryProcessor {
        QueryProcessor::new(Arc::new(Lexicon::builtin().unwrap()), &Config::default().query)
    }

    #[test]
    fn test_empty_and_blank() {
        let p = processor();
        for raw in ["", "   ", "\n\t"] {
            let result = p.process(raw);
            assert!(!result.is_valid);
            assert_eq!(result.validation_error, Some(QueryError::Empty));
            assert_eq!(result.query_type, QueryType::Factual);
            assert!(result.processed_query.is_empty());
        }
    }

    #[test]
    fn test_length_bounds_after_trim() {
        let p = processor();

        let short = p.process("  ab  ");
        assert_eq!(short.validation_error, Some(QueryError::TooShort { min: 3 }));

        assert!(p.process("  abc  ").is_valid);
        assert!(p.process(&"x".repeat(500)).is_valid);

        let long = p.process(&"x".repeat(501));
        assert_eq!(long.validation_error, Some(QueryError::TooLong { max: 500 }));

        // Surrounding whitespace does not count against the upper bound
        let padded = format!("   {}   ", "x".repeat(500));
        assert!(p.process(&padded).is_valid);
    }

    #[test]
    fn test_normalization() {
        let p = processor();
        let result = p.process("  What   is \t the\nanswer?  ");
        assert!(result.is_valid);
        assert_eq!(result.processed_query, "What is the answer?");
        assert_eq!(result.original_query, "  What   is \t the\nanswer?  ");
    }

    #[test]
    fn test_classification_order() {
        let p = processor();
        let cases = [
            ("What is Qdrant?", QueryType::Factual),
            ("Who founded the company", QueryType::Factual),
            ("Find all invoices from March", QueryType::Lookup),
            ("List the configured backends", QueryType::Lookup),
            ("Summarize the quarterly report", QueryType::Summarization),
            ("Give me an overview of caching", QueryType::Summarization),
            ("Connect the outage to the deploy", QueryType::SemanticLinkage),
            ("Differences between Rust and Go", QueryType::SemanticLinkage),
            ("Why did latency spike", QueryType::Reasoning),
            ("Explain caching and find eviction policies", QueryType::Lookup),
            ("Qdrant vector database", QueryType::Factual),
        ];

        for (query, expected) in cases {
            assert_eq!(p.process(query).query_type, expected, "query: {}", query);
        }
    }

    #[test]
    fn test_classification_is_substring_based() {
        let p = processor();
        // "somewhat" contains "what"; first-match rules are kept as-is
        assert_eq!(p.classify("somewhat slow builds"), QueryType::Factual);
        // "show" is checked before "how"
        assert_eq!(p.classify("show deployment steps"), QueryType::Lookup);
    }
}
