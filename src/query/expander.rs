//! Query expansion and type-aware rewriting

use crate::lexicon::{Lexicon, StopWordSet};
use crate::query::processor::normalize;
use crate::query::QueryType;
use std::sync::Arc;

/// Expands and rewrites queries for better retrieval
///
/// Both operations are pure functions of the input and the lexicon tables.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    lexicon: Arc<Lexicon>,
    max_expansions: usize,
}

impl QueryExpander {
    pub fn new(lexicon: Arc<Lexicon>, max_expansions: usize) -> Self {
        Self {
            lexicon,
            max_expansions: max_expansions.max(1),
        }
    }

    /// Expand a query into variations, original first
    ///
    /// Candidates in order: synonym substitution, question reformulation,
    /// keyword-only form. Each is kept only when it differs from the input.
    pub fn expand(&self, query: &str) -> Vec<String> {
        let mut expansions = vec![query.to_string()];

        let synonym_query = self.expand_with_synonyms(query);
        if synonym_query != query {
            expansions.push(synonym_query);
        }

        if let Some(reformulated) = self.reformulate_question(query) {
            if reformulated != query {
                expansions.push(reformulated);
            }
        }

        if let Some(keyword_query) = self.keyword_query(query) {
            if keyword_query != query {
                expansions.push(keyword_query);
            }
        }

        expansions.truncate(self.max_expansions);
        expansions
    }

    /// Rewrite a query for its type; unknown types only get normalized
    pub fn rewrite(&self, query: &str, query_type: Option<QueryType>) -> String {
        let query = self.normalize(query);

        match query_type {
            Some(QueryType::Factual) => self.rewrite_factual(&query),
            Some(QueryType::Lookup) => self.rewrite_lookup(&query),
            Some(QueryType::Summarization) => self.rewrite_summarization(&query),
            Some(QueryType::Reasoning) => self.rewrite_reasoning(query),
            Some(QueryType::SemanticLinkage) | None => query,
        }
    }

    /// Keyword-only form: expansion stop-words and punctuation removed
    ///
    /// `None` when nothing survives the filter.
    pub fn keyword_query(&self, query: &str) -> Option<String> {
        let keywords = self.lexicon.keywords(query, StopWordSet::Expansion);
        if keywords.is_empty() {
            None
        } else {
            Some(keywords.join(" "))
        }
    }

    fn normalize(&self, query: &str) -> String {
        let collapsed = normalize(query);
        self.lexicon
            .rewrite()
            .trailing_question
            .replace(&collapsed, "?")
            .trim()
            .to_string()
    }

    /// Replace every table word with its first synonym; other words pass through
    fn expand_with_synonyms(&self, query: &str) -> String {
        query
            .to_lowercase()
            .split_whitespace()
            .map(|word| {
                let clean = self.lexicon.strip_punctuation(word);
                self.lexicon
                    .first_synonym(clean)
                    .unwrap_or(word)
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// First matching reformulation template, applied to the lower-cased query
    fn reformulate_question(&self, query: &str) -> Option<String> {
        let lowered = query.to_lowercase();

        self.lexicon.reformulations().iter().find_map(|rf| {
            rf.regex
                .captures(&lowered)
                .and_then(|caps| caps.get(1))
                .map(|subject| format!("{} {}", subject.as_str(), rf.suffix))
        })
    }

    fn rewrite_factual(&self, query: &str) -> String {
        let lowered = query.to_lowercase();
        self.lexicon
            .rewrite()
            .factual_prefix
            .replace(&lowered, "")
            .trim()
            .to_string()
    }

    fn rewrite_lookup(&self, query: &str) -> String {
        self.keyword_query(query)
            .unwrap_or_else(|| query.to_string())
    }

    fn rewrite_summarization(&self, query: &str) -> String {
        let rewrite = self.lexicon.rewrite();
        let lowered = query.to_lowercase();
        let without_terms = rewrite.summarization_terms.replace_all(&lowered, "");
        let without_articles = rewrite.summarization_articles.replace_all(&without_terms, "");
        normalize(&without_articles)
    }

    fn rewrite_reasoning(&self, query: String) -> String {
        let rewrite = self.lexicon.rewrite();
        let lowered = query.to_lowercase();

        if rewrite
            .reasoning_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
        {
            query
        } else {
            format!("{} {}", query, rewrite.reasoning_suffix)
        }
    }
}
