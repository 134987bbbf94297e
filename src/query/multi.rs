//! Multi-query generation for compound questions

use crate::lexicon::Lexicon;
use crate::query::QueryExpander;
use std::sync::Arc;

/// Generates multiple query variations for multi-query retrieval
#[derive(Debug, Clone)]
pub struct MultiQueryGenerator {
    lexicon: Arc<Lexicon>,
    expander: QueryExpander,
}

impl MultiQueryGenerator {
    pub fn new(lexicon: Arc<Lexicon>, expander: QueryExpander) -> Self {
        Self { lexicon, expander }
    }

    /// Up to `num_queries` distinct variations, original first
    ///
    /// Sub-queries of a compound question come right after the original so that
    /// a small `num_queries` still covers each clause; expansion variants fill
    /// the remaining slots.
    pub fn generate_multi_queries(&self, query: &str, num_queries: usize) -> Vec<String> {
        let mut queries = vec![query.to_string()];

        if self.is_complex_query(query) {
            for sub_query in self.decompose_query(query) {
                push_unique(&mut queries, sub_query);
            }
        }

        for variant in self.expander.expand(query) {
            push_unique(&mut queries, variant);
        }

        queries.truncate(num_queries);
        queries
    }

    /// Complex if it names more than one question word or joins clauses with "and"
    pub fn is_complex_query(&self, query: &str) -> bool {
        let lowered = query.to_lowercase();

        let question_count = self
            .lexicon
            .question_words()
            .iter()
            .filter(|word| lowered.contains(word.as_str()))
            .count();

        question_count > 1 || lowered.contains(" and ")
    }

    /// Split on the conjunction and, independently, on commas
    pub fn decompose_query(&self, query: &str) -> Vec<String> {
        let mut sub_queries = Vec::new();

        if query.to_lowercase().contains(" and ") {
            sub_queries.extend(
                self.lexicon
                    .conjunction()
                    .split(query)
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(str::to_string),
            );
        }

        if query.contains(',') {
            let min_len = self.lexicon.min_clause_length();
            sub_queries.extend(
                query
                    .split(',')
                    .map(str::trim)
                    .filter(|part| part.chars().count() >= min_len)
                    .map(str::to_string),
            );
        }

        sub_queries
    }
}

fn push_unique(queries: &mut Vec<String>, candidate: String) {
    if !queries.contains(&candidate) {
        queries.push(candidate);
    }
}
