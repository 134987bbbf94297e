//! Lexicon registry for query understanding
//!
//! This module provides:
//! - Ordered classification rules mapping keywords to query types
//! - The synonym table used for query expansion
//! - Stop-word sets for expansion, lookup filtering and keyword search
//! - Pre-compiled reformulation and rewrite patterns
//!
//! The built-in tables ship in `builtin.toml` and are compiled once at startup.
//! A replacement file with the same layout can be loaded with `Lexicon::from_file`.

use crate::error::{RagError, Result};
use crate::query::QueryType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const BUILTIN_LEXICON: &str = include_str!("builtin.toml");

/// Tokens used as entity candidates when a query has no capitalized words
const ENTITY_FALLBACK_TOKENS: usize = 3;

/// Classification rule as written in the lexicon file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub query_type: QueryType,
    pub keywords: Vec<String>,
}

/// Stop-word sets as written in the lexicon file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopWordsConfig {
    pub expansion: Vec<String>,
    pub lookup: Vec<String>,
    pub search: Vec<String>,
}

/// Complexity heuristic settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityConfig {
    pub question_words: Vec<String>,
    pub conjunction: String,
    pub min_clause_length: usize,
}

/// Question reformulation template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReformulationConfig {
    pub name: String,
    pub pattern: String,
    pub suffix: String,
}

/// Type-specific rewrite patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    pub trailing_question: String,
    pub factual_prefix: String,
    pub summarization_terms: String,
    pub summarization_articles: String,
    pub reasoning_markers: Vec<String>,
    pub reasoning_suffix: String,
}

/// Lexicon file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconFile {
    pub punctuation: String,
    pub classification: Vec<ClassificationRule>,
    pub synonyms: HashMap<String, Vec<String>>,
    pub stopwords: StopWordsConfig,
    pub complexity: ComplexityConfig,
    pub reformulation: Vec<ReformulationConfig>,
    pub rewrite: RewriteConfig,
}

/// Which stop-word set a keyword extraction should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopWordSet {
    /// Broad set used by the expander's keyword-only variant
    Expansion,
    /// Lookup agent set, also drops lookup verbs
    Lookup,
    /// Minimal set used by the hybrid keyword sub-search
    Search,
}

/// Compiled reformulation template
#[derive(Debug, Clone)]
pub struct CompiledReformulation {
    pub name: String,
    pub regex: Regex,
    pub suffix: String,
}

/// Compiled type-specific rewrite patterns
#[derive(Debug, Clone)]
pub struct CompiledRewrite {
    pub trailing_question: Regex,
    pub factual_prefix: Regex,
    pub summarization_terms: Regex,
    pub summarization_articles: Regex,
    pub reasoning_markers: Vec<String>,
    pub reasoning_suffix: String,
}

/// Immutable lexicon with all pre-compiled patterns
#[derive(Debug, Clone)]
pub struct Lexicon {
    punctuation: Vec<char>,
    classification: Vec<ClassificationRule>,
    synonyms: HashMap<String, Vec<String>>,
    expansion_stopwords: HashSet<String>,
    lookup_stopwords: HashSet<String>,
    search_stopwords: HashSet<String>,
    question_words: Vec<String>,
    conjunction: Regex,
    min_clause_length: usize,
    reformulations: Vec<CompiledReformulation>,
    rewrite: CompiledRewrite,
}

impl Lexicon {
    /// Compile the lexicon that ships with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_LEXICON)
    }

    /// Load and compile a lexicon file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to read lexicon file: {:?}", path),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and compile a lexicon from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: LexiconFile = toml::from_str(content)?;
        Self::from_config(file)
    }

    /// Build a lexicon from a parsed file
    pub fn from_config(file: LexiconFile) -> Result<Self> {
        if file.classification.is_empty() {
            return Err(RagError::Lexicon(
                "At least one classification rule is required".to_string(),
            ));
        }

        let reformulations = file
            .reformulation
            .iter()
            .map(|rf| {
                compile(&rf.pattern, &format!("reformulation '{}'", rf.name)).map(|regex| {
                    CompiledReformulation {
                        name: rf.name.clone(),
                        regex,
                        suffix: rf.suffix.clone(),
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let rewrite = CompiledRewrite {
            trailing_question: compile(&file.rewrite.trailing_question, "rewrite.trailing_question")?,
            factual_prefix: compile(&file.rewrite.factual_prefix, "rewrite.factual_prefix")?,
            summarization_terms: compile(
                &file.rewrite.summarization_terms,
                "rewrite.summarization_terms",
            )?,
            summarization_articles: compile(
                &file.rewrite.summarization_articles,
                "rewrite.summarization_articles",
            )?,
            reasoning_markers: lowercase_all(&file.rewrite.reasoning_markers),
            reasoning_suffix: file.rewrite.reasoning_suffix,
        };

        let classification = file
            .classification
            .into_iter()
            .map(|rule| ClassificationRule {
                query_type: rule.query_type,
                keywords: lowercase_all(&rule.keywords),
            })
            .collect();

        let synonyms = file
            .synonyms
            .into_iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(key, list)| (key.to_lowercase(), list))
            .collect();

        Ok(Self {
            punctuation: file.punctuation.chars().collect(),
            classification,
            synonyms,
            expansion_stopwords: lowercase_all(&file.stopwords.expansion).into_iter().collect(),
            lookup_stopwords: lowercase_all(&file.stopwords.lookup).into_iter().collect(),
            search_stopwords: lowercase_all(&file.stopwords.search).into_iter().collect(),
            question_words: lowercase_all(&file.complexity.question_words),
            conjunction: compile(&file.complexity.conjunction, "complexity.conjunction")?,
            min_clause_length: file.complexity.min_clause_length,
            reformulations,
            rewrite,
        })
    }

    /// First classification rule with a keyword contained in `lowered`
    pub fn classify(&self, lowered: &str) -> Option<QueryType> {
        self.classification
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw.as_str())))
            .map(|rule| rule.query_type)
    }

    /// First listed synonym for a word, if the word is a table key
    pub fn first_synonym(&self, word: &str) -> Option<&str> {
        self.synonyms
            .get(word)
            .and_then(|list| list.first())
            .map(String::as_str)
    }

    pub fn stopwords(&self, set: StopWordSet) -> &HashSet<String> {
        match set {
            StopWordSet::Expansion => &self.expansion_stopwords,
            StopWordSet::Lookup => &self.lookup_stopwords,
            StopWordSet::Search => &self.search_stopwords,
        }
    }

    /// Strip leading and trailing punctuation from a token
    pub fn strip_punctuation<'a>(&self, token: &'a str) -> &'a str {
        token.trim_matches(|c| self.punctuation.contains(&c))
    }

    /// Lower-cased keywords of `query` with the given stop-words removed
    ///
    /// Tokens are split on whitespace and stripped of punctuation; only tokens
    /// longer than two characters are kept.
    pub fn keywords(&self, query: &str, set: StopWordSet) -> Vec<String> {
        let stopwords = self.stopwords(set);
        query
            .to_lowercase()
            .split_whitespace()
            .map(|w| self.strip_punctuation(w))
            .filter(|w| w.chars().count() > 2 && !stopwords.contains(*w))
            .map(str::to_string)
            .collect()
    }

    /// Lower-cased tokens of `query` longer than two characters, minus stop-words
    ///
    /// Unlike [`Lexicon::keywords`], punctuation is kept, so `"Qdrant?"` yields
    /// `"qdrant?"` and only matches text containing it as written.
    pub fn raw_keywords(&self, query: &str, set: StopWordSet) -> Vec<String> {
        let stopwords = self.stopwords(set);
        query
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.chars().count() > 2 && !stopwords.contains(*w))
            .map(str::to_string)
            .collect()
    }

    /// Candidate entity names in a query
    ///
    /// Tokens with trailing punctuation removed that start with an upper-case
    /// character and are longer than two characters; when there are none, the
    /// first three tokens.
    pub fn entity_candidates(&self, query: &str) -> Vec<String> {
        let tokens: Vec<&str> = query
            .split_whitespace()
            .map(|w| w.trim_end_matches(|c| self.punctuation.contains(&c)))
            .filter(|w| !w.is_empty())
            .collect();

        let capitalized: Vec<String> = tokens
            .iter()
            .filter(|w| {
                w.chars().next().is_some_and(char::is_uppercase) && w.chars().count() > 2
            })
            .map(|w| w.to_string())
            .collect();

        if capitalized.is_empty() {
            tokens.into_iter().take(ENTITY_FALLBACK_TOKENS).map(str::to_string).collect()
        } else {
            capitalized
        }
    }

    pub fn question_words(&self) -> &[String] {
        &self.question_words
    }

    pub fn conjunction(&self) -> &Regex {
        &self.conjunction
    }

    pub fn min_clause_length(&self) -> usize {
        self.min_clause_length
    }

    pub fn reformulations(&self) -> &[CompiledReformulation] {
        &self.reformulations
    }

    pub fn rewrite(&self) -> &CompiledRewrite {
        &self.rewrite
    }
}

fn compile(pattern: &str, what: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| RagError::Lexicon(format!("Invalid pattern for {}: {}", what, e)))
}

fn lowercase_all(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}
