//! In-memory stores backed by a JSON corpus fixture
//!
//! Used by the CLI and the integration tests. The vector store ranks by lexical
//! overlap instead of embeddings; the graph store walks undirected relationships
//! breadth-first.

use crate::error::{RagError, Result};
use crate::store::{Filters, GraphStore, RelatedEntity, StoreError, VectorHit, VectorStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

/// Document chunk as stored in the corpus fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Entity as stored in the corpus fixture
pub type CorpusEntity = RelatedEntity;

/// Relationship between two named entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRelationship {
    pub source: String,
    pub target: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,
}

/// Corpus fixture: document chunks plus an entity graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub documents: Vec<CorpusDocument>,
    #[serde(default)]
    pub entities: Vec<CorpusEntity>,
    #[serde(default)]
    pub relationships: Vec<CorpusRelationship>,
}

impl Corpus {
    /// Load a corpus from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to read corpus file: {:?}", path),
        })?;

        serde_json::from_str(&content).map_err(|e| RagError::Json {
            source: e,
            context: format!("Failed to parse corpus file: {:?}", path),
        })
    }

    pub fn vector_store(&self) -> InMemoryVectorStore {
        InMemoryVectorStore::new(self.documents.clone())
    }

    pub fn graph_store(&self) -> Result<InMemoryGraphStore> {
        InMemoryGraphStore::new(self.entities.clone(), &self.relationships)
    }
}

/// Lexical stand-in for a vector collection
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorStore {
    documents: Vec<IndexedDocument>,
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    document: CorpusDocument,
    tokens: HashSet<String>,
}

impl InMemoryVectorStore {
    pub fn new(documents: Vec<CorpusDocument>) -> Self {
        let documents = documents
            .into_iter()
            .map(|document| IndexedDocument {
                tokens: tokenize(&document.text).into_iter().collect(),
                document,
            })
            .collect();

        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: Option<&Filters>,
    ) -> std::result::Result<Vec<VectorHit>, StoreError> {
        let mut query_tokens = tokenize(query);
        let mut seen = HashSet::new();
        query_tokens.retain(|t| seen.insert(t.clone()));

        if query_tokens.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<VectorHit> = self
            .documents
            .iter()
            .filter(|doc| matches_filters(&doc.document.metadata, filters))
            .filter_map(|doc| {
                let overlap = query_tokens
                    .iter()
                    .filter(|t| doc.tokens.contains(t.as_str()))
                    .count();
                (overlap > 0).then(|| VectorHit {
                    text: doc.document.text.clone(),
                    score: overlap as f32 / query_tokens.len() as f32,
                    metadata: doc.document.metadata.clone(),
                })
            })
            .collect();

        // Stable: equal scores keep corpus order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

/// Undirected entity graph with breadth-first traversal
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStore {
    entities: HashMap<String, RelatedEntity>,
    adjacency: HashMap<String, Vec<String>>,
}

impl InMemoryGraphStore {
    pub fn new(entities: Vec<RelatedEntity>, relationships: &[CorpusRelationship]) -> Result<Self> {
        let entities: HashMap<String, RelatedEntity> = entities
            .into_iter()
            .map(|e| (e.name.to_lowercase(), e))
            .collect();

        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        for rel in relationships {
            let source = rel.source.to_lowercase();
            let target = rel.target.to_lowercase();

            for endpoint in [&source, &target] {
                if !entities.contains_key(endpoint) {
                    return Err(RagError::Store(format!(
                        "Relationship {} -> {} references unknown entity '{}'",
                        rel.source, rel.target, endpoint
                    )));
                }
            }

            adjacency.entry(source.clone()).or_default().push(target.clone());
            adjacency.entry(target).or_default().push(source);
        }

        Ok(Self {
            entities,
            adjacency,
        })
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn find_related_entities(
        &self,
        entity_name: &str,
        max_hops: usize,
    ) -> std::result::Result<Vec<RelatedEntity>, StoreError> {
        let start = entity_name.to_lowercase();
        if !self.entities.contains_key(&start) {
            return Ok(Vec::new());
        }

        let mut visited: HashSet<&str> = HashSet::from([start.as_str()]);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(start.as_str(), 0)]);
        let mut related = Vec::new();

        while let Some((name, distance)) = queue.pop_front() {
            if distance >= max_hops {
                continue;
            }

            for neighbour in self.adjacency.get(name).into_iter().flatten() {
                if visited.insert(neighbour.as_str()) {
                    if let Some(entity) = self.entities.get(neighbour) {
                        related.push(entity.clone());
                    }
                    queue.push_back((neighbour.as_str(), distance + 1));
                }
            }
        }

        Ok(related)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn matches_filters(metadata: &Map<String, Value>, filters: Option<&Filters>) -> bool {
    filters.map_or(true, |filters| {
        filters
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    })
}
