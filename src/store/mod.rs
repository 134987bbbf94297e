//! Collaborator seams for the vector and graph stores
//!
//! The retrieval core never talks to a database directly. It asks these traits,
//! and the store implementation owns indexing, persistence, timeouts and retries.
//! Implementations must be safe to share across concurrent requests.

mod memory;

pub use memory::{Corpus, CorpusDocument, CorpusEntity, CorpusRelationship, InMemoryGraphStore, InMemoryVectorStore};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Exact-match field conditions, ANDed together
pub type Filters = BTreeMap<String, Value>;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Store call timed out")]
    Timeout,
}

/// Single similarity hit returned by a vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub text: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl VectorHit {
    /// `source_file` metadata entry, when it is a string
    pub fn source_file(&self) -> Option<&str> {
        self.metadata.get("source_file").and_then(Value::as_str)
    }
}

/// Entity reached by bounded-hop traversal from a named entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl RelatedEntity {
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            confidence: None,
            context: None,
            source_file: None,
        }
    }

    /// `Entity: <name> (Type: <type>)`
    pub fn headline(&self) -> String {
        format!("Entity: {} (Type: {})", self.name, self.entity_type)
    }

    /// Headline followed by a context line when the entity carries one
    pub fn describe(&self) -> String {
        match &self.context {
            Some(context) if !context.is_empty() => {
                format!("{}\nContext: {}", self.headline(), context)
            }
            _ => self.headline(),
        }
    }

    /// Entity fields as a JSON object, for result metadata
    pub fn to_metadata(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Similarity search over a single collection
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: Option<&Filters>,
    ) -> Result<Vec<VectorHit>, StoreError>;
}

/// Bounded-hop traversal over extracted entities
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn find_related_entities(
        &self,
        entity_name: &str,
        max_hops: usize,
    ) -> Result<Vec<RelatedEntity>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_description() {
        let mut entity = RelatedEntity::new("Qdrant", "Technology");
        assert_eq!(entity.describe(), "Entity: Qdrant (Type: Technology)");

        entity.context = Some("Vector database written in Rust".to_string());
        assert_eq!(
            entity.describe(),
            "Entity: Qdrant (Type: Technology)\nContext: Vector database written in Rust"
        );
    }

    #[test]
    fn test_entity_metadata_uses_wire_names() {
        let mut entity = RelatedEntity::new("Neo4j", "Technology");
        entity.confidence = Some(0.9);

        let metadata = entity.to_metadata();
        assert_eq!(metadata.get("type"), Some(&Value::from("Technology")));
        assert!(metadata.contains_key("confidence"));
        assert!(!metadata.contains_key("context"));
    }
}
