//! Entity-focused retrieval for factual questions

use super::{AgentMetadata, AgentResult, AgentStores};
use crate::config::AgentsConfig;

/// Answers "who/what/when/where" questions from the neighbourhood of named entities,
/// topping up with vector hits when the graph is sparse
pub struct FactualAgent {
    stores: AgentStores,
    max_entities: usize,
    max_hops: usize,
    related_per_entity: usize,
}

impl FactualAgent {
    pub const NAME: &'static str = "FactualAgent";
    pub const STRATEGY: &'static str = "Entity-focused retrieval with 1-hop graph traversal";
    const CONFIDENCE: f32 = 0.85;

    pub fn new(stores: AgentStores, config: &AgentsConfig) -> Self {
        Self {
            stores,
            max_entities: config.factual_max_entities,
            max_hops: config.factual_max_hops,
            related_per_entity: config.factual_related_per_entity,
        }
    }

    pub async fn retrieve(&self, query: &str, top_k: usize) -> AgentResult {
        let mut metadata = AgentMetadata::new("entity_focused");

        let mut contexts = self
            .stores
            .entity_contexts(
                query,
                self.max_entities,
                self.max_hops,
                self.related_per_entity,
                &mut metadata,
            )
            .await;

        if contexts.len() < top_k {
            let remainder = top_k - contexts.len();
            contexts.extend(self.stores.vector_texts(query, remainder, &mut metadata).await);
        }

        contexts.truncate(top_k);
        AgentResult::finish(contexts, metadata, Self::CONFIDENCE, Self::NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::*;
    use crate::store::RelatedEntity;

    #[tokio::test]
    async fn test_graph_contexts_topped_up_with_vector_hits() {
        let mut rust = RelatedEntity::new("Rust", "Language");
        rust.context = Some("Qdrant is written in Rust".to_string());

        let (stores, vector, graph) = stores(
            ScriptedVectorStore::new(&["doc one", "doc two", "doc three", "doc four"]),
            ScriptedGraphStore::new(vec![rust]),
        );
        let agent = FactualAgent::new(stores, &AgentsConfig::default());

        let result = agent.retrieve("what is Qdrant?", 3).await;
        assert_eq!(
            result.contexts,
            vec![
                "Entity: Rust (Type: Language)\nContext: Qdrant is written in Rust".to_string(),
                "doc one".to_string(),
                "doc two".to_string(),
            ]
        );
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.agent_name, "FactualAgent");
        assert_eq!(result.metadata.graph_contexts, 1);
        assert_eq!(result.metadata.vector_contexts, 2);

        let calls = graph.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("Qdrant".to_string(), 1)]);
        assert_eq!(*vector.requested.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_graph_fills_top_k_without_vector_call() {
        let (stores, vector, _) = stores(
            ScriptedVectorStore::new(&["unused"]),
            ScriptedGraphStore::new(entities(&["A1x", "B2x", "C3x"])),
        );
        let agent = FactualAgent::new(stores, &AgentsConfig::default());

        let result = agent.retrieve("Neo4j Qdrant", 3).await;
        assert_eq!(result.contexts.len(), 3);
        assert_eq!(result.metadata.graph_contexts, 4);
        assert!(vector.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_entity_is_skipped() {
        let mut graph = ScriptedGraphStore::new(entities(&["Tantivy"]));
        graph.failing_entity = Some("Neo4j".to_string());

        let (stores, _, _) = stores(ScriptedVectorStore::new(&[]), graph);
        let agent = FactualAgent::new(stores, &AgentsConfig::default());

        let result = agent.retrieve("Neo4j versus Qdrant", 5).await;
        assert_eq!(result.contexts, vec!["Entity: Tantivy (Type: Technology)".to_string()]);
        assert_eq!(result.metadata.failed_calls, 1);
    }

    #[tokio::test]
    async fn test_nothing_found_reports_low_confidence() {
        let (stores, _, _) = stores(ScriptedVectorStore::failing(), ScriptedGraphStore::new(vec![]));
        let agent = FactualAgent::new(stores, &AgentsConfig::default());

        let result = agent.retrieve("who wrote this", 5).await;
        assert!(result.is_empty());
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.metadata.failed_calls, 1);
    }
}
