//! Multi-hop graph traversal with vector augmentation

use super::{AgentMetadata, AgentResult, AgentStores};
use crate::config::AgentsConfig;

/// Gathers a wider neighbourhood for "why/how" and linkage questions
///
/// Returns more context than the other agents (up to `context_multiplier × top_k`).
pub struct ReasoningAgent {
    stores: AgentStores,
    max_entities: usize,
    max_hops: usize,
    related_per_entity: usize,
    context_multiplier: usize,
}

impl ReasoningAgent {
    pub const NAME: &'static str = "ReasoningAgent";
    pub const STRATEGY: &'static str = "Multi-hop graph traversal with vector augmentation";
    const CONFIDENCE: f32 = 0.70;

    pub fn new(stores: AgentStores, config: &AgentsConfig) -> Self {
        Self {
            stores,
            max_entities: config.reasoning_max_entities,
            max_hops: config.reasoning_max_hops,
            related_per_entity: config.reasoning_related_per_entity,
            context_multiplier: config.reasoning_context_multiplier,
        }
    }

    pub async fn retrieve(&self, query: &str, top_k: usize) -> AgentResult {
        let mut metadata = AgentMetadata::new("multi_hop_reasoning");

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
        contexts.extend(self.stores.vector_texts(query, top_k, &mut metadata).await);

        contexts.truncate(top_k.saturating_mul(self.context_multiplier));
        AgentResult::finish(contexts, metadata, Self::CONFIDENCE, Self::NAME)
    }
}
