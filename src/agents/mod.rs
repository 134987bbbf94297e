//! Strategy-specific retrieval agents
//!
//! Each agent turns a query into an ordered list of context strings using its own
//! mix of graph traversal and vector search. Agents never fail: collaborator
//! errors are logged, counted in the result metadata and skipped.

mod factual;
mod lookup;
mod reasoning;
mod router;

pub use factual::FactualAgent;
pub use lookup::LookupAgent;
pub use reasoning::ReasoningAgent;
pub use router::AgentRouter;

use crate::config::AgentsConfig;
use crate::lexicon::Lexicon;
use crate::store::{GraphStore, RelatedEntity, VectorStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Confidence reported by any agent that produced no contexts
pub const EMPTY_CONFIDENCE: f32 = 0.3;

/// Strategy bookkeeping attached to every agent result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Short strategy tag (`entity_focused`, `keyword_focused`, `multi_hop_reasoning`)
    pub strategy: String,
    /// Contexts contributed by graph traversal, before truncation
    pub graph_contexts: usize,
    /// Contexts contributed by vector search, before truncation
    pub vector_contexts: usize,
    /// Collaborator calls that returned an error
    pub failed_calls: usize,
}

impl AgentMetadata {
    fn new(strategy: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            ..Default::default()
        }
    }
}

/// Output of one agent invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub contexts: Vec<String>,
    pub metadata: AgentMetadata,
    pub confidence: f32,
    pub agent_name: String,
}

impl AgentResult {
    fn finish(
        contexts: Vec<String>,
        metadata: AgentMetadata,
        confidence: f32,
        agent_name: &str,
    ) -> Self {
        let confidence = if contexts.is_empty() {
            EMPTY_CONFIDENCE
        } else {
            confidence
        };

        Self {
            contexts,
            metadata,
            confidence,
            agent_name: agent_name.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Collaborators shared by every agent
#[derive(Clone)]
pub struct AgentStores {
    pub vector: Arc<dyn VectorStore>,
    pub graph: Arc<dyn GraphStore>,
    pub lexicon: Arc<Lexicon>,
}

impl AgentStores {
    pub fn new(
        vector: Arc<dyn VectorStore>,
        graph: Arc<dyn GraphStore>,
        lexicon: Arc<Lexicon>,
    ) -> Self {
        Self {
            vector,
            graph,
            lexicon,
        }
    }

    /// Describe up to `per_entity` related entities for each of the first
    /// `max_entities` entity candidates in `query`
    ///
    /// A failing entity is logged, counted and skipped.
    async fn entity_contexts(
        &self,
        query: &str,
        max_entities: usize,
        max_hops: usize,
        per_entity: usize,
        metadata: &mut AgentMetadata,
    ) -> Vec<String> {
        let mut contexts = Vec::new();

        for entity in self
            .lexicon
            .entity_candidates(query)
            .into_iter()
            .take(max_entities)
        {
            match self.graph.find_related_entities(&entity, max_hops).await {
                Ok(related) => {
                    contexts.extend(related.iter().take(per_entity).map(RelatedEntity::describe));
                }
                Err(e) => {
                    tracing::warn!("Graph lookup failed for entity '{}': {}", entity, e);
                    metadata.failed_calls += 1;
                }
            }
        }

        metadata.graph_contexts += contexts.len();
        contexts
    }

    /// Texts of up to `top_k` vector hits; empty on failure
    async fn vector_texts(&self, query: &str, top_k: usize, metadata: &mut AgentMetadata) -> Vec<String> {
        if top_k == 0 {
            return Vec::new();
        }

        match self.vector.search(query, top_k, None).await {
            Ok(hits) => {
                let texts: Vec<String> = hits.into_iter().map(|hit| hit.text).collect();
                metadata.vector_contexts += texts.len();
                texts
            }
            Err(e) => {
                tracing::warn!("Vector search failed: {}", e);
                metadata.failed_calls += 1;
                Vec::new()
            }
        }
    }
}

/// Retrieval agent, one variant per strategy
pub enum RetrievalAgent {
    Factual(FactualAgent),
    Lookup(LookupAgent),
    Reasoning(ReasoningAgent),
}

impl RetrievalAgent {
    /// Build all three agents over the same collaborators
    pub fn all(stores: &AgentStores, config: &AgentsConfig) -> [RetrievalAgent; 3] {
        [
            RetrievalAgent::Factual(FactualAgent::new(stores.clone(), config)),
            RetrievalAgent::Lookup(LookupAgent::new(stores.clone(), config)),
            RetrievalAgent::Reasoning(ReasoningAgent::new(stores.clone(), config)),
        ]
    }

    pub async fn retrieve(&self, query: &str, top_k: usize) -> AgentResult {
        let result = match self {
            RetrievalAgent::Factual(agent) => agent.retrieve(query, top_k).await,
            RetrievalAgent::Lookup(agent) => agent.retrieve(query, top_k).await,
            RetrievalAgent::Reasoning(agent) => agent.retrieve(query, top_k).await,
        };

        tracing::debug!(
            "{} returned {} contexts (graph={}, vector={}, failed_calls={})",
            result.agent_name,
            result.contexts.len(),
            result.metadata.graph_contexts,
            result.metadata.vector_contexts,
            result.metadata.failed_calls
        );

        result
    }

    pub fn name(&self) -> &'static str {
        match self {
            RetrievalAgent::Factual(_) => FactualAgent::NAME,
            RetrievalAgent::Lookup(_) => LookupAgent::NAME,
            RetrievalAgent::Reasoning(_) => ReasoningAgent::NAME,
        }
    }

    /// Human-readable description of the retrieval strategy
    pub fn strategy(&self) -> &'static str {
        match self {
            RetrievalAgent::Factual(_) => FactualAgent::STRATEGY,
            RetrievalAgent::Lookup(_) => LookupAgent::STRATEGY,
            RetrievalAgent::Reasoning(_) => ReasoningAgent::STRATEGY,
        }
    }
}

impl fmt::Debug for RetrievalAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RetrievalAgent").field(&self.name()).finish()
    }
}
