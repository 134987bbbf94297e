//! Query-type based agent selection

use super::{AgentResult, AgentStores, RetrievalAgent};
use crate::config::AgentsConfig;
use crate::query::QueryType;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes each query to the agent registered for its type
///
/// The table is fixed at construction. Unknown or missing types go to the
/// factual agent.
pub struct AgentRouter {
    routes: HashMap<QueryType, Arc<RetrievalAgent>>,
    fallback: Arc<RetrievalAgent>,
}

impl AgentRouter {
    pub fn new(stores: AgentStores, config: &AgentsConfig) -> Self {
        let [factual, lookup, reasoning] = RetrievalAgent::all(&stores, config).map(Arc::new);

        let mut routes = HashMap::new();
        routes.insert(QueryType::Factual, factual.clone());
        routes.insert(QueryType::Lookup, lookup.clone());
        routes.insert(QueryType::Summarization, lookup);
        routes.insert(QueryType::SemanticLinkage, reasoning.clone());
        routes.insert(QueryType::Reasoning, reasoning);

        Self {
            routes,
            fallback: factual,
        }
    }

    /// Agent that would serve `query_type`
    pub fn agent_for(&self, query_type: Option<QueryType>) -> &RetrievalAgent {
        query_type
            .and_then(|t| self.routes.get(&t))
            .unwrap_or(&self.fallback)
    }

    pub async fn route(&self, query: &str, query_type: Option<QueryType>, top_k: usize) -> AgentResult {
        let agent = self.agent_for(query_type);
        tracing::debug!(
            "Routing {} query to {}",
            query_type.map(|t| t.as_str()).unwrap_or("untyped"),
            agent.name()
        );
        agent.retrieve(query, top_k).await
    }
}
