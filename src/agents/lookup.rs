//! Keyword-filtered vector retrieval for lookup and summarization questions

use super::{AgentMetadata, AgentResult, AgentStores};
use crate::config::AgentsConfig;
use crate::lexicon::StopWordSet;

pub struct LookupAgent {
    stores: AgentStores,
    candidate_multiplier: usize,
}

impl LookupAgent {
    pub const NAME: &'static str = "LookupAgent";
    pub const STRATEGY: &'static str = "Keyword-focused vector retrieval with filtering";
    const CONFIDENCE: f32 = 0.75;

    pub fn new(stores: AgentStores, config: &AgentsConfig) -> Self {
        Self {
            stores,
            candidate_multiplier: config.lookup_candidate_multiplier,
        }
    }

    /// Over-fetch vector candidates and keep those mentioning a query keyword
    pub async fn retrieve(&self, query: &str, top_k: usize) -> AgentResult {
        let mut metadata = AgentMetadata::new("keyword_focused");
        let keywords = self.stores.lexicon.keywords(query, StopWordSet::Lookup);

        let candidates = self
            .stores
            .vector_texts(query, top_k.saturating_mul(self.candidate_multiplier), &mut metadata)
            .await;

        let contexts: Vec<String> = candidates
            .into_iter()
            .filter(|text| {
                let lowered = text.to_lowercase();
                keywords.iter().any(|kw| lowered.contains(kw.as_str()))
            })
            .take(top_k)
            .collect();

        AgentResult::finish(contexts, metadata, Self::CONFIDENCE, Self::NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::*;

    #[tokio::test]
    async fn test_keyword_filter_over_doubled_candidates() {
        let (stores, vector, _) = stores(
            ScriptedVectorStore::new(&[
                "Anthropic and other research organizations",
                "Weather report for Tuesday",
                "List of partner organizations",
                "Organizations funding open source",
                "Nonprofit organizations by region",
                "Unrelated text",
            ]),
            ScriptedGraphStore::new(vec![]),
        );
        let agent = LookupAgent::new(stores, &AgentsConfig::default());

        let result = agent.retrieve("find organizations", 3).await;
        assert_eq!(*vector.requested.lock().unwrap(), vec![6]);
        assert_eq!(
            result.contexts,
            vec![
                "Anthropic and other research organizations".to_string(),
                "List of partner organizations".to_string(),
                "Organizations funding open source".to_string(),
            ]
        );
        assert_eq!(result.confidence, 0.75);
        assert_eq!(result.agent_name, "LookupAgent");
    }

    #[tokio::test]
    async fn test_only_stopwords_yields_nothing() {
        let (stores, _, _) = stores(
            ScriptedVectorStore::new(&["something", "anything"]),
            ScriptedGraphStore::new(vec![]),
        );
        let agent = LookupAgent::new(stores, &AgentsConfig::default());

        let result = agent.retrieve("show the list", 5).await;
        assert!(result.is_empty());
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.metadata.vector_contexts, 2);
    }

    #[tokio::test]
    async fn test_vector_failure_is_counted() {
        let (stores, _, _) = stores(ScriptedVectorStore::failing(), ScriptedGraphStore::new(vec![]));
        let agent = LookupAgent::new(stores, &AgentsConfig::default());

        let result = agent.retrieve("list databases", 5).await;
        assert!(result.is_empty());
        assert_eq!(result.metadata.failed_calls, 1);
    }
}
