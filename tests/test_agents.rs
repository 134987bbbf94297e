//! Agent routing over the corpus fixture

use hybridrag::agents::{AgentRouter, AgentStores};
use hybridrag::config::AgentsConfig;
use hybridrag::lexicon::Lexicon;
use hybridrag::query::QueryType;
use hybridrag::store::Corpus;
use std::path::Path;
use std::sync::Arc;

fn router() -> AgentRouter {
    let corpus =
        Corpus::from_file(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/corpus.json"))
            .expect("Failed to load corpus fixture");

    let stores = AgentStores::new(
        Arc::new(corpus.vector_store()),
        Arc::new(corpus.graph_store().unwrap()),
        Arc::new(Lexicon::builtin().unwrap()),
    );
    AgentRouter::new(stores, &AgentsConfig::default())
}

#[tokio::test]
async fn test_factual_one_hop_neighbourhood() {
    let result = router()
        .route("what is Qdrant?", Some(QueryType::Factual), 3)
        .await;

    assert_eq!(result.agent_name, "FactualAgent");
    assert_eq!(result.metadata.strategy, "entity_focused");
    // One hop from Qdrant reaches Rust only
    assert_eq!(result.contexts[0], "Entity: Rust (Type: Language)");
    assert_eq!(result.metadata.graph_contexts, 1);
    assert_eq!(result.contexts.len(), 3);
    assert_eq!(result.confidence, 0.85);
}

#[tokio::test]
async fn test_lookup_filters_on_keywords() {
    let result = router()
        .route("list open source organizations", Some(QueryType::Lookup), 5)
        .await;

    assert_eq!(result.agent_name, "LookupAgent");
    assert!(!result.contexts.is_empty());
    for context in &result.contexts {
        let lowered = context.to_lowercase();
        assert!(["open", "source", "organizations"]
            .iter()
            .any(|kw| lowered.contains(kw)));
    }
}

#[tokio::test]
async fn test_reasoning_includes_context_lines() {
    let result = router()
        .route("how does Rust relate to Mozilla", Some(QueryType::Reasoning), 2)
        .await;

    assert_eq!(result.agent_name, "ReasoningAgent");
    assert!(result.contexts.len() <= 4);
    assert!(result
        .contexts
        .iter()
        .any(|c| c == "Entity: Mozilla (Type: Organization)\nContext: Sponsor of the Rust project"));
}

#[tokio::test]
async fn test_unknown_type_uses_factual_agent() {
    let result = router().route("memory safety", None, 2).await;
    assert_eq!(result.agent_name, "FactualAgent");
    assert_eq!(
        result.contexts,
        vec!["Rust was started at Mozilla and focuses on memory safety.".to_string()]
    );
}
