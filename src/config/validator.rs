use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{RagError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_query(config, &mut errors);
        Self::validate_expansion(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_agents(config, &mut errors);
        Self::validate_pipeline(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RagError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_query(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.query.min_length == 0 {
            errors.push(ValidationError::new(
                "query.min_length",
                "Minimum query length must be greater than 0",
            ));
        }

        if config.query.max_length < config.query.min_length {
            errors.push(ValidationError::new(
                "query.max_length",
                format!(
                    "Maximum query length ({}) must not be below minimum ({})",
                    config.query.max_length, config.query.min_length
                ),
            ));
        }
    }

    fn validate_expansion(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.expansion.max_expansions == 0 {
            errors.push(ValidationError::new(
                "expansion.max_expansions",
                "Expansion limit must include at least the original query",
            ));
        }

        if config.expansion.multi_query_count == 0 {
            errors.push(ValidationError::new(
                "expansion.multi_query_count",
                "Multi-query count must be greater than 0",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        let retrieval = &config.retrieval;

        let weights = [
            ("retrieval.vector_weight", retrieval.vector_weight),
            ("retrieval.graph_weight", retrieval.graph_weight),
            ("retrieval.keyword_weight", retrieval.keyword_weight),
        ];

        for (path, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                errors.push(ValidationError::new(
                    path,
                    format!("Weight must be a non-negative number, got {}", weight),
                ));
            }
        }

        if weights.iter().all(|(_, w)| *w == 0.0) {
            errors.push(ValidationError::new(
                "retrieval",
                "At least one retrieval weight must be greater than 0",
            ));
        }

        if retrieval.default_top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.default_top_k",
                "top_k must be greater than 0",
            ));
        }

        if retrieval.dedup_key_chars == 0 {
            errors.push(ValidationError::new(
                "retrieval.dedup_key_chars",
                "Deduplication key length must be greater than 0",
            ));
        }

        if retrieval.graph_max_hops == 0 {
            errors.push(ValidationError::new(
                "retrieval.graph_max_hops",
                "Graph traversal needs at least one hop",
            ));
        }

        let confidence = retrieval.default_entity_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            errors.push(ValidationError::new(
                "retrieval.default_entity_confidence",
                format!("Confidence must be between 0.0 and 1.0, got {}", confidence),
            ));
        }
    }

    fn validate_agents(config: &Config, errors: &mut Vec<ValidationError>) {
        let agents = &config.agents;
        let limits = [
            ("agents.factual_max_entities", agents.factual_max_entities),
            ("agents.factual_max_hops", agents.factual_max_hops),
            (
                "agents.factual_related_per_entity",
                agents.factual_related_per_entity,
            ),
            (
                "agents.lookup_candidate_multiplier",
                agents.lookup_candidate_multiplier,
            ),
            ("agents.reasoning_max_entities", agents.reasoning_max_entities),
            ("agents.reasoning_max_hops", agents.reasoning_max_hops),
            (
                "agents.reasoning_related_per_entity",
                agents.reasoning_related_per_entity,
            ),
            (
                "agents.reasoning_context_multiplier",
                agents.reasoning_context_multiplier,
            ),
        ];

        for (path, value) in limits {
            if value == 0 {
                errors.push(ValidationError::new(path, "Value must be greater than 0"));
            }
        }
    }

    fn validate_pipeline(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.pipeline.top_k == 0 {
            errors.push(ValidationError::new(
                "pipeline.top_k",
                "top_k must be greater than 0",
            ));
        }

        if config.pipeline.multi_query == 0 {
            errors.push(ValidationError::new(
                "pipeline.multi_query",
                "Multi-query count must be at least 1",
            ));
        }

        if let Some(file) = &config.lexicon.file {
            if file.as_os_str().is_empty() {
                errors.push(ValidationError::new(
                    "lexicon.file",
                    "Lexicon file path cannot be empty",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_negative_weight() {
        let mut config = Config::default();
        config.retrieval.keyword_weight = -0.1;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_all_weights_zero() {
        let mut config = Config::default();
        config.retrieval.vector_weight = 0.0;
        config.retrieval.graph_weight = 0.0;
        config.retrieval.keyword_weight = 0.0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_inverted_length_bounds() {
        let mut config = Config::default();
        config.query.min_length = 10;
        config.query.max_length = 5;

        match ConfigValidator::validate(&config) {
            Err(RagError::ConfigValidation { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "query.max_length");
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_lexicon_path() {
        let mut config = Config::default();
        config.lexicon.file = Some(PathBuf::new());
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_zero_agent_limit() {
        let mut config = Config::default();
        config.agents.reasoning_max_hops = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
