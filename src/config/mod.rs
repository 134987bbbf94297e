//! Configuration management for hybridrag
//!
//! Loads the TOML configuration, applies environment and profile overrides, and
//! validates the result before any retrieval component is built from it.

use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

mod validator;

pub use validator::ConfigValidator;

/// Environment variable prefix for overrides (`HYBRIDRAG_SECTION__KEY=value`)
pub const ENV_PREFIX: &str = "HYBRIDRAG_";

/// Schema version written by `Config::default` and accepted by the validator
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub query: QueryConfig,
    pub expansion: ExpansionConfig,
    pub retrieval: RetrievalConfig,
    pub agents: AgentsConfig,
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Query validation bounds, in characters after trimming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub min_length: usize,
    pub max_length: usize,
}

/// Query expansion limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    /// Upper bound on `expand` output, original included
    pub max_expansions: usize,
    /// Default number of variants produced by the multi-query generator
    pub multi_query_count: usize,
}

/// Hybrid search weights and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub default_top_k: usize,
    pub vector_weight: f32,
    pub graph_weight: f32,
    pub keyword_weight: f32,
    pub graph_max_hops: usize,
    pub graph_max_entities: usize,
    /// Confidence assumed for graph entities that carry none
    pub default_entity_confidence: f32,
    /// Number of leading content characters used as the deduplication key
    pub dedup_key_chars: usize,
    /// Per-search deadline in milliseconds (0 disables it)
    #[serde(default)]
    pub timeout_ms: u64,
}

/// Per-agent traversal limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    pub factual_max_entities: usize,
    pub factual_max_hops: usize,
    pub factual_related_per_entity: usize,
    pub lookup_candidate_multiplier: usize,
    pub reasoning_max_entities: usize,
    pub reasoning_max_hops: usize,
    pub reasoning_related_per_entity: usize,
    pub reasoning_context_multiplier: usize,
}

/// How the pipeline turns a validated query into contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Flat vector + graph + keyword fusion
    Hybrid,
    /// Query-type routed agents
    Routed,
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalMode::Hybrid => write!(f, "hybrid"),
            RetrievalMode::Routed => write!(f, "routed"),
        }
    }
}

impl FromStr for RetrievalMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hybrid" => Ok(RetrievalMode::Hybrid),
            "routed" => Ok(RetrievalMode::Routed),
            other => Err(format!(
                "Mode must be 'hybrid' or 'routed', got '{}'",
                other
            )),
        }
    }
}

/// Pipeline orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub mode: RetrievalMode,
    pub top_k: usize,
    /// Number of query variants searched and fused (1 disables multi-query)
    pub multi_query: usize,
    /// Rewrite the query for its type before retrieval
    pub rewrite: bool,
}

/// Optional lexicon override file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RetrievalMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RagError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| RagError::Config(format!("Profile not found: {}", profile)))?;

        if let Some(weight) = overrides.vector_weight {
            self.retrieval.vector_weight = weight;
        }
        if let Some(weight) = overrides.graph_weight {
            self.retrieval.graph_weight = weight;
        }
        if let Some(weight) = overrides.keyword_weight {
            self.retrieval.keyword_weight = weight;
        }
        if let Some(mode) = overrides.mode {
            self.pipeline.mode = mode;
        }
        if let Some(top_k) = overrides.top_k {
            self.pipeline.top_k = top_k;
        }

        tracing::debug!("Applied profile '{}'", profile);
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: HYBRIDRAG_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Apply `HYBRIDRAG_*` overrides from an arbitrary key/value source
    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "RETRIEVAL__VECTOR_WEIGHT" => self.retrieval.vector_weight = parse_value(path, value)?,
            "RETRIEVAL__GRAPH_WEIGHT" => self.retrieval.graph_weight = parse_value(path, value)?,
            "RETRIEVAL__KEYWORD_WEIGHT" => {
                self.retrieval.keyword_weight = parse_value(path, value)?
            }
            "RETRIEVAL__DEFAULT_TOP_K" => self.retrieval.default_top_k = parse_value(path, value)?,
            "RETRIEVAL__TIMEOUT_MS" => self.retrieval.timeout_ms = parse_value(path, value)?,
            "PIPELINE__MODE" => self.pipeline.mode = parse_value(path, value)?,
            "PIPELINE__TOP_K" => self.pipeline.top_k = parse_value(path, value)?,
            "PIPELINE__MULTI_QUERY" => self.pipeline.multi_query = parse_value(path, value)?,
            "PIPELINE__REWRITE" => self.pipeline.rewrite = parse_value(path, value)?,
            "LEXICON__FILE" => self.lexicon.file = Some(PathBuf::from(value)),
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RagError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("hybridrag").join("config.toml"))
    }
}

fn parse_value<T>(path: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| RagError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}': {}", value, e),
        })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            query: QueryConfig {
                min_length: 3,
                max_length: 500,
            },
            expansion: ExpansionConfig {
                max_expansions: 3,
                multi_query_count: 3,
            },
            retrieval: RetrievalConfig::default(),
            agents: AgentsConfig::default(),
            pipeline: PipelineConfig {
                mode: RetrievalMode::Hybrid,
                top_k: 5,
                multi_query: 1,
                rewrite: false,
            },
            lexicon: LexiconConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 10,
            vector_weight: 0.5,
            graph_weight: 0.3,
            keyword_weight: 0.2,
            graph_max_hops: 2,
            graph_max_entities: 3,
            default_entity_confidence: 0.7,
            dedup_key_chars: 100,
            timeout_ms: 0,
        }
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            factual_max_entities: 3,
            factual_max_hops: 1,
            factual_related_per_entity: 2,
            lookup_candidate_multiplier: 2,
            reasoning_max_entities: 2,
            reasoning_max_hops: 2,
            reasoning_related_per_entity: 3,
            reasoning_context_multiplier: 2,
        }
    }
}
