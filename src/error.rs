use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Setup-time errors for hybridrag
///
/// Retrieval itself never returns these: store failures are absorbed at the
/// sub-search or agent boundary and reported on the result instead.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every problem found by `ConfigValidator`, not just the first
    #[error("Configuration validation failed: {}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Environment override that could not be parsed for its key
    #[error("Invalid override for {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Lexicon tables failed to parse or a pattern failed to compile
    #[error("Lexicon error: {0}")]
    Lexicon(String),

    /// Corpus fixture is inconsistent (e.g. a dangling relationship)
    #[error("Store error: {0}")]
    Store(String),

    #[error("{context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Cannot serialize TOML: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    #[error("{context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },
}

/// Single failed check on a configuration key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted key, e.g. `retrieval.vector_weight`
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, RagError>;
