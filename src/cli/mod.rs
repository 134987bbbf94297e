//! CLI command definitions and parsing
use crate::config::RetrievalMode;
use crate::query::QueryType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hybridrag",
    version,
    author = "neur0map",
    about = "Query understanding and hybrid retrieval fusion",
    long_about = "hybridrag validates and classifies natural-language questions, expands and rewrites them, \
                  and retrieves ranked context by fusing vector similarity, entity-graph traversal and \
                  keyword matching over an ingested corpus."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/hybridrag/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate and classify a question
    Classify {
        query: String,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Expand a question into search variants
    Expand {
        query: String,

        #[arg(long)]
        json: bool,
    },

    /// Rewrite a question for its query type
    Rewrite {
        query: String,

        /// Query type to rewrite for (defaults to the classified type)
        #[arg(short = 't', long = "type", value_parser = clap::value_parser!(QueryType))]
        query_type: Option<QueryType>,

        #[arg(long)]
        json: bool,
    },

    /// Generate multiple query variants, decomposing compound questions
    Multi {
        query: String,

        /// Number of variants (defaults to expansion.multi_query_count)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Run a hybrid search against a corpus
    Search {
        query: String,

        /// JSON corpus fixture with documents, entities and relationships
        #[arg(long, value_name = "FILE")]
        corpus: PathBuf,

        /// Maximum number of results (defaults to retrieval.default_top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Disable vector search
        #[arg(long)]
        no_vector: bool,

        /// Disable graph search
        #[arg(long)]
        no_graph: bool,

        /// Disable keyword search
        #[arg(long)]
        no_keyword: bool,

        /// Exact-match metadata filter (repeatable)
        #[arg(short, long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Deadline for the whole search in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        #[arg(long)]
        json: bool,
    },

    /// Route a question to a retrieval agent
    Route {
        query: String,

        #[arg(long, value_name = "FILE")]
        corpus: PathBuf,

        /// Query type (defaults to the classified type)
        #[arg(short = 't', long = "type", value_parser = clap::value_parser!(QueryType))]
        query_type: Option<QueryType>,

        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,

        #[arg(long)]
        json: bool,
    },

    /// Run the full retrieval pipeline for a question
    Ask {
        question: String,

        #[arg(long, value_name = "FILE")]
        corpus: PathBuf,

        /// Retrieval mode (defaults to pipeline.mode)
        #[arg(short, long, value_parser = clap::value_parser!(RetrievalMode))]
        mode: Option<RetrievalMode>,

        /// Number of contexts (defaults to pipeline.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Parse a `KEY=VALUE` filter argument
fn parse_filter(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", arg)),
    }
}
