use anyhow::{Context, Result};
use hybridrag::agents::{AgentRouter, AgentStores};
use hybridrag::cli::{Cli, Commands, ConfigAction};
use hybridrag::config::{Config, ConfigValidator, RetrievalMode};
use hybridrag::lexicon::Lexicon;
use hybridrag::pipeline::QueryPipeline;
use hybridrag::query::{MultiQueryGenerator, QueryExpander, QueryProcessor, QueryType};
use hybridrag::retrieval::{HybridSearchEngine, SearchRequest};
use hybridrag::store::{Corpus, Filters, GraphStore, VectorStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Classify { query, json } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_classify(&config, &query, json)?;
        }
        Commands::Expand { query, json } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_expand(&config, &query, json)?;
        }
        Commands::Rewrite {
            query,
            query_type,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_rewrite(&config, &query, query_type, json)?;
        }
        Commands::Multi { query, count, json } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_multi(&config, &query, count, json)?;
        }
        Commands::Search {
            query,
            corpus,
            top_k,
            no_vector,
            no_graph,
            no_keyword,
            filters,
            timeout_ms,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            let request = SearchRequest::new(query, top_k.unwrap_or(config.retrieval.default_top_k))
                .with_vector(!no_vector)
                .with_graph(!no_graph)
                .with_keyword(!no_keyword)
                .with_filters(build_filters(filters));
            cmd_search(&config, &corpus, request, timeout_ms, json).await?;
        }
        Commands::Route {
            query,
            corpus,
            query_type,
            top_k,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_route(&config, &corpus, &query, query_type, top_k, json).await?;
        }
        Commands::Ask {
            question,
            corpus,
            mode,
            top_k,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_ask(config, &corpus, &question, mode, top_k, json).await?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if verbose {
        "hybridrag=debug"
    } else {
        "hybridrag=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_classify(config: &Config, query: &str, json: bool) -> Result<()> {
    let processor = QueryProcessor::new(load_lexicon(config)?, &config.query);
    let processed = processor.process(query);

    if json {
        return print_json(&processed);
    }

    match &processed.validation_error {
        Some(error) => println!("✗ Invalid query: {}", error),
        None => {
            println!("Query: {}", processed.processed_query);
            println!("Type:  {}", processed.query_type);
        }
    }
    Ok(())
}

fn cmd_expand(config: &Config, query: &str, json: bool) -> Result<()> {
    let expander = QueryExpander::new(load_lexicon(config)?, config.expansion.max_expansions);
    let expansions = expander.expand(query);

    if json {
        return print_json(&expansions);
    }

    for (i, expansion) in expansions.iter().enumerate() {
        println!("{}. {}", i + 1, expansion);
    }
    Ok(())
}

fn cmd_rewrite(config: &Config, query: &str, query_type: Option<QueryType>, json: bool) -> Result<()> {
    let lexicon = load_lexicon(config)?;

    let query_type = match query_type {
        Some(query_type) => Some(query_type),
        None => {
            let processed = QueryProcessor::new(lexicon.clone(), &config.query).process(query);
            processed.is_valid.then_some(processed.query_type)
        }
    };

    let rewritten = QueryExpander::new(lexicon, config.expansion.max_expansions).rewrite(query, query_type);

    if json {
        return print_json(&serde_json::json!({
            "query": query,
            "query_type": query_type,
            "rewritten_query": rewritten,
        }));
    }

    println!("{}", rewritten);
    Ok(())
}

fn cmd_multi(config: &Config, query: &str, count: Option<usize>, json: bool) -> Result<()> {
    let lexicon = load_lexicon(config)?;
    let expander = QueryExpander::new(lexicon.clone(), config.expansion.max_expansions);
    let generator = MultiQueryGenerator::new(lexicon, expander);

    let queries =
        generator.generate_multi_queries(query, count.unwrap_or(config.expansion.multi_query_count));

    if json {
        return print_json(&queries);
    }

    for (i, q) in queries.iter().enumerate() {
        println!("{}. {}", i + 1, q);
    }
    Ok(())
}

async fn cmd_search(
    config: &Config,
    corpus: &Path,
    request: SearchRequest,
    timeout_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let (vector, graph) = load_stores(corpus)?;
    let engine = HybridSearchEngine::new(vector, graph, load_lexicon(config)?, &config.retrieval)
        .context("Failed to build hybrid search engine")?;

    let result = match timeout_ms {
        Some(ms) => {
            let deadline = tokio::time::Instant::now() + Duration::from_millis(ms);
            engine.search_with_deadline(&request, deadline).await
        }
        None => engine.search(&request).await,
    };

    if json {
        return print_json(&result);
    }

    if result.is_empty() {
        println!("No results found");
    }
    for (i, r) in result.results.iter().enumerate() {
        println!(
            "{}. [{:.3}] ({}, {}) {}",
            i + 1,
            r.score,
            r.retrieval_method,
            r.source,
            r.preview(120)
        );
    }
    println!();
    println!(
        "vector={} graph={} keyword={} in {:.1}ms",
        result.vector_results, result.graph_results, result.keyword_results, result.retrieval_time_ms
    );
    for failure in &result.failures {
        println!("⚠ {} search failed: {}", failure.method, failure.reason);
    }
    Ok(())
}

async fn cmd_route(
    config: &Config,
    corpus: &Path,
    query: &str,
    query_type: Option<QueryType>,
    top_k: usize,
    json: bool,
) -> Result<()> {
    let lexicon = load_lexicon(config)?;
    let (vector, graph) = load_stores(corpus)?;

    let query_type = match query_type {
        Some(query_type) => Some(query_type),
        None => {
            let processed = QueryProcessor::new(lexicon.clone(), &config.query).process(query);
            processed.is_valid.then_some(processed.query_type)
        }
    };

    let router = AgentRouter::new(AgentStores::new(vector, graph, lexicon), &config.agents);
    let result = router.route(query, query_type, top_k).await;

    if json {
        return print_json(&result);
    }

    println!(
        "Agent: {} ({}, confidence {:.2})",
        result.agent_name,
        router.agent_for(query_type).strategy(),
        result.confidence
    );
    for (i, context) in result.contexts.iter().enumerate() {
        println!("{}. {}", i + 1, context);
    }
    Ok(())
}

async fn cmd_ask(
    mut config: Config,
    corpus: &Path,
    question: &str,
    mode: Option<RetrievalMode>,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    if let Some(mode) = mode {
        config.pipeline.mode = mode;
    }
    if let Some(top_k) = top_k {
        config.pipeline.top_k = top_k;
    }
    ConfigValidator::validate(&config)?;

    let (vector, graph) = load_stores(corpus)?;
    let pipeline = QueryPipeline::from_config(&config, vector, graph)?;
    let outcome = pipeline.retrieve(question).await;

    if json {
        return print_json(&outcome);
    }

    if let Some(message) = outcome.message() {
        println!("{}", message);
        return Ok(());
    }

    println!(
        "Type: {}  Mode: {}  Confidence: {:.2}",
        outcome.processed.query_type, outcome.mode, outcome.confidence
    );
    for (i, context) in outcome.contexts.iter().enumerate() {
        println!("\n{}. [{:.3}] {}", i + 1, context.score, context.source);
        println!("{}", context.content);
    }
    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, profile: Option<String>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { json } => {
            let config = load_config(config_path, profile)?;
            if json {
                return print_json(&config);
            }
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)
                .with_context(|| format!("Configuration at {} is invalid", path.display()))?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
        ConfigAction::Path => {
            println!("{}", Config::default_path()?.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::debug!(
            "Config file not found, using defaults. Run 'hybridrag config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        if let Some(profile) = profile {
            config.apply_profile(&profile)?;
        }
        ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    let config = match profile {
        Some(profile) => Config::load_with_profile(&path, &profile)
            .with_context(|| format!("Failed to apply profile '{}'", profile))?,
        None => Config::load(&path)?,
    };
    Ok(config)
}

fn load_lexicon(config: &Config) -> Result<Arc<Lexicon>> {
    let lexicon = match &config.lexicon.file {
        Some(path) => Lexicon::from_file(path)?,
        None => Lexicon::builtin()?,
    };
    Ok(Arc::new(lexicon))
}

fn load_stores(corpus: &Path) -> Result<(Arc<dyn VectorStore>, Arc<dyn GraphStore>)> {
    let corpus = Corpus::from_file(corpus)
        .with_context(|| format!("Failed to load corpus {:?}", corpus))?;
    tracing::debug!(
        "Loaded corpus: {} documents, {} entities, {} relationships",
        corpus.documents.len(),
        corpus.entities.len(),
        corpus.relationships.len()
    );

    let graph = corpus.graph_store().context("Corpus graph is inconsistent")?;
    Ok((Arc::new(corpus.vector_store()), Arc::new(graph)))
}

/// Filter values are parsed as JSON when possible (numbers, booleans), else kept as strings
fn build_filters(pairs: Vec<(String, String)>) -> Filters {
    pairs
        .into_iter()
        .map(|(key, raw)| {
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            (key, value)
        })
        .collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
