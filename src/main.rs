use gita_rag::cli::{Cli, Commands, ConfigAction};
use gita_rag::config::Config;
use gita_rag::embedding::{EmbeddingProvider, FastEmbedProvider};
use gita_rag::error::{RagError, Result};
use gita_rag::ingest::Ingestor;
use gita_rag::llm::{CompletionProvider, OpenAiCompatibleProvider};
use gita_rag::query::{ConversationLog, QueryEngine};
use std::io::{BufRead, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    // Secrets such as OPENAI_API_KEY may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Ingest { reset, documents } => {
            cmd_ingest(cli.config, reset, documents)?;
        }
        Commands::Query { question, json } => {
            cmd_query(cli.config, &question, json)?;
        }
        Commands::Chat => {
            cmd_chat(cli.config)?;
        }
        Commands::Serve { host, port } => {
            cmd_serve(cli.config, host, port)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "gita_rag=debug" } else { "gita_rag=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_ingest(config_path: Option<PathBuf>, reset: bool, documents: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let documents_dir = match documents {
        Some(dir) => expand_path(&dir)?,
        None => config.corpus.documents_dir.clone(),
    };

    let embedder = embedding_provider(&config)?;
    let report = Ingestor::from_config(&config, embedder).run(
        &documents_dir,
        &config.storage.index_dir,
        reset,
    )?;

    println!("✓ Ingestion complete");
    println!("  Documents: {} ({} chunks)", report.documents, report.chunks);
    println!(
        "  Added: {}  Unchanged: {}  Existing before run: {}",
        report.upsert.added, report.upsert.unchanged, report.upsert.existing
    );
    if report.upsert.drifted > 0 {
        println!(
            "  Changed content: {} ({} re-embedded)",
            report.upsert.drifted, report.upsert.replaced
        );
    }
    println!(
        "  Index: {} entries, {} FAQ, {} sources ({})",
        report.stats.entries, report.stats.faq_entries, report.stats.sources, report.stats.model
    );

    Ok(())
}

fn cmd_query(config_path: Option<PathBuf>, question: &str, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = build_engine(&config)?;
    let runtime = runtime()?;

    let answer = runtime.block_on(engine.answer(question))?;

    if json {
        let output = serde_json::to_string_pretty(&answer).map_err(|e| RagError::Json {
            source: e,
            context: "Failed to serialize answer".to_string(),
        })?;
        println!("{}", output);
    } else {
        println!("Response: {}", answer.answer);
        println!("Sources: {:?}", answer.sources);
    }

    Ok(())
}

fn cmd_chat(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = build_engine(&config)?;
    let runtime = runtime()?;
    let mut log = ConversationLog::new();

    println!("Ask a question about the Gita (:history to review, :quit to exit)");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(|e| RagError::Io {
            source: e,
            context: "Failed to read from stdin".to_string(),
        })?;

        match line.trim() {
            "" => continue,
            ":quit" | ":exit" => break,
            ":history" => {
                if log.is_empty() {
                    println!("(no questions yet)");
                }
                for turn in log.newest_first() {
                    println!("You: {}", turn.question);
                    println!("Bot: {}\n", turn.answer.answer);
                }
            }
            question => match runtime.block_on(engine.answer_in(&mut log, question)) {
                Ok(answer) => println!("{}\n", answer.answer),
                Err(e) => eprintln!("✗ {}", e),
            },
        }
    }

    Ok(())
}

fn cmd_serve(config_path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(config_path)?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let ip: IpAddr = host.parse().map_err(|_| RagError::InvalidConfigValue {
        path: "server.host".to_string(),
        message: format!("'{}' is not an IP address", host),
    })?;

    let engine = Arc::new(build_engine(&config)?);
    runtime()?.block_on(gita_rag::server::serve(engine, SocketAddr::new(ip, port)))
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let output = toml::to_string_pretty(&config)?;
            println!("{}", output);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
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

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| RagError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Load the config file (or defaults) and expand `~` in every path
fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = if path.exists() {
        Config::load(&path)?
    } else {
        tracing::warn!(
            "Config file not found, using defaults. Run 'gita-rag config init' to create one."
        );
        Config::from_env()?
    };

    config.storage.index_dir = expand_path(&config.storage.index_dir)?;
    config.corpus.documents_dir = expand_path(&config.corpus.documents_dir)?;

    Ok(config)
}

fn build_engine(config: &Config) -> Result<QueryEngine> {
    let embedder = embedding_provider(config)?;
    let completion: Arc<dyn CompletionProvider> =
        Arc::new(OpenAiCompatibleProvider::from_config(&config.llm)?);
    QueryEngine::from_config(config, embedder, completion)
}

fn embedding_provider(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(FastEmbedProvider::new(&config.embedding.model)?))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| RagError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| RagError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| RagError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
