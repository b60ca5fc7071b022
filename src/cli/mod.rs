//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gita-rag",
    version,
    author = "neur0map",
    about = "Question answering over the Bhagavad Gita with retrieval-augmented generation",
    long_about = "gita-rag indexes the Gita and a curated FAQ into a local vector index, then answers \
                  questions either straight from the FAQ or by grounding a language model in the most \
                  relevant passages."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/gita-rag/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build or update the index from the documents directory and the FAQ
    Ingest {
        /// Delete the existing index before ingesting
        #[arg(long)]
        reset: bool,

        /// Documents directory (defaults to corpus.documents_dir)
        #[arg(short, long, value_name = "DIR")]
        documents: Option<PathBuf>,
    },

    /// Answer a single question
    Query {
        /// Question text
        question: String,

        /// Print the answer, sources and route as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask questions interactively; `:history` shows past turns, `:quit` exits
    Chat,

    /// Serve the HTTP query API
    Serve {
        /// Bind address (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
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
    Show,

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
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
