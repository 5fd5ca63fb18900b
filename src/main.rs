//! # Mailseek CLI
//!
//! The `mailseek` binary drives the email retrieval-augmented search
//! pipeline: index initialization, Gmail ingestion, search, and the
//! HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! mailseek --config ./config/mailseek.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mailseek init` | Create the SQLite index (idempotent) |
//! | `mailseek fetch` | Pull messages from Gmail; dump to JSON or ingest |
//! | `mailseek add <file>` | Ingest an `emails.json` dump |
//! | `mailseek search "<query>"` | Retrieve similar emails and summarize |
//! | `mailseek serve` | Start the HTTP API |
//!
//! Credentials come from the environment: `GMAIL_ACCESS_TOKEN` for
//! `fetch`, `GROQ_API_KEY` for summaries.

mod config;
mod embedding;
mod error;
mod gmail;
mod llm;
mod models;
mod normalize;
mod pipeline;
mod server;
mod store;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::EmailBatch;
use crate::pipeline::EmailIndex;
use crate::store::{memory::MemoryStore, sqlite::SqliteStore, VectorStore};

/// Mailseek — retrieval-augmented search over your email.
#[derive(Parser)]
#[command(
    name = "mailseek",
    about = "Retrieval-augmented search over your email",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mailseek.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the vector index.
    ///
    /// Creates the SQLite database file and schema. Idempotent — running
    /// it multiple times is safe.
    Init,

    /// Fetch messages from Gmail.
    ///
    /// Reads a bearer token from `GMAIL_ACCESS_TOKEN`, lists and fetches
    /// up to the configured number of messages, and either dumps them to
    /// a JSON file or ingests them directly.
    Fetch {
        /// Maximum number of messages to fetch (overrides config).
        #[arg(long)]
        limit: Option<usize>,

        /// Write fetched messages to this JSON file.
        #[arg(long, default_value = "emails.json")]
        out: PathBuf,

        /// Ingest fetched messages into the index instead of dumping.
        #[arg(long)]
        ingest: bool,
    },

    /// Ingest a JSON dump of emails (`{"emails": [...]}`).
    Add {
        /// Path to the JSON file.
        file: PathBuf,
    },

    /// Retrieve the most similar emails and summarize them.
    Search {
        /// The natural-language query.
        query: String,

        /// Maximum number of emails to retrieve (overrides config).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Start the HTTP API server.
    Serve,
}

async fn build_store(cfg: &Config) -> Result<Arc<dyn VectorStore>> {
    match cfg.store.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sqlite" => {
            let path = cfg
                .store
                .path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("store.path required for sqlite backend"))?;
            Ok(Arc::new(SqliteStore::connect(path).await?))
        }
        other => bail!("Unknown store backend: {}", other),
    }
}

async fn build_index(cfg: &Config) -> Result<EmailIndex> {
    let store = build_store(cfg).await?;
    let llm = llm::create_client(&cfg.llm)?;
    Ok(EmailIndex::new(store, llm, cfg.embedding.clone()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            build_store(&cfg).await?;
            println!("Index initialized successfully.");
        }
        Commands::Fetch { limit, out, ingest } => {
            let token = std::env::var("GMAIL_ACCESS_TOKEN")
                .map_err(|_| anyhow::anyhow!("GMAIL_ACCESS_TOKEN environment variable not set"))?;
            let client = gmail::GmailClient::new(&cfg.gmail, token)?;
            let limit = limit.unwrap_or(cfg.gmail.fetch_limit);
            let emails = client.fetch_emails(limit).await?;

            println!("fetched: {} messages", emails.len());

            let batch = EmailBatch { emails };
            if ingest {
                let index = build_index(&cfg).await?;
                let result = index.add_emails(&batch).await?;
                println!("{}", result.message);
            } else {
                let json = serde_json::to_string_pretty(&batch)?;
                std::fs::write(&out, json)?;
                println!("wrote {}", out.display());
            }
            println!("ok");
        }
        Commands::Add { file } => {
            let content = std::fs::read_to_string(&file)?;
            let batch: EmailBatch = serde_json::from_str(&content)?;

            let index = build_index(&cfg).await?;
            let result = index.add_emails(&batch).await?;
            println!("{}", result.message);
            println!("ok");
        }
        Commands::Search { query, limit } => {
            let index = build_index(&cfg).await?;
            let n_results = limit.unwrap_or(cfg.retrieval.default_n_results);
            let response = index.search(&query, n_results).await?;

            println!("{}", response.summary);
            println!();
            println!("matches: {}", response.matches);
            for source in &response.source_emails {
                println!("  - {} / {} / {}", source.subject, source.date, source.sender);
            }
        }
        Commands::Serve => {
            let index = Arc::new(build_index(&cfg).await?);
            server::run_server(&cfg, index).await?;
        }
    }

    Ok(())
}
