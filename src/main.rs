//! # Docent CLI
//!
//! The `docent` binary drives the ingestion pipeline and serves the
//! question-answering API for one configured domain assistant.
//!
//! ## Usage
//!
//! ```bash
//! docent --config ./config/docent.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docent ingest` | Read, chunk, embed, and index the configured document |
//! | `docent ask "<question>"` | Answer a single question from the CLI |
//! | `docent serve` | Start the HTTP assistant on `[server].bind` |
//!
//! ## Examples
//!
//! ```bash
//! # Index the career guidance handbook
//! docent ingest --config ./config/career.toml
//!
//! # Preview chunk counts without writing anything
//! docent ingest --dry-run
//!
//! # One-shot question
//! docent ask "What qualifications does a data engineer need?"
//!
//! # Serve the HR assistant
//! docent serve --config ./config/hr.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docent::config;
use docent::embedding::create_embedder;
use docent::generate::create_generator;
use docent::index::open_index;
use docent::ingest;
use docent::query::{DomainProfile, QueryEngine};
use docent::server;

/// Docent — a retrieval-augmented question answering service for
/// fixed-domain document assistants.
#[derive(Parser)]
#[command(
    name = "docent",
    about = "Docent — retrieval-augmented question answering over a source document",
    version,
    long_about = "Docent ingests a source document into a vector index and answers \
    questions by retrieving the most similar chunks and prompting a generative model \
    constrained to that context. The served domain (career or hr) is chosen in the \
    configuration file."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docent.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion pipeline on the configured document.
    ///
    /// Reads the document, chunks it, embeds all chunks in batches, and
    /// replaces the vector index contents in one write. Designed to run
    /// offline, out-of-band from serving.
    Ingest {
        /// Show page and chunk counts without embedding or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Answer a single question and print the result.
    ///
    /// Runs the same pipeline as the HTTP service: validation,
    /// small-talk short-circuit (career domain), retrieval, generation.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Start the HTTP assistant.
    ///
    /// Serves `POST /chat` and `GET /health` on `[server].bind` with
    /// permissive CORS.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run).await?;
        }
        Commands::Ask { question } => {
            let embedder = create_embedder(&cfg.embedding)?;
            let index = open_index(&cfg.index).await?;
            let generator = create_generator(&cfg.generation)?;
            let profile = DomainProfile::resolve(
                &cfg.domain.profile,
                cfg.domain.validation_message.as_deref(),
                cfg.domain.no_match_message.as_deref(),
            )?;

            let engine = QueryEngine::new(
                embedder,
                index,
                generator,
                profile,
                cfg.retrieval.top_k,
                cfg.retrieval.min_score,
            );

            println!("{}", engine.answer(&question).await);
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
