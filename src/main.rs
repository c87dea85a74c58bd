//! # citeseek CLI
//!
//! Upload documents and ask questions about them from the terminal.
//!
//! ```bash
//! citeseek init                          # create the database
//! citeseek upload report.pdf             # ingest a document
//! citeseek documents                     # list uploaded documents
//! citeseek ask "What is the budget?"     # ask across all documents
//! citeseek ask "..." --document <id>     # scope to one document
//! citeseek chat --document <id>          # interactive session
//! citeseek serve                         # start the HTTP API
//! ```
//!
//! All commands accept `--config` pointing to a TOML file; defaults are
//! used when the file is absent. Embedding and completion calls require
//! the `OPENAI_API_KEY` environment variable.

use std::io::{BufRead, Write as _};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use citeseek::answer::ask;
use citeseek::completion::{CompletionModel, OpenAiCompletion, SamplingConfig};
use citeseek::config::{self, Config};
use citeseek::embedding::{Embedder, OpenAiEmbedder};
use citeseek::extract::extract_pages;
use citeseek::ingest::ingest;
use citeseek::models::ChatMessage;
use citeseek::server::{run_server, AppState};
use citeseek::store::{SqliteStore, VectorStore};
use citeseek::{db, migrate};

#[derive(Parser)]
#[command(
    name = "citeseek",
    about = "Ask questions about a document and get answers with page-level citations",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when absent.
    #[arg(long, global = true, default_value = "./config/citeseek.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the SQLite database and schema. Idempotent.
    Init,

    /// Upload a document (PDF, .txt, or .md): extract, chunk, embed, store.
    Upload {
        /// Path to the file to ingest.
        file: PathBuf,
    },

    /// Ask a question, answered from stored documents with citations.
    Ask {
        /// The question to answer.
        question: String,

        /// Restrict retrieval to one document by id.
        #[arg(long)]
        document: Option<String>,

        /// Number of chunks to retrieve (defaults to config).
        #[arg(long)]
        top_k: Option<i64>,
    },

    /// Interactive question-answering session.
    Chat {
        /// Restrict retrieval to one document by id.
        #[arg(long)]
        document: Option<String>,
    },

    /// List uploaded documents.
    Documents,

    /// Delete a document and all its chunks.
    Delete {
        /// Document id.
        id: String,
    },

    /// Start the JSON HTTP server.
    Serve,
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
            let pool = db::connect(&cfg.db.path).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Upload { file } => {
            let bytes = std::fs::read(&file)?;
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("document")
                .to_string();
            let pages = extract_pages(&bytes, &filename)?;

            let (store, pool) = open_store(&cfg).await?;
            let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(&cfg.embedding)?);

            let document = ingest(&store, embedder, &cfg.chunking, &filename, &pages).await?;
            pool.close().await;

            println!("uploaded {}", document.filename);
            println!("  id: {}", document.id);
            println!("  pages: {}", document.total_pages);
            println!("  chunks: {}", document.total_chunks);
        }
        Commands::Ask {
            question,
            document,
            top_k,
        } => {
            let (store, pool) = open_store(&cfg).await?;
            let embedder = OpenAiEmbedder::new(&cfg.embedding)?;
            let completion = OpenAiCompletion::new(&cfg.completion)?;

            let result = ask(
                &store,
                &embedder,
                &completion,
                SamplingConfig::from(&cfg.completion),
                &question,
                document.as_deref(),
                top_k.unwrap_or(cfg.retrieval.top_k),
            )
            .await?;
            pool.close().await;

            print_message(&ChatMessage::assistant(result));
        }
        Commands::Chat { document } => {
            let (store, pool) = open_store(&cfg).await?;
            let embedder = OpenAiEmbedder::new(&cfg.embedding)?;
            let completion = OpenAiCompletion::new(&cfg.completion)?;

            run_chat(&cfg, &store, &embedder, &completion, document.as_deref()).await?;
            pool.close().await;
        }
        Commands::Documents => {
            let (store, pool) = open_store(&cfg).await?;
            let documents = store.list_documents().await?;
            pool.close().await;

            if documents.is_empty() {
                println!("No documents.");
            }
            for doc in documents {
                println!(
                    "{}  {}  ({} pages, {} chunks, uploaded {})",
                    doc.id,
                    doc.filename,
                    doc.total_pages,
                    doc.total_chunks,
                    doc.uploaded_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Commands::Delete { id } => {
            let (store, pool) = open_store(&cfg).await?;
            let deleted = store.delete_document(&id).await?;
            pool.close().await;

            if deleted {
                println!("deleted {}", id);
            } else {
                anyhow::bail!("document not found: {}", id);
            }
        }
        Commands::Serve => {
            let (store, _pool) = open_store(&cfg).await?;
            let state = AppState {
                config: Arc::new(cfg.clone()),
                store: Arc::new(store) as Arc<dyn VectorStore>,
                embedder: Arc::new(OpenAiEmbedder::new(&cfg.embedding)?),
                completion: Arc::new(OpenAiCompletion::new(&cfg.completion)?),
            };
            run_server(state).await?;
        }
    }

    Ok(())
}

/// Open the database and run migrations, so every command works on a
/// fresh checkout without an explicit `init`.
async fn open_store(cfg: &Config) -> Result<(SqliteStore, sqlx::SqlitePool)> {
    let pool = db::connect(&cfg.db.path).await?;
    migrate::run_migrations(&pool).await?;
    Ok((SqliteStore::new(pool.clone()), pool))
}

/// Read questions from stdin until EOF, keeping a session-local
/// transcript. Nothing here is persisted.
async fn run_chat(
    cfg: &Config,
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    completion: &dyn CompletionModel,
    document_id: Option<&str>,
) -> Result<()> {
    let stdin = std::io::stdin();
    let mut transcript: Vec<ChatMessage> = Vec::new();

    print!("> ");
    std::io::stdout().flush()?;

    for line in stdin.lock().lines() {
        let question = line?;
        let question = question.trim();
        if question.is_empty() {
            print!("> ");
            std::io::stdout().flush()?;
            continue;
        }

        transcript.push(ChatMessage::user(question));

        let result = ask(
            store,
            embedder,
            completion,
            SamplingConfig::from(&cfg.completion),
            question,
            document_id,
            cfg.retrieval.top_k,
        )
        .await?;

        let message = ChatMessage::assistant(result);
        print_message(&message);
        transcript.push(message);

        print!("> ");
        std::io::stdout().flush()?;
    }

    Ok(())
}

fn print_message(message: &ChatMessage) {
    println!("{}", message.content);
    if let Some(citations) = &message.citations {
        if !citations.is_empty() {
            println!();
            println!("Sources:");
            for citation in citations {
                println!("  [Page {}] {}", citation.page, citation.text);
            }
        }
    }
}
