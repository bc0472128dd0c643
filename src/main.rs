//! Demo CLI exercising the engine end to end. Not the product surface:
//! a real deployment talks to the core through its own protocol
//! frontend; this binary exists alongside the library purely for
//! local development.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use coderag::checks::CodeCheck;
use coderag::config::EngineConfig;
use coderag::embed::Embedder;
use coderag::embed::fallback::FallbackEmbedder;
use coderag::index::index_directory;
use coderag::model::ReasoningModel;
use coderag::model::scripted::ScriptedModel;
use coderag::store::VectorStore;
use coderag::store::sqlite::SqliteStore;

#[derive(Parser)]
#[command(name = "coderag-cli", about = "Local-first code intelligence engine", version)]
struct Cli {
    /// Path to the SQLite database backing the vector store.
    #[arg(long, env = "STORE_URL", default_value = "coderag.db")]
    db_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a directory into the vector store.
    Index {
        /// Directory to index.
        path: PathBuf,
    },
    /// Ask a question about the indexed repository.
    Ask {
        /// The natural-language question.
        question: String,
    },
    /// Show collection statistics.
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env();
    let store: Arc<dyn VectorStore> = match SqliteStore::open(&cli.db_path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("failed to open store: {e}");
            return ExitCode::FAILURE;
        }
    };
    let embedder: Arc<dyn Embedder> = Arc::new(FallbackEmbedder::default());

    match cli.command {
        Commands::Index { path } => {
            let result = index_directory(
                &path,
                &config.collection,
                &std::collections::HashMap::new(),
                &embedder,
                &store,
                coderag::chunk::DEFAULT_MAX_CHUNK_SIZE,
            )
            .await;
            match result {
                Ok(index) => {
                    println!("indexed {} files", index.len());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("index failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Ask { question } => {
            let model: Arc<dyn ReasoningModel> = Arc::new(ScriptedModel::immediate_answer(
                "No live reasoning model is configured; this is a placeholder answer from the demo CLI.",
            ));
            let checks: Vec<Box<dyn CodeCheck>> = Vec::new();
            let result = coderag::dispatch::dispatch(&question, &config, &model, &embedder, &store, &checks).await;
            println!("{}", result.answer);
            println!("confidence: {:.2}", result.verification.overall_confidence);
            ExitCode::SUCCESS
        }
        Commands::Status => match store.stats(&config.collection).await {
            Ok(stats) => {
                println!("collection: {}", config.collection);
                println!("points: {}", stats.points_count);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("status failed: {e}");
                ExitCode::FAILURE
            }
        },
    }
}
