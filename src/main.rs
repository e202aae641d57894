use anyhow::Result;
use clap::{Parser, Subcommand};
use ragtag::{
    chat, config, embedding,
    index::VectorIndexService,
    ingest::{IngestService, default_loader},
    logging,
    metrics::PipelineMetrics,
    query::QueryEngine,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ragtag", about = "Local RAG pipeline over Qdrant and Ollama")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index every supported document under the docs directory.
    Ingest {
        /// Directory to scan; defaults to the configured docs dir.
        #[arg(long)]
        docs_dir: Option<PathBuf>,
    },
    /// Clear the collection and ingest the docs directory from scratch.
    Reingest {
        /// Directory to scan; defaults to the configured docs dir.
        #[arg(long)]
        docs_dir: Option<PathBuf>,
    },
    /// Ask a question through the full grounded pipeline (filters + routing + RAG).
    Ask {
        /// Question text; may start with directives like [type:pdf] or /phi.
        question: Vec<String>,
    },
    /// Ask a question through the classifier-driven path (small talk and code
    /// questions skip retrieval).
    Smart {
        /// Question text; may start with doc:/rag:/code: to force a category.
        question: Vec<String>,
    },
    /// Count the chunks currently stored in the collection.
    Count,
    /// Drop and recreate the collection, leaving it empty.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    logging::init_tracing();

    let cli = Cli::parse();
    let settings = config::get_config();

    let metrics = Arc::new(PipelineMetrics::new());
    let embedding_client = embedding::get_embedding_client();
    let index = Arc::new(VectorIndexService::new()?);
    let ingest = IngestService::new(
        embedding_client.clone(),
        index.clone(),
        default_loader(),
        metrics.clone(),
    );

    match cli.command {
        Command::Ingest { docs_dir } => {
            let dir = docs_dir.unwrap_or_else(|| PathBuf::from(&settings.docs_dir));
            let report = ingest.ingest_directory(&dir).await?;
            println!(
                "Ingesta completada: {} archivo(s), {} chunk(s), {} omitido(s).",
                report.files_indexed, report.chunks_indexed, report.files_skipped
            );
        }
        Command::Reingest { docs_dir } => {
            let dir = docs_dir.unwrap_or_else(|| PathBuf::from(&settings.docs_dir));
            let report = ingest.reingest(&dir).await?;
            println!(
                "Re-ingesta completada: {} archivo(s), {} chunk(s), {} omitido(s).",
                report.files_indexed, report.chunks_indexed, report.files_skipped
            );
        }
        Command::Ask { question } => {
            let engine = QueryEngine::new(embedding_client, index, chat::get_chat_client(), metrics);
            let answer = engine.answer(&question.join(" ")).await?;
            println!("[Modelo usado: {}]\n", answer.model);
            println!("{}\n", answer.text);
            print_sources(&answer.sources);
        }
        Command::Smart { question } => {
            let engine = QueryEngine::new(embedding_client, index, chat::get_chat_client(), metrics);
            let answer = engine.smart_answer(&question.join(" ")).await?;
            println!("[Modelo usado: {}]\n", answer.model);
            println!("{}\n", answer.text);
            print_sources(&answer.sources);
        }
        Command::Count => {
            let total = ingest.count().await?;
            println!("Total de chunks en la colección: {total}");
        }
        Command::Clear => {
            ingest.clear().await?;
            println!("Colección vaciada y recreada.");
        }
    }

    Ok(())
}

fn print_sources(sources: &[String]) {
    if sources.is_empty() {
        println!("Fuentes usadas: (sin contexto de documentos, solo conocimiento del modelo)");
    } else {
        println!("Fuentes usadas:");
        for source in sources {
            println!(" - {source}");
        }
    }
}
