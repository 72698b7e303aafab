use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use lectern::agent::{Assistant, DecisionEngine};
use lectern::config::Config;
use lectern::embeddings::create_embedder;
use lectern::index::InMemoryIndex;
use lectern::providers::create_provider;
use lectern::retrieval::{corpus::load_corpus, CourseCatalog, RetrievalBackend};
use lectern::sessions::InMemorySessionStore;
use lectern::tools::default_tools;

/// Lectern - ask questions about a corpus of course materials.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version)]
#[command(about = "Course-material Q&A assistant with semantic retrieval.", long_about = None)]
struct Cli {
    /// Config directory (default: ~/.lectern)
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config file
    Init,

    /// Answer a single question
    #[command(long_about = "\
Answer a single question against the loaded corpus.

Examples:
  lectern ask -c corpus.json -m \"What does lesson 2 of 'Intro to MCP' cover?\"
  lectern ask -c corpus.json -m \"follow-up question\" --session <id>")]
    Ask {
        /// The question to answer
        #[arg(short, long)]
        message: String,

        /// Corpus file (JSON, pre-chunked course content)
        #[arg(short, long)]
        corpus: PathBuf,

        /// Continue an existing session
        #[arg(long)]
        session: Option<String>,
    },

    /// Interactive question loop sharing one session
    Chat {
        /// Corpus file (JSON, pre-chunked course content)
        #[arg(short, long)]
        corpus: PathBuf,
    },
}

async fn build_assistant(config: &Config, corpus_path: &PathBuf) -> Result<Assistant> {
    let provider = create_provider(config)?;
    let embedder = create_embedder(config)?;

    let index = Arc::new(InMemoryIndex::new());
    let records = load_corpus(corpus_path, embedder.as_ref(), &index).await?;
    let catalog = CourseCatalog::build(embedder.as_ref(), records).await?;
    info!(courses = catalog.len(), chunks = index.len(), "corpus ready");

    let backend = RetrievalBackend::new(embedder, index, catalog)
        .with_default_limit(config.search.max_results)
        .with_min_similarity(config.search.min_similarity);

    let model = config
        .model
        .clone()
        .context("no model configured; set `model` in config.toml")?;
    let engine = DecisionEngine::new(provider, model)
        .with_limits(config.agent.temperature, config.agent.max_tokens);

    let registry = default_tools(Arc::new(backend));
    let sessions = Arc::new(InMemorySessionStore::new(config.session.max_history));
    Ok(Assistant::new(engine, registry, sessions))
}

fn print_outcome(outcome: &lectern::agent::QueryOutcome) {
    println!("{}", outcome.answer);
    if !outcome.sources.is_empty() {
        println!("\nSources:");
        for source in &outcome.sources {
            println!("  - {source}");
        }
    }
}

async fn run_chat(assistant: &Assistant) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session_id: Option<String> = None;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "exit" || query == "quit" {
            break;
        }

        match assistant.answer(query, session_id.as_deref()).await {
            Ok(outcome) => {
                session_id = Some(outcome.session_id.clone());
                print_outcome(&outcome);
            }
            Err(err) => eprintln!("error: {err:#}"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lectern=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let dir = Config::resolve_dir(cli.config_dir.as_deref())?;
            let config = Config::init_at(&dir)?;
            println!("Wrote {}", config.config_path.display());
        }
        Commands::Ask {
            message,
            corpus,
            session,
        } => {
            let config = Config::load(cli.config_dir.as_deref())?;
            let assistant = build_assistant(&config, &corpus).await?;
            let outcome = assistant.answer(&message, session.as_deref()).await?;
            print_outcome(&outcome);
            eprintln!("\nsession: {}", outcome.session_id);
        }
        Commands::Chat { corpus } => {
            let config = Config::load(cli.config_dir.as_deref())?;
            let assistant = build_assistant(&config, &corpus).await?;
            run_chat(&assistant).await?;
        }
    }

    Ok(())
}
