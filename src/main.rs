use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docqa_cli::{
    Assistant, Outcome, Response, display_banner, is_exit_command, print_answer,
    print_diagnostics, print_error, print_route, read_question,
};
use docqa_core::{
    DocumentLoader, Intent, LLMProvider, RagEngine, Reranker, RetrievalConfig, SplitterConfig,
    VectorStore,
};
use docqa_crew::{CachedProvider, SerperSearchTool, Tool, render_markdown, travel_crew};
use docqa_ollama::OllamaClient;
use docqa_rag::{DirectoryLoader, HttpReranker, LexicalReranker, LocalVectorStore, RagPipeline};

type Pipeline = RagPipeline<OllamaClient, LocalVectorStore<OllamaClient>, Box<dyn Reranker>>;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions about your PDF documents", long_about = None)]
struct Cli {
    /// Directory holding the source documents [env: DOCQA_DOCS_PATH]
    #[arg(long, global = true)]
    docs: Option<PathBuf>,

    /// Directory of the persisted vector index [env: DOCQA_INDEX_PATH]
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Routed assistant: documents, calculator or general chat (default)
    Chat,
    /// Document-only question loop showing the retrieved passages
    Research,
    /// Answer a single question and exit
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Build the vector index from the documents and save it
    Index,
    /// Research and plan a trip with a crew of agents
    PlanTrip {
        #[arg(long)]
        city: String,
        #[arg(long, default_value_t = 3)]
        days: u32,
        /// Completion budget for each crew task
        #[arg(long, default_value_t = 1024)]
        max_tokens: u32,
        /// Skip web search even when SERPER_API_KEY is set
        #[arg(long)]
        offline: bool,
    },
}

fn path_setting(flag: Option<PathBuf>, key: &str, default: &str) -> PathBuf {
    flag.or_else(|| env::var(key).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,docqa_rag=info,docqa_crew=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let docs = path_setting(cli.docs, "DOCQA_DOCS_PATH", "docs");
    let index = path_setting(cli.index, "DOCQA_INDEX_PATH", "faiss_index");

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let assistant = build_assistant(&docs, &index).await?;
            chat(&assistant).await
        }
        Commands::Research => {
            let assistant = build_assistant(&docs, &index).await?;
            research(assistant.rag()).await
        }
        Commands::Ask { question } => {
            let assistant = build_assistant(&docs, &index).await?;
            let response = assistant.respond(&question.join(" ")).await?;
            print_route(response.intent);
            print_answer(&response);
            Ok(())
        }
        Commands::Index => {
            let client = Arc::new(connect_ollama().await?);
            let store = build_index(client, &docs, &index).await?;
            println!(
                "{} Indexed {} chunks into {}",
                "✅".green(),
                store.count().await?,
                index.display()
            );
            Ok(())
        }
        Commands::PlanTrip {
            city,
            days,
            max_tokens,
            offline,
        } => plan_trip(&city, days, max_tokens, offline).await,
    }
}

async fn connect_ollama() -> Result<OllamaClient> {
    let mut client = OllamaClient::from_env()?;
    client
        .connect()
        .await
        .with_context(|| format!("Could not reach Ollama at {}", client.config().host))?;
    Ok(client)
}

/// Load documents, split, embed and persist a fresh index
async fn build_index(
    client: Arc<OllamaClient>,
    docs: &Path,
    index: &Path,
) -> Result<LocalVectorStore<OllamaClient>> {
    println!("{} Loading documents from {}...", "📄".cyan(), docs.display());
    let documents = DirectoryLoader::new().load_dir(docs).await?;
    if documents.is_empty() {
        bail!("No PDF or text documents found in {}", docs.display());
    }
    println!("Total pages loaded: {}", documents.len());

    println!("{} Creating embeddings...", "🧮".cyan());
    let store =
        LocalVectorStore::build_from_documents(client, &documents, &SplitterConfig::default())
            .await?;
    store.persist(index).await?;
    Ok(store)
}

/// Reuse a persisted index, building one on first run
async fn open_index(
    client: Arc<OllamaClient>,
    docs: &Path,
    index: &Path,
) -> Result<LocalVectorStore<OllamaClient>> {
    if LocalVectorStore::<OllamaClient>::exists(index) {
        println!("{} Loading existing vector index...", "📚".cyan());
        let store = LocalVectorStore::load(index, client)
            .await
            .with_context(|| format!("Failed to load index from {} (try `docqa index`)", index.display()))?;
        return Ok(store);
    }

    build_index(client, docs, index).await
}

fn select_reranker() -> Result<Box<dyn Reranker>> {
    match env::var("RERANKER_URL") {
        Ok(url) if !url.trim().is_empty() => {
            let model = env::var("RERANKER_MODEL")
                .unwrap_or_else(|_| HttpReranker::BGE_RERANKER_BASE.to_string());
            Ok(Box::new(HttpReranker::new(url.trim(), model)?))
        }
        _ => {
            tracing::warn!("RERANKER_URL not set, using lexical overlap re-ranking");
            Ok(Box::new(LexicalReranker))
        }
    }
}

async fn build_assistant(docs: &Path, index: &Path) -> Result<Assistant<OllamaClient, Pipeline>> {
    let client = Arc::new(connect_ollama().await?);
    let store = Arc::new(open_index(client.clone(), docs, index).await?);

    let pipeline = RagPipeline::new(
        client.clone(),
        store,
        Arc::new(select_reranker()?),
        RetrievalConfig::from_env()?,
    );

    Ok(Assistant::new(client, pipeline))
}

async fn chat(assistant: &Assistant<OllamaClient, Pipeline>) -> Result<()> {
    display_banner("docqa - document assistant", "Powered by Ollama");

    let mut history = Vec::new();
    while let Some(input) = read_question("Your question:", &mut history)? {
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_command(input) {
            break;
        }

        match assistant.respond(input).await {
            Ok(response) => {
                print_route(response.intent);
                print_answer(&response);
            }
            Err(e) => print_error(&e),
        }
    }

    println!("{}", "👋 Goodbye!".green());
    Ok(())
}

async fn research(rag: &Pipeline) -> Result<()> {
    println!(
        "\n{}",
        "--- Start talking to the research assistant (type 'sair' to finish) ---".bold()
    );

    let mut history = Vec::new();
    while let Some(input) = read_question("Your question:", &mut history)? {
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_command(input) {
            break;
        }

        println!("\n{}", "--- Expanding the question... ---".cyan());
        match rag.answer(input).await {
            Ok(answer) => {
                print_diagnostics(&answer.retrieval);
                let response = Response {
                    intent: Intent::DocumentSearch,
                    outcome: Outcome::Documents(answer),
                };
                print_answer(&response);
            }
            Err(e) => print_error(&e),
        }
    }

    Ok(())
}

async fn plan_trip(city: &str, days: u32, max_tokens: u32, offline: bool) -> Result<()> {
    let client = connect_ollama().await?;
    let cache_path = path_setting(None, "DOCQA_CACHE_PATH", "cache.json");
    let llm = Arc::new(CachedProvider::open(client, &cache_path).await?);

    let search: Option<Arc<dyn Tool>> = if offline {
        None
    } else {
        match SerperSearchTool::from_env() {
            Ok(tool) => Some(Arc::new(tool)),
            Err(e) => {
                tracing::warn!(error = %e, "web search disabled");
                None
            }
        }
    };

    let crew = travel_crew(llm, city, days, search)?.with_max_tokens(max_tokens);

    println!("{}", "######################".blue());
    println!("{}", "## The travel crew is ready for take-off! ##".blue().bold());
    println!("{}", "######################".blue());

    let output = crew.kickoff().await?;

    println!("\n\n{}", "######################".blue());
    println!("{}", "## Finished travel itinerary: ##".blue().bold());
    println!("{}\n", "######################".blue());
    println!("{}", render_markdown(output.final_output()));
    Ok(())
}
