use std::sync::Arc;

use anyhow::Context;
use azure_openai_ox::AzureOpenAI;
use azure_search_ox::AzureSearch;
use chat_relay::{AppState, AzureEmbedder, RetrievalIndexer, Settings, router};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(about = "Relay between a chat web client and Azure OpenAI", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP routes (default)
    Serve,
    /// Declare the vector index and print the closest documents to a query
    Search { query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Arc::new(Settings::from_env()?);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::Search { query } => search(&settings, &query).await,
    }
}

async fn serve(settings: Arc<Settings>) -> anyhow::Result<()> {
    let bind = settings.server.bind;
    log::info!(
        "retrieval augmentation {}, streaming {}",
        if settings.augmented() { "on" } else { "off" },
        if settings.openai.stream { "on" } else { "off" }
    );

    let app = router(AppState::from_settings(settings)?);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    log::info!("listening on {bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn search(settings: &Settings, query: &str) -> anyhow::Result<()> {
    let search = settings
        .search
        .as_ref()
        .context("AZURE_SEARCH_SERVICE, AZURE_SEARCH_INDEX and AZURE_SEARCH_KEY must be set")?;
    let (resource, model, key) = settings.openai.credentials()?;

    let client = AzureOpenAI::new(resource, model, key, &settings.openai.preview_api_version);
    let embedder = AzureEmbedder::new(client, &settings.openai.embedding_deployment);
    let indexer = RetrievalIndexer::initialise(
        AzureSearch::new(&search.endpoint, &search.key),
        &search.index,
        embedder,
    )
    .await?;

    for hit in indexer.similarity_search(query).await? {
        println!(
            "{:.4}\t{}\t{}",
            hit.score,
            hit.text("title").unwrap_or("-"),
            hit.text("content").unwrap_or_default()
        );
    }
    Ok(())
}
