use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crew_memory::cli::{self, ingest::IngestArgs, query::QueryArgs};
use crew_memory::config::CrewMemoryConfig;
use crew_memory::server::{self, Transport};

#[derive(Parser)]
#[command(name = "crew-memory", version, about = "Shared memory MCP server for agent crews")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport to serve on; defaults to `server.transport` from config
        #[arg(long, value_enum)]
        transport: Option<Transport>,
    },
    /// Ingest a directory of documents into the shared index
    Ingest(IngestArgs),
    /// Query ingested documents
    Query(QueryArgs),
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to the model cache directory
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CrewMemoryConfig::load()?;

    // stderr only: stdout carries MCP JSON-RPC on the stdio transport
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => server::serve(config, transport).await?,
        Command::Ingest(args) => cli::ingest::ingest(&config, args).await?,
        Command::Query(args) => cli::query::query(&config, args).await?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
    }

    Ok(())
}
