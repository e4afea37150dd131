use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recipe_search::Result;
use recipe_search::commands::{clear, ingest, search, show_status};
use recipe_search::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "recipe-search")]
#[command(about = "Semantic recipe search backed by Ollama embeddings and LanceDB")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding service and vector store
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Ingest recipes from a JSON Lines file
    Ingest {
        /// Path to the input file, one recipe object per line
        file: PathBuf,
    },
    /// Search indexed recipes with a free-text query
    Search {
        /// The query text
        query: String,
        /// Maximum number of results
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Exact-match payload filter, e.g. --where cuisine=italian
        #[arg(long = "where", value_name = "FIELD=VALUE")]
        equals: Vec<String>,
        /// Set-membership payload filter, e.g. --where-any cuisine=italian,french
        #[arg(long = "where-any", value_name = "FIELD=V1,V2")]
        one_of: Vec<String>,
        /// List-containment payload filter, e.g. --has tags=vegan
        #[arg(long = "has", value_name = "FIELD=VALUE")]
        contains: Vec<String>,
    },
    /// Show detailed status of the pipeline
    Status,
    /// Delete the collection and all its vectors
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ingest { file } => {
            ingest(&file).await?;
        }
        Commands::Search {
            query,
            limit,
            equals,
            one_of,
            contains,
        } => {
            search(&query, limit, &equals, &one_of, &contains).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
        Commands::Clear { yes } => {
            clear(yes).await?;
        }
    }

    Ok(())
}
