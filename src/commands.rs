use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use itertools::Itertools;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::embeddings::ollama::OllamaClient;
use crate::ingest::Ingestor;
use crate::query::Searcher;
use crate::store::{Filter, PayloadValue, ScoredPoint, VectorStore};

/// Ingest recipes from a JSON Lines file into the configured collection
#[inline]
pub async fn ingest(file: &Path) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    let client = OllamaClient::new(&config).context("Failed to create embedding client")?;

    match client.health_check() {
        Ok(()) => {
            info!(
                "Ollama connected at {}:{} with model {}",
                config.embedding.host, config.embedding.port, config.embedding.model
            );
        }
        Err(e) => {
            error!("Failed to connect to Ollama: {}", e);
            println!(
                "Error: Cannot reach Ollama at {}:{}",
                config.embedding.host, config.embedding.port
            );
            println!("Please ensure Ollama is running and the model is pulled.");
            println!("Use 'recipe-search config' to update connection settings.");
            return Err(e.into());
        }
    }

    let store = VectorStore::new(&config)
        .await
        .context("Failed to initialize vector store")?;

    let ingestor = Ingestor::new(client, store, config.collection_spec());

    println!("Ingesting {} ...", file.display());
    let report = ingestor.ingest_file(file).await?;

    println!(
        "Ingested {} records into '{}' in {:.2}s",
        report.records,
        config.store.collection,
        report.elapsed.as_secs_f64()
    );

    Ok(())
}

/// Search the collection with a free-text query and optional payload filters
#[inline]
pub async fn search(
    query: &str,
    limit: usize,
    equals: &[String],
    one_of: &[String],
    contains: &[String],
) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let spec = config.collection_spec();

    let filter = Filter::from_cli_args(&spec, equals, one_of, contains)?;

    let client = OllamaClient::new(&config).context("Failed to create embedding client")?;
    let store = VectorStore::new(&config)
        .await
        .context("Failed to initialize vector store")?;

    let searcher = Searcher::new(client, store, spec);
    let filter = if filter.is_empty() { None } else { Some(&filter) };
    let results = searcher.search(query, filter, limit).await?;

    if results.is_empty() {
        println!("No matches found.");
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        print_result(rank + 1, result);
    }

    Ok(())
}

fn print_result(rank: usize, result: &ScoredPoint) {
    match result.payload.get("title") {
        Some(PayloadValue::Text(title)) => {
            println!("{:2}. {} ({})  score: {:.4}", rank, title, result.id, result.score);
        }
        _ => {
            println!("{:2}. {}  score: {:.4}", rank, result.id, result.score);
        }
    }

    let details = result
        .payload
        .iter()
        .filter(|(key, _)| key.as_str() != "title")
        .map(|(key, value)| format!("{}: {}", key, value))
        .join("  ");

    if !details.is_empty() {
        println!("    {}", details);
    }
}

/// Show detailed status of the ingestion pipeline
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load_default().unwrap_or_else(|_| Config {
        embedding: crate::config::EmbeddingConfig::default(),
        store: crate::config::StoreConfig::default(),
        base_dir: std::path::PathBuf::new(),
    });

    println!("📊 Recipe Search Status");
    println!("{}", "=".repeat(50));
    println!();

    println!("🤖 Embedding Service:");
    match OllamaClient::new(&config) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.embedding.host, config.embedding.port
                );
                println!("   📋 Model: {}", config.embedding.model);
                println!("   🔢 Dimension: {}", config.embedding.dimension);
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Connected but unhealthy - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Failed to connect - {}", e);
        }
    }

    println!();
    println!("🔍 Vector Store:");
    match VectorStore::new(&config).await {
        Ok(store) => {
            println!("   ✅ LanceDB: Connected");

            let spec = config.collection_spec();
            match store.collection_exists(&spec.name).await {
                Ok(true) => match store.count(&spec).await {
                    Ok(count) => {
                        println!(
                            "   📚 Collection '{}': {} recipes ({} metric, {} dims)",
                            spec.name, count, spec.metric, spec.dimension
                        );
                    }
                    Err(e) => {
                        println!("   ⚠️  Collection '{}': failed to count - {}", spec.name, e);
                    }
                },
                Ok(false) => {
                    println!(
                        "   📭 Collection '{}' does not exist yet; run 'recipe-search ingest'",
                        spec.name
                    );
                }
                Err(e) => {
                    println!("   ❌ Failed to check collection: {}", e);
                }
            }
        }
        Err(e) => {
            println!("   ❌ LanceDB: Failed to connect - {}", e);
        }
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'recipe-search ingest <file>' to index recipes");
    println!("   • Use 'recipe-search search <query>' to find recipes");
    println!("   • Use 'recipe-search config' to adjust settings");

    Ok(())
}

/// Drop the configured collection and all its vectors
#[inline]
pub async fn clear(skip_confirmation: bool) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let spec = config.collection_spec();

    if !skip_confirmation {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete collection '{}' and all its vectors? This cannot be undone.",
                spec.name
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let store = VectorStore::new(&config)
        .await
        .context("Failed to initialize vector store")?;

    if store.clear(&spec).await? {
        println!("Collection '{}' deleted.", spec.name);
    } else {
        warn!("Collection '{}' did not exist", spec.name);
        println!("Collection '{}' did not exist.", spec.name);
    }

    Ok(())
}
