use anyhow::{Context, Result};
use clap::Parser;
use docshelf::{config::Config, library::Library, logging, store::SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "docshelf-search")]
#[command(about = "Search uploaded documents by title, summary, text or tag")]
#[command(version)]
struct Cli {
    /// Search query
    #[arg(value_name = "QUERY")]
    query: String,

    /// Database file (overrides config)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(false);
    let config = Config::load()?;

    let db_path = cli.db.unwrap_or_else(|| config.storage.database_path());
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    let library = Library::new(Arc::new(store));

    println!("Searching for: {}", cli.query);
    let results = library.search(&cli.query).await?;

    println!("\nFound {} results:", results.len());
    for (i, doc) in results.iter().enumerate() {
        println!("{}. {} ({})", i + 1, doc.display_title(), doc.file);
    }

    Ok(())
}
