use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docshelf::{
    config::Config,
    library::Library,
    llm,
    logging,
    models::Document,
    pipeline::{IngestionPipeline, Upload},
    store::{DocumentStore, SqliteStore},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "docshelf")]
#[command(about = "Upload documents and have them read, summarized and tagged automatically")]
#[command(version)]
struct Cli {
    /// Configuration file (default: config/settings.toml or ~/.config/docshelf/settings.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file (overrides config)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Media directory for stored uploads (overrides config)
    #[arg(long, global = true, value_name = "DIR")]
    media: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files (directories are walked recursively), extract, analyze and tag them
    Upload {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Re-run extraction and analysis on a stored document
    Reprocess {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Search title, summary, text and tags
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },
    /// List all categories (tags)
    Categories,
    /// Show the documents filed under a category
    Category {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Show a single document
    Show {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Document and category counts
    Stats,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(db) = &cli.db {
        config.storage.database_path = db.to_string_lossy().into_owned();
    }
    if let Some(media) = &cli.media {
        config.storage.media_dir = media.to_string_lossy().into_owned();
    }
    Ok(config)
}

/// Files named on the command line, with directories expanded
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn print_document_line(doc: &Document) {
    let tags = doc.tag_names().join(", ");
    if tags.is_empty() {
        println!("{:>5}  {}", doc.id, doc.display_title());
    } else {
        println!("{:>5}  {}  [{}]", doc.id, doc.display_title(), tags);
    }
}

fn print_document(doc: &Document) {
    println!("Document {}", doc.id);
    println!("  Title:    {}", doc.display_title());
    println!("  File:     {}", doc.file);
    println!("  Uploaded: {}", doc.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Tags:     {}", doc.tag_names().join(", "));
    if !doc.summary.is_empty() {
        println!("\n{}", doc.summary);
    }
    println!("\n{} characters of extracted text", doc.extracted_text.chars().count());
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn upload(cli: &Cli, config: &Config, store: Arc<dyn DocumentStore>, paths: &[PathBuf]) -> Result<()> {
    let provider = llm::from_config(config).context("Failed to set up the analysis provider")?;
    let pipeline = IngestionPipeline::from_config(config, store, provider);

    let files = collect_files(paths)?;
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files uploaded ({msg})")?
            .progress_chars("#>-"),
    );
    if cli.json || files.len() < 2 {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let mut documents = Vec::new();
    for file in &files {
        pb.set_message(file.display().to_string());
        let upload = Upload::from_path(file)
            .await
            .with_context(|| format!("Failed to read file: {}", file.display()))?;
        let outcome = pipeline
            .ingest(&upload)
            .await
            .with_context(|| format!("Failed to store upload: {}", file.display()))?;

        if !cli.json {
            pb.suspend(|| {
                let status = if outcome.enriched { "analyzed" } else { "saved without analysis" };
                println!("✓ {} → '{}' ({})", file.display(), outcome.document.display_title(), status);
            });
        }
        documents.push(outcome.document);
        pb.inc(1);
    }
    pb.finish_and_clear();

    if cli.json {
        print_json(&documents)?;
    } else {
        println!("Uploaded {} file(s)", documents.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = load_config(&cli)?;
    let store: Arc<dyn DocumentStore> = Arc::new(
        SqliteStore::open(&config.storage.database_path())
            .with_context(|| format!("Failed to open database: {}", config.storage.database_path))?,
    );
    let library = Library::new(store.clone());

    match &cli.command {
        Commands::Upload { paths } => upload(&cli, &config, store, paths).await?,
        Commands::Reprocess { id } => {
            let provider = llm::from_config(&config).context("Failed to set up the analysis provider")?;
            let pipeline = IngestionPipeline::from_config(&config, store, provider);
            let outcome = pipeline.reprocess(*id).await?;
            if cli.json {
                print_json(&outcome.document)?;
            } else {
                let status = if outcome.enriched { "analyzed" } else { "analysis failed, previous enrichment kept" };
                println!("✓ Reprocessed '{}' ({})", outcome.document.display_title(), status);
            }
        }
        Commands::Search { query } => {
            let results = library.search(query).await?;
            if cli.json {
                print_json(&results)?;
            } else {
                println!("Found {} results for '{}':", results.len(), query);
                for doc in &results {
                    print_document_line(doc);
                }
            }
        }
        Commands::Categories => {
            let tags = library.categories().await?;
            if cli.json {
                print_json(&tags)?;
            } else {
                for tag in &tags {
                    println!("{}", tag.name);
                }
            }
        }
        Commands::Category { name } => {
            let category = library.category(name).await?;
            if cli.json {
                print_json(&category)?;
            } else {
                println!("Category '{}' ({} documents):", category.tag.name, category.documents.len());
                for doc in &category.documents {
                    print_document_line(doc);
                }
            }
        }
        Commands::Show { id } => {
            let doc = library.document(*id).await?;
            if cli.json {
                print_json(&doc)?;
            } else {
                print_document(&doc);
            }
        }
        Commands::Stats => {
            let stats = library.stats().await?;
            if cli.json {
                print_json(&stats)?;
            } else {
                println!("Documents:  {}", stats.document_count);
                println!("Categories: {}", stats.tag_count);
            }
        }
    }

    Ok(())
}
