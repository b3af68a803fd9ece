pub mod analyzer;
pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod library;
pub mod llm;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod utils;

pub use analyzer::DocumentAnalyzer;
pub use error::{ConfigError, StorageError};
pub use extractor::{TextExtractor, TieredExtractor};
pub use library::Library;
pub use llm::LlmProvider;
pub use models::{Document, FileKind, Tag};
pub use pipeline::{IngestOutcome, IngestionPipeline, Upload};
pub use store::{DocumentStore, MediaStore, SqliteStore};
