use crate::analyzer::DocumentAnalyzer;
use crate::config::Config;
use crate::constants::{MAX_TAG_NAME_CHARS, MAX_TITLE_CHARS};
use crate::error::StorageError;
use crate::extractor::{TextExtractor, TieredExtractor};
use crate::llm::LlmProvider;
use crate::models::{Document, FileKind};
use crate::store::{DocumentStore, MediaStore};
use crate::utils;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// A single uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new<S: Into<String>>(file_name: S, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a local file as an upload
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }
}

/// Stages an upload moves through; Saved is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Extracting,
    Analyzing,
    Tagging,
    Saved,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Extracting => "extracting",
            Stage::Analyzing => "analyzing",
            Stage::Tagging => "tagging",
            Stage::Saved => "saved",
        };
        f.write_str(name)
    }
}

/// Final state of an ingested document
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub document: Document,
    /// Whether AI enrichment (title, summary, tags) was applied
    pub enriched: bool,
}

/// Save → extract → analyze → tag → persist, once per upload.
///
/// Extraction and analysis fail open; only storage errors abort.
pub struct IngestionPipeline {
    store: Arc<dyn DocumentStore>,
    media: MediaStore,
    extractor: Arc<dyn TextExtractor>,
    analyzer: DocumentAnalyzer,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        media: MediaStore,
        extractor: Arc<dyn TextExtractor>,
        analyzer: DocumentAnalyzer,
    ) -> Self {
        Self {
            store,
            media,
            extractor,
            analyzer,
        }
    }

    /// Pipeline with the default extractor stack and the given AI provider
    pub fn from_config(config: &Config, store: Arc<dyn DocumentStore>, provider: Arc<dyn LlmProvider>) -> Self {
        let extractor = TieredExtractor::from_config(&config.extractor);
        let analyzer = DocumentAnalyzer::new(provider).with_max_input_chars(config.analyzer.max_input_chars);
        Self::new(
            store,
            MediaStore::new(config.storage.media_dir()),
            Arc::new(extractor),
            analyzer,
        )
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    /// Store an upload and run it through extraction and analysis
    pub async fn ingest(&self, upload: &Upload) -> Result<IngestOutcome, StorageError> {
        let file = self.media.save(&upload.file_name, &upload.bytes).await?;
        let document = self.store.create_document(&file).await?;
        self.enter(&document, Stage::Received);
        self.process(document).await
    }

    /// Re-run extraction and analysis on an already stored document.
    /// A failed analysis keeps the previous title, summary and tags.
    pub async fn reprocess(&self, document_id: i64) -> Result<IngestOutcome, StorageError> {
        let document = self.store.get_document(document_id).await?;
        self.enter(&document, Stage::Received);
        self.process(document).await
    }

    fn enter(&self, document: &Document, stage: Stage) {
        debug!(document_id = document.id, file = %document.file, stage = %stage, "ingestion stage");
    }

    async fn process(&self, mut document: Document) -> Result<IngestOutcome, StorageError> {
        let path = self.media.path_of(&document.file);
        let kind = FileKind::from_path(&path);

        self.enter(&document, Stage::Extracting);
        document.extracted_text = self.extractor.extract(&path, kind).await;

        let mut enriched = false;
        if document.extracted_text.trim().is_empty() {
            debug!(document_id = document.id, "no text extracted, skipping analysis");
        } else {
            self.enter(&document, Stage::Analyzing);
            if let Some(analysis) = self.analyzer.analyze(&document.extracted_text).await {
                self.enter(&document, Stage::Tagging);
                document.title = Some(utils::truncate_chars(&analysis.title, MAX_TITLE_CHARS).to_string())
                    .filter(|t| !t.is_empty());
                document.summary = analysis.summary;

                let names: Vec<String> = analysis
                    .keywords
                    .iter()
                    .map(|k| utils::truncate_chars(k, MAX_TAG_NAME_CHARS).to_string())
                    .collect();
                // Tags go first so a failed swap leaves the previous enrichment intact
                self.store.replace_document_tags(document.id, &names).await?;
                enriched = true;
            }
        }

        self.enter(&document, Stage::Saved);
        self.store.save_document(&document).await?;
        let document = self.store.get_document(document.id).await?;

        info!(
            document_id = document.id,
            title = %document.display_title(),
            chars = document.extracted_text.chars().count(),
            tags = document.tags.len(),
            enriched,
            "document saved"
        );
        Ok(IngestOutcome { document, enriched })
    }
}
