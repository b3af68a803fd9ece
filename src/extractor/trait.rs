use crate::models::FileKind;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Trait for text extractors that turn an uploaded file into plain text
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text content from a file of the given kind.
    /// Failures are absorbed: an unreadable file yields an empty string.
    async fn extract(&self, path: &Path, kind: FileKind) -> String;
}

/// Direct access to the embedded text of a paginated document
#[async_trait::async_trait]
pub trait TextLayer: Send + Sync {
    /// Text of every page, in page order
    async fn page_texts(&self, path: &Path) -> Result<Vec<String>>;
}

/// Renders the pages of a paginated document into image files
#[async_trait::async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Write one image per page into `out_dir` and return their paths in page order
    async fn rasterize(&self, path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Optical character recognition over a single image
#[async_trait::async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<String>;
}
