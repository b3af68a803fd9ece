use crate::constants::{DOCUMENT_EXTENSIONS, IMAGE_EXTENSIONS};
use crate::utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A uniquely-named label attachable to many documents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// An uploaded document and everything derived from it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: i64,
    /// AI-assigned title, absent until analysis succeeds
    pub title: Option<String>,
    /// Stored file, relative to the media root
    pub file: String,
    pub extracted_text: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    /// Associated tags, sorted by name
    pub tags: Vec<Tag>,
}

impl Document {
    /// Title to show for the document, falling back to its id
    pub fn display_title(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Document {}", self.id),
        }
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Declared kind of an uploaded file, which selects the extraction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Paginated text document (PDF)
    Pdf,
    /// Raster image
    Image,
    Unsupported,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Pdf
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Image
        } else {
            FileKind::Unsupported
        }
    }

    pub fn from_path(path: &Path) -> Self {
        utils::get_extension(path)
            .map(|ext| Self::from_extension(&ext))
            .unwrap_or(FileKind::Unsupported)
    }
}

/// Structured result of the AI text analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Analysis {
    pub title: String,
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Counts shown on the library overview
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LibraryStats {
    pub document_count: u64,
    pub tag_count: u64,
}
