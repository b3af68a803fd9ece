use crate::error::StorageError;
use crate::models::{Document, LibraryStats, Tag};
use crate::store::DocumentStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A tag together with the documents filed under it
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub tag: Tag,
    pub documents: Vec<Document>,
}

/// Read-only browsing and search over the stored documents
pub struct Library {
    store: Arc<dyn DocumentStore>,
}

impl Library {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Document and tag counts for the overview
    pub async fn stats(&self) -> Result<LibraryStats, StorageError> {
        self.store.stats().await
    }

    /// Case-insensitive substring search over title, summary, extracted text
    /// and tag names. A blank query matches nothing.
    pub async fn search(&self, query: &str) -> Result<Vec<Document>, StorageError> {
        let results = self.store.search(query).await?;
        debug!(query, results = results.len(), "search");
        Ok(results)
    }

    /// Every tag, ordered by name
    pub async fn categories(&self) -> Result<Vec<Tag>, StorageError> {
        self.store.list_tags().await
    }

    /// A tag by exact name and its documents
    pub async fn category(&self, name: &str) -> Result<Category, StorageError> {
        let tag = self.store.get_tag(name).await?;
        let documents = self.store.documents_with_tag(tag.id).await?;
        Ok(Category { tag, documents })
    }

    pub async fn document(&self, id: i64) -> Result<Document, StorageError> {
        self.store.get_document(id).await
    }
}
