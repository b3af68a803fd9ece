use crate::error::StorageError;
use crate::models::{Document, LibraryStats, Tag};

pub type StoreResult<T> = Result<T, StorageError>;

/// Storage boundary for documents, tags and their associations
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create an empty document that only references its stored file
    async fn create_document(&self, file: &str) -> StoreResult<Document>;

    /// Persist title, extracted text and summary of an existing document
    async fn save_document(&self, document: &Document) -> StoreResult<()>;

    /// Load a document with its tags
    async fn get_document(&self, id: i64) -> StoreResult<Document>;

    /// Return the tag with this name, creating it if needed. Atomic: concurrent
    /// callers with the same name get the same tag.
    async fn upsert_tag(&self, name: &str) -> StoreResult<Tag>;

    /// Replace every tag association of a document with the named tags,
    /// creating missing tags. All or nothing: on error the document keeps its
    /// previous tags and no new tag is left behind. Duplicate names associate once.
    async fn replace_document_tags(&self, document_id: i64, names: &[String]) -> StoreResult<Vec<Tag>>;

    /// Documents whose title, summary, extracted text or any tag name contains
    /// `query` (Unicode case-insensitive), each listed once, newest first
    async fn search(&self, query: &str) -> StoreResult<Vec<Document>>;

    /// All tags ordered by name
    async fn list_tags(&self) -> StoreResult<Vec<Tag>>;

    /// Tag by exact name
    async fn get_tag(&self, name: &str) -> StoreResult<Tag>;

    /// Documents associated with a tag, newest first
    async fn documents_with_tag(&self, tag_id: i64) -> StoreResult<Vec<Document>>;

    async fn stats(&self) -> StoreResult<LibraryStats>;
}
