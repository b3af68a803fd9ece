use crate::error::StorageError;
use crate::models::{Document, LibraryStats, Tag};
use crate::store::r#trait::{DocumentStore, StoreResult};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    documents: BTreeMap<i64, Document>,
    tags: BTreeMap<i64, Tag>,
    tag_ids: HashMap<String, i64>,
    /// (document_id, tag_id) pairs
    links: BTreeSet<(i64, i64)>,
    next_document_id: i64,
    next_tag_id: i64,
}

impl Inner {
    fn with_tags(&self, document: &Document) -> Document {
        let mut document = document.clone();
        document.tags = self
            .links
            .range((document.id, i64::MIN)..=(document.id, i64::MAX))
            .filter_map(|(_, tag_id)| self.tags.get(tag_id).cloned())
            .collect();
        document.tags.sort_by(|a, b| a.name.cmp(&b.name));
        document
    }

    fn upsert_tag(&mut self, name: &str) -> Tag {
        if let Some(tag) = self.tag_ids.get(name).and_then(|id| self.tags.get(id)) {
            return tag.clone();
        }
        self.next_tag_id += 1;
        let tag = Tag {
            id: self.next_tag_id,
            name: name.to_string(),
        };
        self.tag_ids.insert(tag.name.clone(), tag.id);
        self.tags.insert(tag.id, tag.clone());
        tag
    }

    fn newest_first(&self, ids: impl IntoIterator<Item = i64>) -> Vec<Document> {
        let ids: BTreeSet<i64> = ids.into_iter().collect();
        ids.iter()
            .rev()
            .filter_map(|id| self.documents.get(id))
            .map(|d| self.with_tags(d))
            .collect()
    }
}

/// In-process document store with the same semantics as the SQLite store
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(&self, file: &str) -> StoreResult<Document> {
        let mut inner = self.inner.lock().await;
        inner.next_document_id += 1;
        let document = Document {
            id: inner.next_document_id,
            title: None,
            file: file.to_string(),
            extracted_text: String::new(),
            summary: String::new(),
            created_at: Utc::now(),
            tags: Vec::new(),
        };
        inner.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn save_document(&self, document: &Document) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .documents
            .get_mut(&document.id)
            .ok_or_else(|| StorageError::document_not_found(document.id))?;
        stored.title = document.title.clone();
        stored.extracted_text = document.extracted_text.clone();
        stored.summary = document.summary.clone();
        Ok(())
    }

    async fn get_document(&self, id: i64) -> StoreResult<Document> {
        let inner = self.inner.lock().await;
        inner
            .documents
            .get(&id)
            .map(|d| inner.with_tags(d))
            .ok_or_else(|| StorageError::document_not_found(id))
    }

    async fn upsert_tag(&self, name: &str) -> StoreResult<Tag> {
        let mut inner = self.inner.lock().await;
        Ok(inner.upsert_tag(name))
    }

    async fn replace_document_tags(&self, document_id: i64, names: &[String]) -> StoreResult<Vec<Tag>> {
        let mut inner = self.inner.lock().await;
        let document = inner
            .documents
            .get(&document_id)
            .cloned()
            .ok_or_else(|| StorageError::document_not_found(document_id))?;

        inner.links.retain(|(doc, _)| *doc != document_id);
        for name in names {
            let tag = inner.upsert_tag(name);
            inner.links.insert((document_id, tag.id));
        }
        Ok(inner.with_tags(&document).tags)
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<Document>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let inner = self.inner.lock().await;
        let matching_tags: BTreeSet<i64> = inner
            .tags
            .values()
            .filter(|t| contains_folded(&t.name, &needle))
            .map(|t| t.id)
            .collect();

        let ids = inner.documents.values().filter_map(|d| {
            let hit = d.title.as_deref().map_or(false, |t| contains_folded(t, &needle))
                || contains_folded(&d.summary, &needle)
                || contains_folded(&d.extracted_text, &needle)
                || inner
                    .links
                    .iter()
                    .any(|(doc, tag)| *doc == d.id && matching_tags.contains(tag));
            hit.then_some(d.id)
        });
        Ok(inner.newest_first(ids))
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let inner = self.inner.lock().await;
        let mut tags: Vec<Tag> = inner.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn get_tag(&self, name: &str) -> StoreResult<Tag> {
        let inner = self.inner.lock().await;
        inner
            .tag_ids
            .get(name)
            .and_then(|id| inner.tags.get(id))
            .cloned()
            .ok_or_else(|| StorageError::tag_not_found(name))
    }

    async fn documents_with_tag(&self, tag_id: i64) -> StoreResult<Vec<Document>> {
        let inner = self.inner.lock().await;
        let ids = inner
            .links
            .iter()
            .filter(|(_, tag)| *tag == tag_id)
            .map(|(doc, _)| *doc);
        Ok(inner.newest_first(ids))
    }

    async fn stats(&self) -> StoreResult<LibraryStats> {
        let inner = self.inner.lock().await;
        Ok(LibraryStats {
            document_count: inner.documents.len() as u64,
            tag_count: inner.tags.len() as u64,
        })
    }
}
