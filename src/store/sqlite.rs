use crate::error::StorageError;
use crate::models::{Document, LibraryStats, Tag};
use crate::store::r#trait::{DocumentStore, StoreResult};
use chrono::Utc;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT,
        file TEXT NOT NULL,
        extracted_text TEXT NOT NULL DEFAULT '',
        summary TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS document_tags (
        document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (document_id, tag_id)
    );

    CREATE INDEX IF NOT EXISTS idx_document_tags_tag ON document_tags(tag_id);
"#;

const DOCUMENT_COLUMNS: &str = "d.id, d.title, d.file, d.extracted_text, d.summary, d.created_at";

/// SQLite-backed document store
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// In-memory database, mostly for tests
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        // SQLite's lower() only folds ASCII
        conn.create_scalar_function(
            "fold_case",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: Option<String> = ctx.get(0)?;
                Ok(text.map(|t| t.to_lowercase()))
            },
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut conn)
        })
        .await?
    }
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        title: row.get(1)?,
        file: row.get(2)?,
        extracted_text: row.get(3)?,
        summary: row.get(4)?,
        created_at: row.get(5)?,
        tags: Vec::new(),
    })
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn load_tags(conn: &Connection, document_id: i64) -> rusqlite::Result<Vec<Tag>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.id, t.name FROM tags t
         JOIN document_tags dt ON dt.tag_id = t.id
         WHERE dt.document_id = ?1
         ORDER BY t.name",
    )?;
    let tags = stmt.query_map(params![document_id], tag_from_row)?;
    tags.collect()
}

/// Get-or-create a tag by exact name
fn upsert_tag_in(conn: &Connection, name: &str) -> rusqlite::Result<Tag> {
    conn.execute(
        "INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
        params![name],
    )?;
    conn.query_row("SELECT id, name FROM tags WHERE name = ?1", params![name], tag_from_row)
}

fn load_document(conn: &Connection, id: i64) -> StoreResult<Document> {
    let sql = format!("SELECT {} FROM documents d WHERE d.id = ?1", DOCUMENT_COLUMNS);
    let mut document = conn
        .query_row(&sql, params![id], document_from_row)
        .optional()?
        .ok_or_else(|| StorageError::document_not_found(id))?;
    document.tags = load_tags(conn, id)?;
    Ok(document)
}

/// Run a document query and attach each document's tags
fn query_documents(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> StoreResult<Vec<Document>> {
    let mut stmt = conn.prepare(sql)?;
    let mut documents = stmt
        .query_map(params, document_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for document in &mut documents {
        document.tags = load_tags(conn, document.id)?;
    }
    Ok(documents)
}

#[async_trait::async_trait]
impl DocumentStore for SqliteStore {
    async fn create_document(&self, file: &str) -> StoreResult<Document> {
        let file = file.to_string();
        self.with_conn(move |conn| {
            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO documents (title, file, extracted_text, summary, created_at)
                 VALUES (NULL, ?1, '', '', ?2)",
                params![file, created_at],
            )?;
            load_document(conn, conn.last_insert_rowid())
        })
        .await
    }

    async fn save_document(&self, document: &Document) -> StoreResult<()> {
        let document = document.clone();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE documents SET title = ?1, extracted_text = ?2, summary = ?3 WHERE id = ?4",
                params![document.title, document.extracted_text, document.summary, document.id],
            )?;
            if changed == 0 {
                return Err(StorageError::document_not_found(document.id));
            }
            Ok(())
        })
        .await
    }

    async fn get_document(&self, id: i64) -> StoreResult<Document> {
        self.with_conn(move |conn| load_document(conn, id)).await
    }

    async fn upsert_tag(&self, name: &str) -> StoreResult<Tag> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let tag = upsert_tag_in(&tx, &name)?;
            tx.commit()?;
            Ok(tag)
        })
        .await
    }

    async fn replace_document_tags(&self, document_id: i64, names: &[String]) -> StoreResult<Vec<Tag>> {
        let names = names.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.query_row("SELECT id FROM documents WHERE id = ?1", params![document_id], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?
            .ok_or_else(|| StorageError::document_not_found(document_id))?;

            tx.execute("DELETE FROM document_tags WHERE document_id = ?1", params![document_id])?;
            for name in &names {
                let tag = upsert_tag_in(&tx, name)?;
                tx.execute(
                    "INSERT OR IGNORE INTO document_tags (document_id, tag_id) VALUES (?1, ?2)",
                    params![document_id, tag.id],
                )?;
            }
            let tags = load_tags(&tx, document_id)?;
            tx.commit()?;
            Ok(tags)
        })
        .await
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<Document>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT DISTINCT {} FROM documents d
                 LEFT JOIN document_tags dt ON dt.document_id = d.id
                 LEFT JOIN tags t ON t.id = dt.tag_id
                 WHERE instr(fold_case(coalesce(d.title, '')), ?1) > 0
                    OR instr(fold_case(d.summary), ?1) > 0
                    OR instr(fold_case(d.extracted_text), ?1) > 0
                    OR instr(fold_case(coalesce(t.name, '')), ?1) > 0
                 ORDER BY d.id DESC",
                DOCUMENT_COLUMNS
            );
            query_documents(conn, &sql, params![needle])
        })
        .await
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name")?;
            let tags = stmt
                .query_map([], tag_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tags)
        })
        .await
    }

    async fn get_tag(&self, name: &str) -> StoreResult<Tag> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            conn.query_row("SELECT id, name FROM tags WHERE name = ?1", params![name], tag_from_row)
                .optional()?
                .ok_or_else(|| StorageError::tag_not_found(&name))
        })
        .await
    }

    async fn documents_with_tag(&self, tag_id: i64) -> StoreResult<Vec<Document>> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM documents d
                 JOIN document_tags dt ON dt.document_id = d.id
                 WHERE dt.tag_id = ?1
                 ORDER BY d.id DESC",
                DOCUMENT_COLUMNS
            );
            query_documents(conn, &sql, params![tag_id])
        })
        .await
    }

    async fn stats(&self) -> StoreResult<LibraryStats> {
        self.with_conn(|conn| {
            let document_count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            let tag_count: i64 = conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
            Ok(LibraryStats {
                document_count: document_count as u64,
                tag_count: tag_count as u64,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    async fn tagged(store: &SqliteStore, file: &str, tags: &[&str]) -> Document {
        let doc = store.create_document(file).await.unwrap();
        store.replace_document_tags(doc.id, &names(tags)).await.unwrap();
        store.get_document(doc.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_document_is_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        let doc = store.create_document("documents/scan_1a2b3c4d.png").await.unwrap();

        assert_eq!(doc.file, "documents/scan_1a2b3c4d.png");
        assert_eq!(doc.title, None);
        assert_eq!(doc.extracted_text, "");
        assert_eq!(doc.summary, "");
        assert!(doc.tags.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_reload_document() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut doc = store.create_document("documents/a.pdf").await.unwrap();
        doc.title = Some("Lease Agreement".to_string());
        doc.extracted_text = "This lease...".to_string();
        doc.summary = "A residential lease.".to_string();
        store.save_document(&doc).await.unwrap();

        let loaded = store.get_document(doc.id).await.unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Lease Agreement"));
        assert_eq!(loaded.extracted_text, "This lease...");
        assert_eq!(loaded.summary, "A residential lease.");
        assert_eq!(loaded.created_at, doc.created_at);
    }

    #[tokio::test]
    async fn test_save_unknown_document_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut doc = store.create_document("documents/a.pdf").await.unwrap();
        doc.id = 999;
        let err = store.save_document(&doc).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.get_document(999).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_upsert_tag_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.create_document("documents/a.pdf").await.unwrap();
        let b = store.create_document("documents/b.pdf").await.unwrap();

        let first = store.upsert_tag("finance").await.unwrap();
        let second = store.upsert_tag("finance").await.unwrap();
        assert_eq!(first, second);

        store.replace_document_tags(a.id, &names(&["finance"])).await.unwrap();
        // Duplicate name is associated once
        store.replace_document_tags(b.id, &names(&["finance", "finance"])).await.unwrap();

        assert_eq!(store.list_tags().await.unwrap().len(), 1);
        assert_eq!(store.documents_with_tag(first.id).await.unwrap().len(), 2);
        assert_eq!(store.get_document(b.id).await.unwrap().tags.len(), 1);
    }

    #[tokio::test]
    async fn test_tag_names_are_case_sensitive() {
        let store = SqliteStore::open_in_memory().unwrap();
        let lower = store.upsert_tag("tax").await.unwrap();
        let upper = store.upsert_tag("Tax").await.unwrap();
        assert_ne!(lower.id, upper.id);
    }

    #[tokio::test]
    async fn test_replace_document_tags_keeps_old_tags() {
        let store = SqliteStore::open_in_memory().unwrap();
        let doc = tagged(&store, "documents/a.pdf", &["invoice", "consulting"]).await;
        assert_eq!(doc.tag_names(), vec!["consulting", "invoice"]);

        let tags = store.replace_document_tags(doc.id, &names(&["receipt"])).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(store.get_document(doc.id).await.unwrap().tag_names(), vec!["receipt"]);
        assert_eq!(store.list_tags().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_replace_tags_on_missing_document_fails() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.replace_document_tags(42, &names(&["orphan"])).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_tags_rolls_back_on_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        let doc = tagged(&store, "documents/a.pdf", &["invoice", "consulting"]).await;
        store
            .conn
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_tag BEFORE INSERT ON tags WHEN NEW.name = 'rejected'
                 BEGIN SELECT RAISE(ABORT, 'tag rejected'); END;",
            )
            .unwrap();

        let result = store
            .replace_document_tags(doc.id, &names(&["billing", "rejected", "march"]))
            .await;

        assert!(matches!(result, Err(StorageError::Database(_))));
        let doc = store.get_document(doc.id).await.unwrap();
        assert_eq!(doc.tag_names(), vec!["consulting", "invoice"]);
        assert!(store.get_tag("billing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_search_matches_every_field_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut by_title = store.create_document("documents/a.pdf").await.unwrap();
        by_title.title = Some("Annual TAX return".to_string());
        store.save_document(&by_title).await.unwrap();

        let mut by_summary = store.create_document("documents/b.pdf").await.unwrap();
        by_summary.summary = "Receipt for tax-deductible donation".to_string();
        store.save_document(&by_summary).await.unwrap();

        let mut by_text = store.create_document("documents/c.pdf").await.unwrap();
        by_text.extracted_text = "...syntax highlighting...".to_string();
        store.save_document(&by_text).await.unwrap();

        let by_tag = tagged(&store, "documents/d.pdf", &["Taxes", "taxonomy"]).await;
        let _unrelated = tagged(&store, "documents/e.pdf", &["music"]).await;

        let results = store.search("Tax").await.unwrap();
        let mut ids: Vec<i64> = results.iter().map(|d| d.id).collect();
        ids.sort();
        assert_eq!(ids, vec![by_title.id, by_summary.id, by_text.id, by_tag.id]);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut doc = store.create_document("documents/a.pdf").await.unwrap();
        doc.summary = "Planning for the été festival".to_string();
        store.save_document(&doc).await.unwrap();
        let tagged_doc = tagged(&store, "documents/b.pdf", &["Straße"]).await;

        let ids: Vec<i64> = store.search("ÉTÉ").await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![doc.id]);
        let ids: Vec<i64> = store.search("STRAßE").await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![tagged_doc.id]);
    }

    #[tokio::test]
    async fn test_search_blank_query_returns_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_document("documents/a.pdf").await.unwrap();
        assert!(store.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_tag_by_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let tag = store.upsert_tag("travel").await.unwrap();
        assert_eq!(store.get_tag("travel").await.unwrap(), tag);
        assert!(store.get_tag("Travel").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_tags_sorted() {
        let store = SqliteStore::open_in_memory().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            store.upsert_tag(name).await.unwrap();
        }
        let names: Vec<String> = store.list_tags().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = SqliteStore::open_in_memory().unwrap();
        tagged(&store, "documents/a.pdf", &["one", "two"]).await;
        tagged(&store, "documents/b.pdf", &["two"]).await;

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.tag_count, 2);
    }

    #[tokio::test]
    async fn test_open_file_persists_between_handles() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("docshelf.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            tagged(&store, "documents/a.pdf", &["kept"]).await.id
        };

        let store = SqliteStore::open(&path).unwrap();
        let doc = store.get_document(id).await.unwrap();
        assert_eq!(doc.tag_names(), vec!["kept"]);
    }
}
