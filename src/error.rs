//! Error types for docshelf.
//!
//! Extraction and analysis failures never leave their component: they are
//! logged and degrade the document. Only the variants below surface.

use thiserror::Error;

/// Storage-layer errors (database and media files). Not recoverable locally.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
}

impl StorageError {
    pub fn document_not_found(id: i64) -> Self {
        StorageError::NotFound {
            kind: "Document",
            key: id.to_string(),
        }
    }

    pub fn tag_not_found(name: &str) -> Self {
        StorageError::NotFound {
            kind: "Tag",
            key: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
