use crate::constants::UPLOAD_SUBDIR;
use crate::error::StorageError;
use crate::utils;
use std::path::PathBuf;

/// Filesystem storage for uploaded binaries
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Write an upload under `<root>/documents/` and return its reference
    /// relative to the root
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let file_name = utils::stored_file_name(original_name, bytes);
        let dir = self.root.join(UPLOAD_SUBDIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;
        Ok(format!("{}/{}", UPLOAD_SUBDIR, file_name))
    }

    /// Absolute location of a stored file reference
    pub fn path_of(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }
}
