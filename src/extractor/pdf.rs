use crate::extractor::r#trait::{PageRasterizer, TextLayer};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// PDF text layer reader backed by lopdf
pub struct LopdfTextLayer;

impl LopdfTextLayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LopdfTextLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextLayer for LopdfTextLayer {
    async fn page_texts(&self, path: &Path) -> Result<Vec<String>> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            use lopdf::Document;

            let doc = Document::load(&path)
                .with_context(|| format!("Failed to load PDF: {}", path.display()))?;

            let mut pages = Vec::new();
            for page_num in doc.get_pages().keys() {
                match doc.extract_text(&[*page_num]) {
                    Ok(text) => pages.push(text),
                    Err(e) => {
                        // Pages without a decodable text layer count as blank
                        tracing::debug!(page = *page_num, error = %e, "no text layer on page");
                        pages.push(String::new());
                    }
                }
            }
            Ok(pages)
        })
        .await?
    }
}

/// Page rasterizer using pdftoppm (Poppler)
pub struct PdftoppmRasterizer {
    executable: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self {
            executable: "pdftoppm".to_string(),
            dpi,
        }
    }

    /// Set the pdftoppm executable (default: "pdftoppm")
    pub fn with_executable(mut self, executable: String) -> Self {
        self.executable = executable;
        self
    }

    fn run(&self, path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let prefix = out_dir.join("page");
        let output = Command::new(&self.executable)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(path)
            .arg(&prefix)
            .output()
            .with_context(|| {
                format!(
                    "Failed to execute {}. Install Poppler utils: brew install poppler (macOS) or apt-get install poppler-utils (Linux)",
                    self.executable
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} failed: {}", self.executable, stderr.trim());
        }

        collect_page_images(out_dir)
    }
}

/// Page images written by pdftoppm (page-1.png, page-01.png, ...) in page order
fn collect_page_images(out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(out_dir)
        .with_context(|| format!("Failed to read raster directory: {}", out_dir.display()))?
    {
        let path = entry?.path();
        let page = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix("page-"))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(page) = page {
            images.push((page, path));
        }
    }
    images.sort_by_key(|(page, _)| *page);
    Ok(images.into_iter().map(|(_, path)| path).collect())
}

#[async_trait::async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let rasterizer = PdftoppmRasterizer {
            executable: self.executable.clone(),
            dpi: self.dpi,
        };
        let path = path.to_path_buf();
        let out_dir = out_dir.to_path_buf();
        tokio::task::spawn_blocking(move || rasterizer.run(&path, &out_dir)).await?
    }
}
