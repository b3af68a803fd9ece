use crate::extractor::r#trait::OcrEngine;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// OCR engine using the tesseract command-line tool
pub struct TesseractOcr {
    executable: String,
    language: Option<String>,
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self {
            executable: "tesseract".to_string(),
            language: None,
        }
    }

    /// Set the tesseract executable (default: "tesseract")
    pub fn with_executable(mut self, executable: String) -> Self {
        self.executable = executable;
        self
    }

    /// Set the recognition language(s), e.g. "eng+deu"
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    fn run(executable: &str, language: Option<&str>, image: &PathBuf) -> Result<String> {
        let mut command = Command::new(executable);
        command.arg(image).arg("stdout");
        if let Some(lang) = language {
            command.arg("-l").arg(lang);
        }

        let output = command.output().with_context(|| {
            format!(
                "Failed to execute {}. Install Tesseract: brew install tesseract (macOS) or apt-get install tesseract-ocr (Linux)",
                executable
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} failed on {}: {}", executable, image.display(), stderr.trim());
        }

        String::from_utf8(output.stdout).context("tesseract returned invalid UTF-8")
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &Path) -> Result<String> {
        let executable = self.executable.clone();
        let language = self.language.clone();
        let image = image.to_path_buf();
        tokio::task::spawn_blocking(move || Self::run(&executable, language.as_deref(), &image)).await?
    }
}
