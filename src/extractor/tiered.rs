use crate::config::ExtractorConfig;
use crate::constants::MIN_TEXT_LAYER_CHARS;
use crate::extractor::ocr::TesseractOcr;
use crate::extractor::pdf::{LopdfTextLayer, PdftoppmRasterizer};
use crate::extractor::r#trait::{OcrEngine, PageRasterizer, TextExtractor, TextLayer};
use crate::models::FileKind;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Text extractor that reads the PDF text layer first and falls back to OCR
/// when it yields too little text. Images go straight to OCR.
pub struct TieredExtractor {
    text_layer: Arc<dyn TextLayer>,
    rasterizer: Arc<dyn PageRasterizer>,
    ocr: Arc<dyn OcrEngine>,
    min_text_chars: usize,
}

impl TieredExtractor {
    pub fn new(
        text_layer: Arc<dyn TextLayer>,
        rasterizer: Arc<dyn PageRasterizer>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            text_layer,
            rasterizer,
            ocr,
            min_text_chars: MIN_TEXT_LAYER_CHARS,
        }
    }

    /// Build the default lopdf / pdftoppm / tesseract stack from configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        let rasterizer = PdftoppmRasterizer::new(config.dpi).with_executable(config.pdftoppm.clone());
        let ocr = TesseractOcr::new()
            .with_executable(config.tesseract.clone())
            .with_language(config.language.clone());

        Self::new(Arc::new(LopdfTextLayer::new()), Arc::new(rasterizer), Arc::new(ocr))
            .with_min_text_chars(config.min_text_chars)
    }

    /// Minimum trimmed length of the text layer before OCR kicks in
    pub fn with_min_text_chars(mut self, min_text_chars: usize) -> Self {
        self.min_text_chars = min_text_chars;
        self
    }

    /// Concatenated text layer of every page, one newline after each non-empty page
    async fn text_layer(&self, path: &Path) -> Result<String> {
        let pages = self.text_layer.page_texts(path).await?;
        let mut text = String::new();
        for page in pages.iter().filter(|p| !p.is_empty()) {
            text.push_str(page);
            text.push('\n');
        }
        Ok(text)
    }

    /// Rasterize every page and OCR the images in page order
    async fn ocr_pages(&self, path: &Path) -> Result<String> {
        let scratch = tempfile::tempdir().context("Failed to create raster directory")?;
        let images = self.rasterizer.rasterize(path, scratch.path()).await?;
        debug!(path = %path.display(), pages = images.len(), "rasterized pages for OCR");

        let mut text = String::new();
        for image in &images {
            text.push_str(&self.ocr.recognize(image).await?);
            text.push('\n');
        }
        Ok(text)
    }

    async fn extract_pdf(&self, path: &Path) -> Result<String> {
        let direct = match self.text_layer(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "text layer extraction failed");
                String::new()
            }
        };

        let direct_chars = direct.trim().chars().count();
        if direct_chars >= self.min_text_chars {
            return Ok(direct);
        }

        info!(
            path = %path.display(),
            chars = direct_chars,
            threshold = self.min_text_chars,
            "text layer too short, falling back to OCR"
        );
        self.ocr_pages(path).await
    }
}

#[async_trait::async_trait]
impl TextExtractor for TieredExtractor {
    async fn extract(&self, path: &Path, kind: FileKind) -> String {
        let result = match kind {
            FileKind::Pdf => self.extract_pdf(path).await,
            FileKind::Image => self.ocr.recognize(path).await,
            FileKind::Unsupported => {
                debug!(path = %path.display(), "unsupported file type, no text extracted");
                return String::new();
            }
        };

        match result {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error extracting text");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Text layer returning fixed pages (or an error) and counting calls
    struct FakeTextLayer {
        pages: Option<Vec<String>>,
        calls: AtomicUsize,
    }

    impl FakeTextLayer {
        fn with_pages(pages: &[&str]) -> Self {
            Self {
                pages: Some(pages.iter().map(|p| p.to_string()).collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                pages: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl TextLayer for FakeTextLayer {
        async fn page_texts(&self, _path: &Path) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.pages {
                Some(pages) => Ok(pages.clone()),
                None => anyhow::bail!("corrupt PDF"),
            }
        }
    }

    /// Rasterizer producing `pages` placeholder image paths
    struct FakeRasterizer {
        pages: usize,
        calls: AtomicUsize,
    }

    impl FakeRasterizer {
        fn new(pages: usize) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl PageRasterizer for FakeRasterizer {
        async fn rasterize(&self, _path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((1..=self.pages)
                .map(|n| out_dir.join(format!("page-{}.png", n)))
                .collect())
        }
    }

    /// OCR engine answering with a fixed text (or an error) and counting calls
    struct FakeOcr {
        text: Option<String>,
        calls: AtomicUsize,
    }

    impl FakeOcr {
        fn with_text(text: &str) -> Self {
            Self {
                text: Some(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                text: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl OcrEngine for FakeOcr {
        async fn recognize(&self, _image: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.text {
                Some(text) => Ok(text.clone()),
                None => anyhow::bail!("tesseract crashed"),
            }
        }
    }

    fn extractor(
        layer: &Arc<FakeTextLayer>,
        rasterizer: &Arc<FakeRasterizer>,
        ocr: &Arc<FakeOcr>,
    ) -> TieredExtractor {
        TieredExtractor::new(layer.clone(), rasterizer.clone(), ocr.clone())
    }

    fn long_page() -> String {
        "Invoice 2024-118 for consulting services rendered in March. ".repeat(3)
    }

    #[tokio::test]
    async fn test_image_skips_text_layer() {
        let layer = Arc::new(FakeTextLayer::with_pages(&["unused"]));
        let rasterizer = Arc::new(FakeRasterizer::new(1));
        let ocr = Arc::new(FakeOcr::with_text("receipt total 12.50"));

        let text = extractor(&layer, &rasterizer, &ocr)
            .extract(Path::new("/up/receipt.jpg"), FileKind::Image)
            .await;

        assert_eq!(text, "receipt total 12.50");
        assert_eq!(layer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pdf_with_text_layer_skips_ocr() {
        let page = long_page();
        let layer = Arc::new(FakeTextLayer::with_pages(&[&page, "", "second page"]));
        let rasterizer = Arc::new(FakeRasterizer::new(3));
        let ocr = Arc::new(FakeOcr::with_text("ocr"));

        let text = extractor(&layer, &rasterizer, &ocr)
            .extract(Path::new("/up/invoice.pdf"), FileKind::Pdf)
            .await;

        assert_eq!(text, format!("{}\nsecond page\n", page));
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pdf_exactly_at_threshold_skips_ocr() {
        let page = "x".repeat(100);
        let layer = Arc::new(FakeTextLayer::with_pages(&[&page]));
        let rasterizer = Arc::new(FakeRasterizer::new(1));
        let ocr = Arc::new(FakeOcr::with_text("ocr"));

        let text = extractor(&layer, &rasterizer, &ocr)
            .extract(Path::new("/up/a.pdf"), FileKind::Pdf)
            .await;

        assert_eq!(text.trim(), page);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pdf_short_text_layer_falls_back_to_ocr() {
        let layer = Arc::new(FakeTextLayer::with_pages(&["   scanned   ", "  "]));
        let rasterizer = Arc::new(FakeRasterizer::new(2));
        let ocr = Arc::new(FakeOcr::with_text("page text"));

        let text = extractor(&layer, &rasterizer, &ocr)
            .extract(Path::new("/up/scan.pdf"), FileKind::Pdf)
            .await;

        assert_eq!(text, "page text\npage text\n");
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_threshold_counts_characters_not_bytes() {
        // 60 two-byte characters: 120 bytes but below the 100 character threshold
        let page = "é".repeat(60);
        let layer = Arc::new(FakeTextLayer::with_pages(&[&page]));
        let rasterizer = Arc::new(FakeRasterizer::new(1));
        let ocr = Arc::new(FakeOcr::with_text("ocr"));

        extractor(&layer, &rasterizer, &ocr)
            .extract(Path::new("/up/a.pdf"), FileKind::Pdf)
            .await;

        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_tries_ocr_then_yields_empty() {
        let layer = Arc::new(FakeTextLayer::failing());
        let rasterizer = Arc::new(FakeRasterizer::new(1));
        let ocr = Arc::new(FakeOcr::failing());

        let text = extractor(&layer, &rasterizer, &ocr)
            .extract(Path::new("/up/broken.pdf"), FileKind::Pdf)
            .await;

        assert_eq!(text, "");
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_image_ocr_failure_yields_empty() {
        let layer = Arc::new(FakeTextLayer::with_pages(&[]));
        let rasterizer = Arc::new(FakeRasterizer::new(0));
        let ocr = Arc::new(FakeOcr::failing());

        let text = extractor(&layer, &rasterizer, &ocr)
            .extract(Path::new("/up/scan.png"), FileKind::Image)
            .await;

        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_unsupported_kind_invokes_nothing() {
        let layer = Arc::new(FakeTextLayer::with_pages(&["text"]));
        let rasterizer = Arc::new(FakeRasterizer::new(1));
        let ocr = Arc::new(FakeOcr::with_text("text"));

        let text = extractor(&layer, &rasterizer, &ocr)
            .extract(Path::new("/up/notes.docx"), FileKind::Unsupported)
            .await;

        assert_eq!(text, "");
        assert_eq!(layer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let layer = Arc::new(FakeTextLayer::with_pages(&["short but enough"]));
        let rasterizer = Arc::new(FakeRasterizer::new(1));
        let ocr = Arc::new(FakeOcr::with_text("ocr"));

        let text = extractor(&layer, &rasterizer, &ocr)
            .with_min_text_chars(10)
            .extract(Path::new("/up/a.pdf"), FileKind::Pdf)
            .await;

        assert_eq!(text, "short but enough\n");
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }
}
