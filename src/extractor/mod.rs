pub mod ocr;
pub mod pdf;
pub mod tiered;
pub mod r#trait;

pub use ocr::TesseractOcr;
pub use pdf::{LopdfTextLayer, PdftoppmRasterizer};
pub use tiered::TieredExtractor;
pub use r#trait::{OcrEngine, PageRasterizer, TextExtractor, TextLayer};
