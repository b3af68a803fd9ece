/// Constants used throughout docshelf
/// This module centralizes the pipeline thresholds and recognized file types

/// Minimum trimmed length of a PDF text layer before falling back to OCR
pub const MIN_TEXT_LAYER_CHARS: usize = 100;

/// Number of characters of extracted text sent to the analysis model
pub const MAX_ANALYSIS_INPUT_CHARS: usize = 8000;

/// Accepted range for the number of keywords returned by the analysis model
pub const MIN_KEYWORDS: usize = 5;
pub const MAX_KEYWORDS: usize = 7;

/// Column limits carried over from the relational schema
pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_TAG_NAME_CHARS: usize = 100;

/// File extensions for paginated text documents
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// File extensions for raster images that go straight to OCR
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "tif"];

/// Subdirectory of the media root where uploads are stored
pub const UPLOAD_SUBDIR: &str = "documents";

/// Resolution used when rasterizing PDF pages for OCR
pub const DEFAULT_RASTER_DPI: u32 = 200;

/// Default Gemini endpoint and model
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";

/// Default Ollama endpoint and model
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Environment variable consulted when no Gemini API key is configured
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
