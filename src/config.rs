use crate::constants::{
    DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_URL, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL,
    DEFAULT_RASTER_DPI, GEMINI_API_KEY_ENV, MAX_ANALYSIS_INPUT_CHARS, MIN_TEXT_LAYER_CHARS,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration loaded from settings.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
}

fn default_database_path() -> String {
    "docshelf.db".to_string()
}

fn default_media_dir() -> String {
    "media".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            media_dir: default_media_dir(),
        }
    }
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        expand_path(&self.database_path)
    }

    pub fn media_dir(&self) -> PathBuf {
        expand_path(&self.media_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    #[serde(default = "default_pdftoppm")]
    pub pdftoppm: String,
    #[serde(default = "default_tesseract")]
    pub tesseract: String,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Tesseract language, e.g. "eng" or "eng+deu"
    #[serde(default)]
    pub language: Option<String>,
}

fn default_min_text_chars() -> usize {
    MIN_TEXT_LAYER_CHARS
}

fn default_pdftoppm() -> String {
    "pdftoppm".to_string()
}

fn default_tesseract() -> String {
    "tesseract".to_string()
}

fn default_dpi() -> u32 {
    DEFAULT_RASTER_DPI
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_text_chars: default_min_text_chars(),
            pdftoppm: default_pdftoppm(),
            tesseract: default_tesseract(),
            dpi: default_dpi(),
            language: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// "gemini" or "ollama"
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_max_input_chars() -> usize {
    MAX_ANALYSIS_INPUT_CHARS
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            max_input_chars: default_max_input_chars(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_url")]
    pub url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_gemini_url() -> String {
    DEFAULT_GEMINI_URL.to_string()
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            url: default_gemini_url(),
            model: default_gemini_model(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_ollama_model() -> String {
    DEFAULT_OLLAMA_MODEL.to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::ReadFile {
            path: path.as_ref().display().to_string(),
            source,
        })?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from default location or return defaults
    pub fn load() -> Result<Self, ConfigError> {
        let default_paths = [
            PathBuf::from("config/settings.toml"),
            PathBuf::from("./config/settings.toml"),
            expand_path("~/.config/docshelf/settings.toml"),
        ];

        for path in &default_paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.analyzer.provider.as_str() {
            "gemini" | "ollama" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown analyzer provider '{}' (expected 'gemini' or 'ollama')",
                    other
                )))
            }
        }
        if self.analyzer.max_input_chars == 0 {
            return Err(ConfigError::Invalid("analyzer.max_input_chars must be positive".to_string()));
        }
        if self.extractor.dpi == 0 {
            return Err(ConfigError::Invalid("extractor.dpi must be positive".to_string()));
        }
        Ok(())
    }

    /// Get Gemini API key from config or environment variable
    pub fn gemini_api_key(&self) -> Option<String> {
        self.gemini
            .api_key
            .clone()
            .or_else(|| std::env::var(GEMINI_API_KEY_ENV).ok())
            .filter(|key| !key.is_empty())
    }
}
