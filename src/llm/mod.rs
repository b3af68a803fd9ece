pub mod gemini;
pub mod ollama;
pub mod r#trait;
pub mod unavailable;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use r#trait::LlmProvider;
pub use unavailable::UnavailableProvider;

use crate::config::Config;
use crate::error::ConfigError;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Build the configured provider. Called once at startup; the returned
/// handle is shared by every analysis. A missing Gemini key is not fatal:
/// uploads still go through and are saved without enrichment.
pub fn from_config(config: &Config) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.analyzer.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder
        .build()
        .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {}", e)))?;

    match config.analyzer.provider.as_str() {
        "gemini" => {
            let Some(api_key) = config.gemini_api_key() else {
                warn!("no Gemini API key (gemini.api_key or GEMINI_API_KEY), documents will not be analyzed");
                return Ok(Arc::new(UnavailableProvider::new("no Gemini API key")));
            };
            Ok(Arc::new(GeminiProvider::new(
                client,
                &config.gemini.url,
                &config.gemini.model,
                api_key,
            )))
        }
        "ollama" => Ok(Arc::new(OllamaProvider::new(
            client,
            &config.ollama.url,
            &config.ollama.model,
        ))),
        other => Err(ConfigError::Invalid(format!("unknown analyzer provider '{}'", other))),
    }
}
