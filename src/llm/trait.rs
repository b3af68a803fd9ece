use anyhow::Result;

/// Trait for language-model providers that answer a single text prompt
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and return the model's raw text reply
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Short provider name used in logs
    fn name(&self) -> &str;
}
