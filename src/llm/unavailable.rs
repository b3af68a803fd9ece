use crate::llm::r#trait::LlmProvider;
use anyhow::{bail, Result};

/// Stand-in when no provider could be configured. Every prompt fails, so
/// documents are still saved, just without enrichment.
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait::async_trait]
impl LlmProvider for UnavailableProvider {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("analysis provider unavailable: {}", self.reason)
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
