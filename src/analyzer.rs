use crate::constants::{MAX_ANALYSIS_INPUT_CHARS, MAX_KEYWORDS, MIN_KEYWORDS};
use crate::llm::LlmProvider;
use crate::models::Analysis;
use crate::utils;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Calls the language model once per document and normalizes its reply
/// into a title, a summary and 5-7 keywords.
pub struct DocumentAnalyzer {
    provider: Arc<dyn LlmProvider>,
    max_input_chars: usize,
}

/// Reply shape requested from the model; every key is required
#[derive(Deserialize)]
struct RawAnalysis {
    title: String,
    summary: String,
    keywords: Vec<String>,
}

impl DocumentAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            max_input_chars: MAX_ANALYSIS_INPUT_CHARS,
        }
    }

    /// Number of characters of document text sent to the model
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Analyze extracted text. Any failure is logged and yields `None`,
    /// meaning the document keeps its existing fields.
    pub async fn analyze(&self, text: &str) -> Option<Analysis> {
        match self.try_analyze(text).await {
            Ok(analysis) => {
                info!(
                    provider = self.provider.name(),
                    title = %analysis.title,
                    keywords = analysis.keywords.len(),
                    "document analyzed"
                );
                Some(analysis)
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "document analysis failed");
                None
            }
        }
    }

    async fn try_analyze(&self, text: &str) -> Result<Analysis> {
        let prompt = build_prompt(utils::truncate_chars(text, self.max_input_chars));
        debug!(provider = self.provider.name(), prompt_chars = prompt.chars().count(), "sending analysis prompt");

        let reply = self.provider.generate(&prompt).await?;
        parse_analysis(&reply)
    }
}

/// Instruction sent to the model around the (already truncated) document text
pub fn build_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following document text and return ONLY a valid JSON object with exactly three keys:
1. "title": a short, descriptive title for the document.
2. "summary": a concise one-paragraph summary.
3. "keywords": a list of {min}-{max} relevant keywords as a JSON array of strings.

Here is the text:
---
{text}
---
"#,
        min = MIN_KEYWORDS,
        max = MAX_KEYWORDS,
        text = text
    )
}

/// Parse a raw model reply into an `Analysis`.
///
/// Markdown code fences around the object are tolerated. The reply must be a
/// JSON object with string `title` and `summary` and a `keywords` array of
/// strings; blank keywords are dropped and 5-7 must remain.
pub fn parse_analysis(reply: &str) -> Result<Analysis> {
    let json = utils::strip_code_fences(reply);
    let raw: RawAnalysis = serde_json::from_str(json).context("Model reply is not the expected JSON object")?;

    let keywords: Vec<String> = raw
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    if !(MIN_KEYWORDS..=MAX_KEYWORDS).contains(&keywords.len()) {
        anyhow::bail!(
            "Model returned {} keywords, expected between {} and {}",
            keywords.len(),
            MIN_KEYWORDS,
            MAX_KEYWORDS
        );
    }

    Ok(Analysis {
        title: raw.title.trim().to_string(),
        summary: raw.summary.trim().to_string(),
        keywords,
    })
}
