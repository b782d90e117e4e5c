//! The summarizer trait and its LLM-backed implementation.

use std::time::Duration;

use cloak_core::{Error, Result};
use futures::future::BoxFuture;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::LLMConfig;
use crate::providers::{complete, extract_summary};
use crate::types::{ChatMessage, ResolvedProvider};

/// Fixed instruction sent with every redacted document.
pub const SUMMARY_INSTRUCTION: &str = "Summarize this legal case in very short bullet points. \
Keep placeholders such as <PERSON_0> exactly as written, including the angle brackets. \
Respond with a JSON object with a single field \"summary\".";

/// External text-generation service: redacted text in, summary out.
///
/// Implementations must not keep per-document state; the same instance is
/// shared across concurrent cycles.
pub trait Summarizer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Summarize already-redacted text.
    fn summarize<'a>(&'a self, redacted: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Summarizer backed by a hosted LLM.
pub struct LlmSummarizer {
    client: Client,
    resolved: ResolvedProvider,
    temperature: f64,
    max_tokens: usize,
    name: String,
}

impl LlmSummarizer {
    /// Build from config. The HTTP client is created once and reused.
    pub fn from_config(config: &LLMConfig, timeout: Duration) -> Result<Self> {
        let resolved = config.resolve_provider().ok_or_else(|| {
            Error::Config(
                "No LLM provider configured (set OPENAI_API_KEY, ANTHROPIC_API_KEY or GROQ_API_KEY)"
                    .into(),
            )
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            "Summarizer: provider={}, model={}, timeout={}s",
            resolved.provider,
            resolved.model,
            timeout.as_secs()
        );

        Ok(Self {
            client,
            name: format!("{}:{}", resolved.provider, resolved.model),
            resolved,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn provider(&self) -> &ResolvedProvider {
        &self.resolved
    }

    fn messages(redacted: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SUMMARY_INSTRUCTION),
            ChatMessage::user(redacted),
        ]
    }
}

impl Summarizer for LlmSummarizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn summarize<'a>(&'a self, redacted: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let messages = Self::messages(redacted);
            let reply = complete(
                &self.client,
                self.resolved.provider,
                &messages,
                &self.resolved.model,
                &self.resolved.api_key,
                self.temperature,
                self.max_tokens,
            )
            .await?;

            let summary = extract_summary(&reply);
            if summary.is_empty() {
                return Err(Error::summarizer("Model returned an empty summary"));
            }
            debug!("Summary received ({} chars)", summary.chars().count());
            Ok(summary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_provider() {
        let result = LlmSummarizer::from_config(&LLMConfig::default(), Duration::from_secs(5));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_config_names_provider() {
        let config = LLMConfig {
            openai_api_key: Some("sk-test".into()),
            ..LLMConfig::default()
        };
        let summarizer = LlmSummarizer::from_config(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(summarizer.name(), "openai:gpt-4o-mini");
    }

    #[test]
    fn test_messages_carry_instruction() {
        let messages = LlmSummarizer::messages("<PERSON_0> sued <ORG_1>.");
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("placeholders"));
        assert_eq!(messages[1].content, "<PERSON_0> sued <ORG_1>.");
    }

    struct Echo;

    impl Summarizer for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn summarize<'a>(&'a self, redacted: &'a str) -> BoxFuture<'a, Result<String>> {
            Box::pin(async move { Ok(redacted.to_string()) })
        }
    }

    #[tokio::test]
    async fn test_trait_object_usable() {
        let summarizer: std::sync::Arc<dyn Summarizer> = std::sync::Arc::new(Echo);
        assert_eq!(summarizer.summarize("<ORG_0>").await.unwrap(), "<ORG_0>");
    }
}
