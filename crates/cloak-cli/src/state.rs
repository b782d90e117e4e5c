//! Shared application state.

use std::sync::Arc;

use cloak_core::CloakConfig;
use cloak_detect::{create_adapter, EntitySourceAdapter};
use cloak_runtime::{Pipeline, PipelineOptions};
use cloak_summarize::{LLMConfig, LlmSummarizer, Summarizer};
use tracing::{info, warn};

/// State shared by every command and route handler.
///
/// Holds no per-document data: placeholder maps live only for the duration
/// of a request and are handed back to the caller.
pub struct AppState {
    pub config: CloakConfig,
    pub adapter: Arc<EntitySourceAdapter>,
    /// `None` when no LLM provider is configured; offline commands still work.
    pub pipeline: Option<Pipeline>,
}

impl AppState {
    /// Build state from config, wiring the LLM summarizer when a provider
    /// key is available.
    pub fn new(config: CloakConfig) -> Self {
        let llm_config = LLMConfig::load(&config.llm_config_file);
        let summarizer: Option<Arc<dyn Summarizer>> =
            match LlmSummarizer::from_config(&llm_config, config.summary_timeout()) {
                Ok(s) => Some(Arc::new(s)),
                Err(e) => {
                    warn!("Summarization disabled: {}", e);
                    None
                }
            };
        Self::with_summarizer(config, summarizer)
    }

    /// Build state around an explicit summarizer (or none).
    pub fn with_summarizer(config: CloakConfig, summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        let adapter = Arc::new(create_adapter(&config));
        let pipeline = summarizer.map(|s| {
            Pipeline::new(adapter.clone(), s, PipelineOptions::from_config(&config))
        });

        info!(
            "State ready: languages={:?}, summarizer={}",
            config
                .supported_languages
                .iter()
                .map(|l| l.as_str())
                .collect::<Vec<_>>(),
            pipeline.is_some()
        );

        Self {
            config,
            adapter,
            pipeline,
        }
    }

    /// The pipeline, or an error explaining why summarization is off.
    pub fn pipeline(&self) -> anyhow::Result<&Pipeline> {
        self.pipeline.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No LLM provider configured; set OPENAI_API_KEY, ANTHROPIC_API_KEY or GROQ_API_KEY, or write {}",
                self.config.llm_config_file.display()
            )
        })
    }
}
