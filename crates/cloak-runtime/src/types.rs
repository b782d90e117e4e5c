//! Runtime types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cloak_core::{CloakConfig, Language, Span};
use cloak_protocol::PlaceholderMap;
use serde::Serialize;

/// Knobs for the summarization step and batch scheduling.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub language: Language,
    /// Timeout for a single summarizer attempt.
    pub timeout: Duration,
    /// Attempts after the first failure.
    pub max_retries: u32,
    /// Delay before retry `n` is `retry_backoff * n`.
    pub retry_backoff: Duration,
    pub max_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            language: Language::english(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
            max_concurrency: 4,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &CloakConfig) -> Self {
        Self {
            language: config.default_language.clone(),
            timeout: config.summary_timeout(),
            max_retries: config.summary_retries,
            max_concurrency: config.max_concurrency.max(1),
            ..Self::default()
        }
    }
}

/// A redacted document together with the map needed to reverse it.
#[derive(Debug, Clone, Serialize)]
pub struct Anonymized {
    pub redacted: String,
    pub map: PlaceholderMap,
    pub spans: Vec<Span>,
}

/// Result of a full anonymize → summarize → restore cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleOutcome {
    pub cycle_id: String,
    /// Summary with original values restored.
    pub summary: String,
    /// Summary exactly as the summarizer returned it.
    pub redacted_summary: String,
    /// Document text that was sent to the summarizer.
    pub redacted_text: String,
    pub entity_count: usize,
    pub restored_count: usize,
    /// Placeholders the summarizer dropped.
    pub missing_placeholders: Vec<String>,
    pub attempts: u32,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}
