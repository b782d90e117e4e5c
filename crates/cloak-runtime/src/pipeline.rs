//! Pipeline: detect → map → redact → summarize → restore.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use cloak_core::{Error, Language, Result};
use cloak_detect::EntitySourceAdapter;
use cloak_protocol::{find_residuals, redact, restore_report, PlaceholderMap, Restoration};
use cloak_summarize::Summarizer;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::types::*;

/// Detect entities in `text` and replace them with placeholders.
///
/// Pure: needs no summarizer, so it also backs the offline `anonymize`
/// command and route.
pub fn anonymize(
    adapter: &EntitySourceAdapter,
    text: &str,
    language: &Language,
) -> Result<Anonymized> {
    let spans = adapter.detect(text, language)?;
    let map = PlaceholderMap::build(&spans, text);
    let redacted = redact(text, &map);

    let residuals = find_residuals(&redacted, &map);
    if !residuals.is_empty() {
        // Only reachable when a value overlaps a longer one at the edges.
        warn!("{} mapped values survived redaction", residuals.len());
    }

    debug!(
        "Anonymized document: {} spans, {} placeholders",
        spans.len(),
        map.len()
    );

    Ok(Anonymized {
        redacted,
        map,
        spans,
    })
}

/// Coordinates one or more anonymization cycles.
///
/// The adapter and summarizer are shared; every cycle builds its own
/// placeholder map, so concurrent cycles never see each other's values.
pub struct Pipeline {
    adapter: Arc<EntitySourceAdapter>,
    summarizer: Arc<dyn Summarizer>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        adapter: Arc<EntitySourceAdapter>,
        summarizer: Arc<dyn Summarizer>,
        options: PipelineOptions,
    ) -> Self {
        info!(
            "Pipeline initialized: detectors={:?}, summarizer={}, language={}, timeout={}ms, retries={}",
            adapter.detector_names(),
            summarizer.name(),
            options.language,
            options.timeout.as_millis(),
            options.max_retries
        );
        Self {
            adapter,
            summarizer,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn adapter(&self) -> &EntitySourceAdapter {
        &self.adapter
    }

    /// Detect entities in `text` and replace them with placeholders.
    pub fn anonymize(&self, text: &str) -> Result<Anonymized> {
        self.anonymize_as(text, &self.options.language)
    }

    /// [`Pipeline::anonymize`] with an explicit document language.
    pub fn anonymize_as(&self, text: &str, language: &Language) -> Result<Anonymized> {
        anonymize(&self.adapter, text, language)
    }

    /// Send redacted text to the summarizer.
    ///
    /// Each attempt is bounded by the configured timeout. Retryable failures
    /// are retried up to `max_retries` times with linear backoff; the map is
    /// untouched between attempts. Returns the summary and the number of
    /// attempts it took.
    pub async fn summarize(&self, anonymized: &Anonymized) -> Result<(String, u32)> {
        let max_attempts = self.options.max_retries + 1;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let call = self.summarizer.summarize(&anonymized.redacted);
            let result = match tokio::time::timeout(self.options.timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(Error::summarizer(format!(
                    "no response within {}ms",
                    self.options.timeout.as_millis()
                ))),
            };

            match result {
                Ok(summary) => return Ok((summary, attempt)),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.options.retry_backoff * attempt;
                    warn!(
                        "Summarizer attempt {}/{} failed: {}; retrying in {}ms",
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Put original values back into a summary.
    pub fn restore(&self, summary: &str, map: &PlaceholderMap) -> Restoration {
        let restoration = restore_report(summary, map);
        if !restoration.missing.is_empty() {
            info!(
                "Summary dropped {} of {} placeholders: {:?}",
                restoration.missing.len(),
                map.len(),
                restoration.missing
            );
        }
        restoration
    }

    /// Run one full cycle on a document.
    pub async fn process(&self, text: &str) -> Result<CycleOutcome> {
        self.process_as(text, &self.options.language).await
    }

    /// [`Pipeline::process`] with an explicit document language.
    pub async fn process_as(&self, text: &str, language: &Language) -> Result<CycleOutcome> {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("cycle", id = %cycle_id);

        async {
            let started = Instant::now();
            let result = self.run_cycle(text, language, cycle_id.clone(), started).await;
            if let Err(e) = &result {
                error!("Cycle failed at {} stage: {}", e.stage(), e);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_cycle(
        &self,
        text: &str,
        language: &Language,
        cycle_id: String,
        started: Instant,
    ) -> Result<CycleOutcome> {
        let anonymized = self.anonymize_as(text, language)?;
        let (redacted_summary, attempts) = self.summarize(&anonymized).await?;
        let restoration = self.restore(&redacted_summary, &anonymized.map);

        let outcome = CycleOutcome {
            cycle_id,
            summary: restoration.text,
            redacted_summary,
            redacted_text: anonymized.redacted,
            entity_count: anonymized.map.len(),
            restored_count: restoration.restored,
            missing_placeholders: restoration.missing,
            attempts,
            duration_ms: started.elapsed().as_millis() as u64,
            finished_at: Utc::now(),
        };

        info!(
            "Cycle complete: {} entities, {} restored, {} attempts, {}ms",
            outcome.entity_count, outcome.restored_count, outcome.attempts, outcome.duration_ms
        );
        Ok(outcome)
    }

    /// Process several documents concurrently.
    ///
    /// At most `max_concurrency` cycles are in flight; results come back in
    /// input order and one document's failure does not affect the others.
    pub async fn process_batch(&self, texts: &[String]) -> Vec<Result<CycleOutcome>> {
        info!(
            "Processing batch of {} documents (concurrency {})",
            texts.len(),
            self.options.max_concurrency
        );
        stream::iter(texts.iter())
            .map(|text| self.process(text))
            .buffered(self.options.max_concurrency.max(1))
            .collect()
            .await
    }
}
