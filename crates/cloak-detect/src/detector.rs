//! Span detection provider trait.

use cloak_core::{Language, Result, Span};

/// A span detection provider (statistical model, pattern registry, ...).
///
/// Implementations must be pure functions of `(text, language, own
/// configuration)` and safe to share across worker threads.
pub trait SpanDetector: Send + Sync {
    /// Short name used in logs and detection errors.
    fn name(&self) -> &str;

    /// Detect sensitive spans in `text`.
    fn detect(&self, text: &str, language: &Language) -> Result<Vec<Span>>;
}

/// Sort by position, longest match first, and drop spans overlapping an
/// earlier kept one. Equal spans keep their input order.
pub fn resolve_overlaps(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut filtered = Vec::with_capacity(spans.len());
    let mut last_end = 0;
    for span in spans {
        if span.start >= last_end {
            last_end = span.end;
            filtered.push(span);
        }
    }
    filtered
}
