//! Rule-based recognizers — a label-keyed registry of regex patterns.

use cloak_core::{normalize_label, Error, Language, Result, Span};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::detector::{resolve_overlaps, SpanDetector};

// Compiled regex patterns (compiled once, reused).
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());
static SSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static UK_NINO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-CEGHJ-PR-TW-Z]{2}\d{6}[A-D]\b").unwrap());
static CC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{4}[-\s]?){3}\d{4}\b").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap()
});
static INTL_PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+\d{1,3}(?:[\s.-]?\d{2,4}){2,4}\b").unwrap());
static IP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\b")
        .unwrap()
});
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+"#).unwrap());
static NUMERIC_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d{1,2}[-/]\d{1,2}[-/]\d{2,4}|\d{4}-\d{1,2}-\d{1,2})\b").unwrap()
});

struct Recognizer {
    label: String,
    regex: Regex,
}

/// Regex recognizers keyed by label.
///
/// Registration order is priority order: when two recognizers match the same
/// range, the earlier one wins.
pub struct PatternRecognizer {
    recognizers: Vec<Recognizer>,
}

impl PatternRecognizer {
    /// Registry with the default structured-PII recognizers.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("EMAIL", EMAIL_RE.clone());
        registry.register("SSN", SSN_RE.clone());
        registry.register("UK_NINO", UK_NINO_RE.clone());
        registry.register("CREDIT_CARD", CC_RE.clone());
        registry.register("PHONE", INTL_PHONE_RE.clone());
        registry.register("PHONE", PHONE_RE.clone());
        registry.register("IP_ADDRESS", IP_RE.clone());
        registry.register("URL", URL_RE.clone());
        registry.register("DATE", NUMERIC_DATE_RE.clone());
        registry
    }

    /// Registry with no recognizers.
    pub fn empty() -> Self {
        Self {
            recognizers: Vec::new(),
        }
    }

    /// Add a recognizer for `label`. Several recognizers may share a label.
    pub fn register(&mut self, label: &str, regex: Regex) {
        self.recognizers.push(Recognizer {
            label: normalize_label(label),
            regex,
        });
    }

    /// Builder-style registration from a pattern string.
    pub fn with_pattern(mut self, label: &str, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("bad pattern for {}: {}", label, e)))?;
        self.register(label, regex);
        Ok(self)
    }

    /// Remove every recognizer registered under `label`.
    pub fn remove_label(&mut self, label: &str) -> bool {
        let label = normalize_label(label);
        let before = self.recognizers.len();
        self.recognizers.retain(|r| r.label != label);
        self.recognizers.len() != before
    }

    /// Distinct labels in priority order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for r in &self.recognizers {
            if !labels.contains(&r.label.as_str()) {
                labels.push(&r.label);
            }
        }
        labels
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }
}

impl Default for PatternRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanDetector for PatternRecognizer {
    fn name(&self) -> &str {
        "patterns"
    }

    fn detect(&self, text: &str, _language: &Language) -> Result<Vec<Span>> {
        let mut spans = Vec::new();
        for recognizer in &self.recognizers {
            for m in recognizer.regex.find_iter(text) {
                if m.as_str().is_empty() {
                    continue;
                }
                spans.push(Span::new(m.start(), m.end(), recognizer.label.clone(), m.as_str()));
            }
        }
        Ok(resolve_overlaps(spans))
    }
}
