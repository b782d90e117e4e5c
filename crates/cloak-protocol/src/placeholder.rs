//! Placeholder assignment — one `<LABEL_N>` token per distinct literal value.

use std::collections::{BTreeMap, HashMap};

use cloak_core::{normalize_label, Error, Result, Span};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Every placeholder the mapper emits matches this pattern.
pub(crate) static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[A-Z0-9_]+>").unwrap());

/// Whether `s` is exactly one well-formed placeholder token.
pub fn is_placeholder_token(s: &str) -> bool {
    TOKEN_RE
        .find(s)
        .map(|m| m.start() == 0 && m.end() == s.len())
        .unwrap_or(false)
}

/// One placeholder and the literal value it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    pub placeholder: String,
    pub original: String,
    /// Label of the span that first produced this value.
    pub label: String,
}

/// Ordered, bidirectional placeholder ↔ original mapping for one document.
///
/// Keys are unique in both directions: a literal value maps to exactly one
/// placeholder, regardless of how many spans (or labels) reported it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MapEntry>", into = "Vec<MapEntry>")]
pub struct PlaceholderMap {
    entries: Vec<MapEntry>,
    by_placeholder: HashMap<String, usize>,
    by_original: HashMap<String, usize>,
    next_index: usize,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map for `text` from spans in detector order.
    ///
    /// The first occurrence of a literal value wins the placeholder; later
    /// spans with the same text reuse it even under a different label.
    /// Invalid spans are dropped with a warning instead of failing the
    /// document, so a document whose spans are all invalid gets an empty map.
    pub fn build(spans: &[Span], text: &str) -> Self {
        let mut map = Self::new();
        let mut dropped = 0usize;

        for span in spans {
            if let Err(e) = span.validate(text) {
                warn!(label = %span.label, "Dropping span: {}", e);
                dropped += 1;
                continue;
            }
            map.insert(&span.label, &span.text, Some(text));
        }

        debug!(
            "Built placeholder map: {} entries from {} spans ({} dropped)",
            map.len(),
            spans.len(),
            dropped
        );
        map
    }

    /// Assign (or reuse) the placeholder for a single value.
    pub fn assign(&mut self, label: &str, value: &str) -> Result<&str> {
        if value.is_empty() {
            return Err(Error::invalid_span(0, 0, "empty text"));
        }
        if normalize_label(label).is_empty() {
            return Err(Error::invalid_span(0, value.len(), "empty label"));
        }
        if !self.by_original.contains_key(value) {
            if let Some(token) = self.embedded_placeholder(value) {
                return Err(Error::invalid_span(
                    0,
                    value.len(),
                    format!("value contains mapped placeholder {}", token),
                ));
            }
        }
        let idx = self.insert(label, value, None);
        Ok(&self.entries[idx].placeholder)
    }

    /// Rebuild a map from serialized entries (e.g. a map handed back by a client).
    pub fn from_entries(entries: Vec<MapEntry>) -> Result<Self> {
        let mut map = Self::new();
        for entry in entries {
            if !is_placeholder_token(&entry.placeholder) {
                return Err(Error::InvalidMap(format!(
                    "malformed placeholder {:?}",
                    entry.placeholder
                )));
            }
            if entry.original.is_empty() {
                return Err(Error::InvalidMap(format!(
                    "empty original for {}",
                    entry.placeholder
                )));
            }
            if map.by_placeholder.contains_key(&entry.placeholder) {
                return Err(Error::InvalidMap(format!(
                    "duplicate placeholder {}",
                    entry.placeholder
                )));
            }
            if map.by_original.contains_key(&entry.original) {
                return Err(Error::InvalidMap(format!(
                    "value mapped twice (second time as {})",
                    entry.placeholder
                )));
            }
            if let Some(n) = trailing_index(&entry.placeholder) {
                map.next_index = map.next_index.max(n + 1);
            }
            map.push(entry);
        }

        // An original holding another entry's token would restore twice.
        for entry in &map.entries {
            if let Some(token) = map.embedded_placeholder(&entry.original) {
                return Err(Error::InvalidMap(format!(
                    "original of {} contains placeholder {}",
                    entry.placeholder, token
                )));
            }
        }
        Ok(map)
    }

    /// First token in `value` that is a placeholder of this map.
    fn embedded_placeholder<'v>(&self, value: &'v str) -> Option<&'v str> {
        TOKEN_RE
            .find_iter(value)
            .map(|m| m.as_str())
            .find(|token| self.by_placeholder.contains_key(*token))
    }

    fn insert(&mut self, label: &str, value: &str, document: Option<&str>) -> usize {
        if let Some(&idx) = self.by_original.get(value) {
            return idx;
        }

        let label = normalize_label(label);
        let mut n = self.next_index;
        let placeholder = loop {
            let candidate = format!("<{}_{}>", label, n);
            let in_document = document.map(|d| d.contains(&candidate)).unwrap_or(false);
            let in_values = value.contains(&candidate)
                || self.entries.iter().any(|e| e.original.contains(&candidate));
            if !in_document && !in_values && !self.by_placeholder.contains_key(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.next_index = n + 1;

        self.push(MapEntry {
            placeholder,
            original: value.to_string(),
            label,
        })
    }

    fn push(&mut self, entry: MapEntry) -> usize {
        let idx = self.entries.len();
        self.by_placeholder.insert(entry.placeholder.clone(), idx);
        self.by_original.insert(entry.original.clone(), idx);
        self.entries.push(entry);
        idx
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in emission order.
    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    pub fn get_original(&self, placeholder: &str) -> Option<&str> {
        self.by_placeholder
            .get(placeholder)
            .map(|&i| self.entries[i].original.as_str())
    }

    pub fn get_placeholder(&self, original: &str) -> Option<&str> {
        self.by_original
            .get(original)
            .map(|&i| self.entries[i].placeholder.as_str())
    }

    /// Number of distinct values per label.
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.label.clone()).or_insert(0) += 1;
        }
        counts
    }
}

fn trailing_index(placeholder: &str) -> Option<usize> {
    let inner = placeholder.strip_prefix('<')?.strip_suffix('>')?;
    inner.rsplit('_').next()?.parse().ok()
}

impl TryFrom<Vec<MapEntry>> for PlaceholderMap {
    type Error = Error;

    fn try_from(entries: Vec<MapEntry>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

impl From<PlaceholderMap> for Vec<MapEntry> {
    fn from(map: PlaceholderMap) -> Self {
        map.entries
    }
}
