//! Detected spans and language tags.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A detected sensitive region of a document.
///
/// `start..end` is a half-open byte range into the UTF-8 source text and
/// always falls on `char` boundaries once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// Category assigned by the detector (PERSON, DATE, ORG, ...).
    pub label: String,
    /// The literal substring covered by the range.
    pub text: String,
}

impl Span {
    pub fn new(start: usize, end: usize, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
            text: text.into(),
        }
    }

    /// Build a span from a byte range, copying the covered text out of `doc`.
    pub fn from_range(doc: &str, start: usize, end: usize, label: impl Into<String>) -> Result<Self> {
        let text = doc
            .get(start..end)
            .ok_or_else(|| Error::invalid_span(start, end, "range outside document"))?;
        let span = Self::new(start, end, label, text);
        span.validate(doc)?;
        Ok(span)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check `0 <= start < end <= len(doc)` and that the recorded text matches.
    pub fn validate(&self, doc: &str) -> Result<()> {
        if self.text.is_empty() {
            return Err(Error::invalid_span(self.start, self.end, "empty text"));
        }
        if self.start >= self.end || self.end > doc.len() {
            return Err(Error::invalid_span(self.start, self.end, "range outside document"));
        }
        match doc.get(self.start..self.end) {
            Some(slice) if slice == self.text => {}
            Some(_) => {
                return Err(Error::invalid_span(
                    self.start,
                    self.end,
                    "text does not match document",
                ))
            }
            None => {
                return Err(Error::invalid_span(self.start, self.end, "not on a char boundary"))
            }
        }
        if normalize_label(&self.label).is_empty() {
            return Err(Error::invalid_span(self.start, self.end, "empty label"));
        }
        Ok(())
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Normalize a detector label to `[A-Z0-9_]+`.
///
/// Placeholders are built from labels, so every placeholder token matches
/// `<[A-Z0-9_]+>` regardless of what a detector reported.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// A normalized language tag (`"en"`, `"en-gb"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    pub fn parse(tag: &str) -> Result<Self> {
        let normalized = tag.trim().replace('_', "-").to_ascii_lowercase();
        let valid = !normalized.is_empty()
            && normalized
                .split('-')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()));
        if !valid {
            return Err(Error::UnsupportedLanguage(tag.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn english() -> Self {
        Self("en".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary subtag (`"en"` for `"en-gb"`).
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Whether this tag is covered by `supported`, exactly or by primary subtag.
    pub fn is_supported_by(&self, supported: &[Language]) -> bool {
        supported
            .iter()
            .any(|s| s.0 == self.0 || s.0 == self.primary())
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::english()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Language {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.0
    }
}
