//! Redaction — substitute mapped values with their placeholders.

use cloak_core::Span;
use tracing::debug;

use crate::placeholder::{MapEntry, PlaceholderMap, TOKEN_RE};

enum Segment<'m> {
    Raw(String),
    Token(&'m str),
}

/// Replace every occurrence of every mapped value with its placeholder.
///
/// Values are substituted longest first (ties in emission order), so a value
/// that is a substring of another ("Main St" in "123 Main St") can never
/// split the longer match. Matching is literal. Text already turned into a
/// placeholder is never searched again, so short values cannot rewrite the
/// inside of an inserted token.
pub fn redact(text: &str, map: &PlaceholderMap) -> String {
    if map.is_empty() {
        return text.to_string();
    }

    let mut order: Vec<&MapEntry> = map.entries().iter().collect();
    order.sort_by(|a, b| b.original.chars().count().cmp(&a.original.chars().count()));

    let mut segments = vec![Segment::Raw(text.to_string())];
    let mut replaced = 0usize;

    for entry in order {
        let needle = entry.original.as_str();
        let mut next = Vec::with_capacity(segments.len());

        for segment in segments {
            match segment {
                Segment::Raw(raw) if raw.contains(needle) => {
                    let mut parts = raw.split(needle).peekable();
                    while let Some(part) = parts.next() {
                        if !part.is_empty() {
                            next.push(Segment::Raw(part.to_string()));
                        }
                        if parts.peek().is_some() {
                            next.push(Segment::Token(entry.placeholder.as_str()));
                            replaced += 1;
                        }
                    }
                }
                other => next.push(other),
            }
        }
        segments = next;
    }

    debug!(
        "Redacted {} occurrences of {} values",
        replaced,
        map.len()
    );

    segments
        .iter()
        .map(|s| match s {
            Segment::Raw(raw) => raw.as_str(),
            Segment::Token(token) => token,
        })
        .collect()
}

/// Mapped originals still visible in `redacted` outside placeholder tokens.
///
/// Empty for any output of [`redact`]; used as a post-condition check.
pub fn find_residuals<'m>(redacted: &str, map: &'m PlaceholderMap) -> Vec<&'m str> {
    let fragments: Vec<&str> = TOKEN_RE.split(redacted).collect();
    map.entries()
        .iter()
        .map(|e| e.original.as_str())
        .filter(|original| {
            !original.is_empty() && fragments.iter().any(|f| f.contains(original))
        })
        .collect()
}

/// Convenience for callers that hold spans rather than a map.
pub fn redact_spans(text: &str, spans: &[Span]) -> (String, PlaceholderMap) {
    let map = PlaceholderMap::build(spans, text);
    let redacted = redact(text, &map);
    (redacted, map)
}
