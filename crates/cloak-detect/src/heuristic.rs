//! Heuristic named-entity detection — persons, organizations, addresses and
//! written-out dates from capitalization, titles and suffix lists.
//!
//! Stands in for a statistical NER model; anything implementing
//! `SpanDetector` can replace it as the adapter's primary detector.

use cloak_core::{Language, Result, Span};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::detector::{resolve_overlaps, SpanDetector};

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December";

static TITLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").unwrap()
});
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?: [A-Z][a-z]+)+\b").unwrap());
static ORG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:[A-Z][A-Za-z&.\-]* )+(?:Inc|Corp|Corporation|Company|LLC|Ltd|Co|Industries|Solutions|Group|Holdings|Partners|Bank)\b",
    )
    .unwrap()
});
static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b\d{1,5} (?:[A-Z][a-z]+ )+(?:St|Street|Ave|Avenue|Rd|Road|Dr|Drive|Ln|Lane|Blvd|Boulevard|Ct|Court|Way|Pl|Place)\b",
    )
    .unwrap()
});
static WRITTEN_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:\d{{1,2}}(?:st|nd|rd|th)? (?:{m}) \d{{4}}|(?:{m}) \d{{1,2}}(?:st|nd|rd|th)?,? \d{{4}})\b",
        m = MONTHS
    ))
    .unwrap()
});

// Capitalized words that start sentences or clauses rather than names.
const LEADING_WORDS: &[&str] = &[
    "A", "An", "The", "On", "In", "At", "By", "For", "From", "To", "His", "Her", "Their",
    "Its", "Our", "My", "Your", "This", "That", "These", "Those", "Dear", "When", "After",
    "Before", "If", "Plaintiff", "Defendant", "Judge", "Justice",
];

const WEEKDAYS: &[&str] = &[
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

const STREET_SUFFIXES: &[&str] = &[
    "St", "Street", "Ave", "Avenue", "Rd", "Road", "Dr", "Drive", "Ln", "Lane", "Blvd",
    "Boulevard", "Ct", "Court", "Way", "Pl", "Place",
];

const ORG_SUFFIXES: &[&str] = &[
    "Inc", "Corp", "Corporation", "Company", "LLC", "Ltd", "Co", "Industries", "Solutions",
    "Group", "Holdings", "Partners", "Bank",
];

/// Rule-based stand-in for a named-entity model.
#[derive(Debug, Clone, Default)]
pub struct HeuristicNer;

impl HeuristicNer {
    pub fn new() -> Self {
        Self
    }
}

impl SpanDetector for HeuristicNer {
    fn name(&self) -> &str {
        "heuristic-ner"
    }

    fn detect(&self, text: &str, _language: &Language) -> Result<Vec<Span>> {
        // Push order is priority order for identical ranges.
        let mut spans = Vec::new();

        for m in ADDRESS_RE.find_iter(text) {
            spans.push(Span::new(m.start(), m.end(), "LOCATION", m.as_str()));
        }
        for m in ORG_RE.find_iter(text) {
            if let Some((start, end)) = trim_leading_words(text, m.start(), m.end(), 2) {
                spans.push(Span::new(start, end, "ORG", &text[start..end]));
            }
        }
        for m in WRITTEN_DATE_RE.find_iter(text) {
            spans.push(Span::new(m.start(), m.end(), "DATE", m.as_str()));
        }
        for cap in TITLE_NAME_RE.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                spans.push(Span::new(m.start(), m.end(), "PERSON", m.as_str()));
            }
        }
        for m in NAME_RE.find_iter(text) {
            let Some((start, end)) = trim_leading_words(text, m.start(), m.end(), 2) else {
                continue;
            };
            let candidate = &text[start..end];
            if candidate.split(' ').count() <= 3 && is_person_candidate(candidate) {
                spans.push(Span::new(start, end, "PERSON", candidate));
            }
        }

        Ok(resolve_overlaps(spans))
    }
}

/// Skip leading stop words; keep the rest only if `min_words` words remain.
fn trim_leading_words(
    text: &str,
    start: usize,
    end: usize,
    min_words: usize,
) -> Option<(usize, usize)> {
    let mut start = start;
    loop {
        let slice = &text[start..end];
        let first = slice.split(' ').next().unwrap_or("");
        if !is_leading_word(first) {
            break;
        }
        start += first.len() + 1;
        if start >= end {
            return None;
        }
    }
    let words = text[start..end].split(' ').filter(|w| !w.is_empty()).count();
    (words >= min_words).then_some((start, end))
}

fn is_leading_word(word: &str) -> bool {
    LEADING_WORDS.contains(&word)
        || WEEKDAYS.contains(&word)
        || MONTHS.split('|').any(|month| month == word)
}

fn is_person_candidate(candidate: &str) -> bool {
    let words: Vec<&str> = candidate.split(' ').collect();
    let last = words.last().copied().unwrap_or("");
    if STREET_SUFFIXES.contains(&last) || ORG_SUFFIXES.contains(&last) {
        return false;
    }
    !words.iter().any(|w| MONTHS.split('|').any(|month| month == *w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Vec<Span> {
        HeuristicNer::new().detect(text, &Language::english()).unwrap()
    }

    fn labelled<'a>(spans: &'a [Span], label: &str) -> Vec<&'a str> {
        spans
            .iter()
            .filter(|s| s.label == label)
            .map(|s| s.text.as_str())
            .collect()
    }

    #[test]
    fn test_person_and_org() {
        let spans = detect("John Smith, born 10/05/1985, sued XYZ Corporation.");
        assert_eq!(labelled(&spans, "PERSON"), vec!["John Smith"]);
        assert_eq!(labelled(&spans, "ORG"), vec!["XYZ Corporation"]);
    }

    #[test]
    fn test_org_not_reported_as_person() {
        let spans = detect("She sued Global Tech Solutions last year.");
        assert_eq!(labelled(&spans, "ORG"), vec!["Global Tech Solutions"]);
        assert!(labelled(&spans, "PERSON").is_empty());
    }

    #[test]
    fn test_leading_words_trimmed() {
        let spans = detect("The Smith Holdings board met. On Monday Ann Lee spoke.");
        assert_eq!(labelled(&spans, "ORG"), vec!["Smith Holdings"]);
        assert!(labelled(&spans, "PERSON").contains(&"Ann Lee"));
    }

    #[test]
    fn test_title_name() {
        let spans = detect("Counsel for Dr. Watson objected.");
        assert_eq!(labelled(&spans, "PERSON"), vec!["Watson"]);
    }

    #[test]
    fn test_address_and_written_date() {
        let spans = detect("On 15th March 2023 the tenant at 123 Main St paid.");
        assert_eq!(labelled(&spans, "DATE"), vec!["15th March 2023"]);
        assert_eq!(labelled(&spans, "LOCATION"), vec!["123 Main St"]);
        assert!(labelled(&spans, "PERSON").is_empty());
    }

    #[test]
    fn test_month_first_date() {
        let spans = detect("Signed March 15, 2023 in court.");
        assert_eq!(labelled(&spans, "DATE"), vec!["March 15, 2023"]);
    }

    #[test]
    fn test_spans_valid_against_text() {
        let text = "Dear Ms. Olivia Foster, Software Solutions LLC owes you. Call 777 Pine Lane.";
        for span in detect(text) {
            assert!(span.validate(text).is_ok(), "bad span {:?}", span);
        }
    }
}
