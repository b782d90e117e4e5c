//! Entity source adapter — one `detect` contract over several providers.

use std::collections::HashSet;

use cloak_core::{CloakConfig, Error, Language, Result, Span};
use tracing::{debug, info, warn};

use crate::detector::SpanDetector;
use crate::heuristic::HeuristicNer;
use crate::patterns::PatternRecognizer;

/// Combines a primary detector with secondary recognizers.
///
/// Created once and reused across documents; holds no per-document state.
pub struct EntitySourceAdapter {
    primary: Box<dyn SpanDetector>,
    secondary: Vec<Box<dyn SpanDetector>>,
    languages: Vec<Language>,
}

impl EntitySourceAdapter {
    pub fn builder(primary: impl SpanDetector + 'static) -> AdapterBuilder {
        AdapterBuilder::new(primary)
    }

    pub fn supported_languages(&self) -> &[Language] {
        &self.languages
    }

    /// Detector names, primary first.
    pub fn detector_names(&self) -> Vec<&str> {
        std::iter::once(self.primary.name())
            .chain(self.secondary.iter().map(|d| d.name()))
            .collect()
    }

    /// Detect spans in `text`, ordered by position (longest first on ties).
    ///
    /// Spans a detector reports that fail validation are dropped with a
    /// warning. A secondary detector's span whose literal text was already
    /// reported by an earlier detector is suppressed, so the same value is
    /// never offered twice under different labels.
    pub fn detect(&self, text: &str, language: &Language) -> Result<Vec<Span>> {
        if text.is_empty() {
            return Err(Error::EmptyDocument);
        }
        if !language.is_supported_by(&self.languages) {
            return Err(Error::UnsupportedLanguage(language.to_string()));
        }

        let mut accepted: Vec<Span> = Vec::new();
        let mut known_values: HashSet<String> = HashSet::new();
        let mut dropped = 0usize;
        let mut suppressed = 0usize;

        let detectors = std::iter::once(&self.primary).chain(self.secondary.iter());
        for (i, detector) in detectors.enumerate() {
            let is_secondary = i > 0;
            let spans = run_detector(detector.as_ref(), text, language)?;
            let mut reported: Vec<String> = Vec::new();

            for span in spans {
                if let Err(e) = span.validate(text) {
                    warn!(
                        detector = detector.name(),
                        label = %span.label,
                        "Dropping invalid span: {}",
                        e
                    );
                    dropped += 1;
                    continue;
                }
                if is_secondary && known_values.contains(&span.text) {
                    suppressed += 1;
                    continue;
                }
                reported.push(span.text.clone());
                accepted.push(span);
            }

            known_values.extend(reported);
        }

        accepted.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        debug!(
            "Detected {} spans ({} invalid dropped, {} duplicates suppressed, lang={})",
            accepted.len(),
            dropped,
            suppressed,
            language
        );

        Ok(accepted)
    }
}

fn run_detector(detector: &dyn SpanDetector, text: &str, language: &Language) -> Result<Vec<Span>> {
    detector.detect(text, language).map_err(|e| match e {
        Error::Detection { .. } | Error::UnsupportedLanguage(_) => e,
        other => Error::Detection {
            detector: detector.name().to_string(),
            message: other.to_string(),
        },
    })
}

/// Explicit construction of an [`EntitySourceAdapter`].
pub struct AdapterBuilder {
    primary: Box<dyn SpanDetector>,
    secondary: Vec<Box<dyn SpanDetector>>,
    languages: Vec<Language>,
}

impl AdapterBuilder {
    pub fn new(primary: impl SpanDetector + 'static) -> Self {
        Self {
            primary: Box::new(primary),
            secondary: Vec::new(),
            languages: vec![Language::english()],
        }
    }

    /// Add a secondary detector; secondaries run in insertion order.
    pub fn secondary(mut self, detector: impl SpanDetector + 'static) -> Self {
        self.secondary.push(Box::new(detector));
        self
    }

    pub fn languages(mut self, languages: Vec<Language>) -> Self {
        if !languages.is_empty() {
            self.languages = languages;
        }
        self
    }

    pub fn build(self) -> EntitySourceAdapter {
        EntitySourceAdapter {
            primary: self.primary,
            secondary: self.secondary,
            languages: self.languages,
        }
    }
}

/// Build the default adapter: heuristic NER first, pattern recognizers second.
pub fn create_adapter(config: &CloakConfig) -> EntitySourceAdapter {
    let patterns = PatternRecognizer::new();
    info!(
        "Entity source adapter: heuristic-ner + {} pattern recognizers, languages={:?}",
        patterns.len(),
        config
            .supported_languages
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
    );

    AdapterBuilder::new(HeuristicNer::new())
        .secondary(patterns)
        .languages(config.supported_languages.clone())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Detector returning a fixed list of spans.
    struct Fixed(&'static str, Vec<Span>);

    impl SpanDetector for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn detect(&self, _text: &str, _language: &Language) -> Result<Vec<Span>> {
            Ok(self.1.clone())
        }
    }

    struct Failing;

    impl SpanDetector for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn detect(&self, _text: &str, _language: &Language) -> Result<Vec<Span>> {
            Err(Error::Config("model not loaded".into()))
        }
    }

    const CASE: &str = "John Smith, born 10/05/1985, sued XYZ Corporation.";

    #[test]
    fn test_default_adapter_concrete_case() {
        let adapter = create_adapter(&CloakConfig::default());
        let spans = adapter.detect(CASE, &Language::english()).unwrap();
        let found: Vec<(&str, &str)> = spans
            .iter()
            .map(|s| (s.label.as_str(), s.text.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("PERSON", "John Smith"),
                ("DATE", "10/05/1985"),
                ("ORG", "XYZ Corporation"),
            ]
        );
    }

    #[test]
    fn test_unsupported_language() {
        let adapter = create_adapter(&CloakConfig::default());
        let fr = Language::parse("fr").unwrap();
        assert!(matches!(
            adapter.detect(CASE, &fr),
            Err(Error::UnsupportedLanguage(tag)) if tag == "fr"
        ));
    }

    #[test]
    fn test_empty_document() {
        let adapter = create_adapter(&CloakConfig::default());
        assert!(matches!(
            adapter.detect("", &Language::english()),
            Err(Error::EmptyDocument)
        ));
    }

    #[test]
    fn test_secondary_duplicates_suppressed() {
        let text = "Jordan met Jordan.";
        let adapter = AdapterBuilder::new(Fixed("ner", vec![Span::new(0, 6, "PERSON", "Jordan")]))
            .secondary(Fixed(
                "rules",
                vec![
                    Span::new(11, 17, "ORG", "Jordan"),
                    Span::new(7, 10, "WORD", "met"),
                ],
            ))
            .build();
        let spans = adapter.detect(text, &Language::english()).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].label, "PERSON");
        assert_eq!(spans[1].text, "met");
    }

    #[test]
    fn test_invalid_spans_dropped_not_fatal() {
        let adapter = AdapterBuilder::new(Fixed(
            "ner",
            vec![
                Span::new(0, 0, "PERSON", ""),
                Span::new(5, 500, "PERSON", "oops"),
            ],
        ))
        .build();
        let spans = adapter.detect(CASE, &Language::english()).unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_detector_failure_names_detector() {
        let adapter = AdapterBuilder::new(HeuristicNer::new()).secondary(Failing).build();
        match adapter.detect(CASE, &Language::english()) {
            Err(Error::Detection { detector, .. }) => assert_eq!(detector, "failing"),
            other => panic!("expected detection error, got {:?}", other),
        }
    }

    #[test]
    fn test_legal_case_entities() {
        let text = "On 15th March 2023, John Smith, born on 10/05/1985, filed a complaint against \
                    XYZ Corporation. The plaintiff, residing at 123 Main St, London, can be reached \
                    at +44 20 1234 5678 or john.smith@email.com. His UK ID number is AB123456C.";
        let adapter = create_adapter(&CloakConfig::default());
        let spans = adapter.detect(text, &Language::english()).unwrap();
        let values: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        for expected in [
            "15th March 2023",
            "John Smith",
            "10/05/1985",
            "XYZ Corporation",
            "123 Main St",
            "+44 20 1234 5678",
            "john.smith@email.com",
            "AB123456C",
        ] {
            assert!(values.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_detector_names() {
        let adapter = create_adapter(&CloakConfig::default());
        assert_eq!(adapter.detector_names(), vec!["heuristic-ner", "patterns"]);
    }
}
