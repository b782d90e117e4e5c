//! Cloak Detect — entity source adapter.
//!
//! Provides the `SpanDetector` trait for span detection providers.
//! `HeuristicNer` covers names, organizations, addresses and written dates
//! with capitalization and suffix heuristics; `PatternRecognizer` is a
//! label-keyed registry of regex recognizers for structured values (email,
//! phone, SSN, ...). `EntitySourceAdapter` combines one primary detector
//! with any number of secondary ones behind `detect(text, language)`.

pub mod adapter;
pub mod detector;
pub mod heuristic;
pub mod patterns;

pub use adapter::{create_adapter, AdapterBuilder, EntitySourceAdapter};
pub use detector::{resolve_overlaps, SpanDetector};
pub use heuristic::HeuristicNer;
pub use patterns::PatternRecognizer;
