//! Cloak Core — span model, language tags, error taxonomy, configuration.

pub mod config;
pub mod error;
pub mod span;

pub use config::CloakConfig;
pub use error::{Error, Result, Stage};
pub use span::{normalize_label, Language, Span};
