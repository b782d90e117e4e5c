//! Error types for Cloak.

use serde::Serialize;
use thiserror::Error;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Detection,
    Mapping,
    Summarization,
    Restoration,
    Configuration,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Detection => write!(f, "detection"),
            Self::Mapping => write!(f, "mapping"),
            Self::Summarization => write!(f, "summarization"),
            Self::Restoration => write!(f, "restoration"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Empty document")]
    EmptyDocument,

    #[error("Detector '{detector}' failed: {message}")]
    Detection { detector: String, message: String },

    #[error("Invalid span {start}..{end}: {reason}")]
    InvalidSpan {
        start: usize,
        end: usize,
        reason: String,
    },

    #[error("Invalid placeholder map: {0}")]
    InvalidMap(String),

    #[error("Summarizer unavailable: {message}")]
    SummarizerUnavailable { message: String, retryable: bool },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Transient summarizer failure that can be retried with the same map.
    pub fn summarizer(message: impl Into<String>) -> Self {
        Self::SummarizerUnavailable {
            message: message.into(),
            retryable: true,
        }
    }

    /// Summarizer failure that will not go away on retry (bad key, bad request).
    pub fn summarizer_fatal(message: impl Into<String>) -> Self {
        Self::SummarizerUnavailable {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_span(start: usize, end: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSpan {
            start,
            end,
            reason: reason.into(),
        }
    }

    /// Which stage of the anonymize → summarize → restore cycle failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::UnsupportedLanguage(_) | Self::EmptyDocument | Self::Detection { .. } => {
                Stage::Detection
            }
            Self::InvalidSpan { .. } => Stage::Mapping,
            Self::InvalidMap(_) => Stage::Restoration,
            Self::SummarizerUnavailable { .. } => Stage::Summarization,
            Self::Io(_) | Self::Json(_) | Self::Config(_) => Stage::Configuration,
        }
    }

    /// Only summarizer failures are retryable; detection and mapping are pure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SummarizerUnavailable { retryable: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        assert_eq!(Error::UnsupportedLanguage("xx".into()).stage(), Stage::Detection);
        assert_eq!(Error::invalid_span(0, 0, "empty").stage(), Stage::Mapping);
        assert_eq!(Error::InvalidMap("dup".into()).stage(), Stage::Restoration);
        assert_eq!(Error::summarizer("timeout").stage(), Stage::Summarization);
        assert_eq!(Error::Config("bad".into()).stage(), Stage::Configuration);
    }

    #[test]
    fn test_retryable() {
        assert!(Error::summarizer("connection reset").is_retryable());
        assert!(!Error::summarizer_fatal("401 Unauthorized").is_retryable());
        assert!(!Error::EmptyDocument.is_retryable());
    }

    #[test]
    fn test_display_names_stage_detail() {
        let err = Error::Detection {
            detector: "patterns".into(),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Detector 'patterns' failed: boom");
        assert_eq!(Stage::Summarization.to_string(), "summarization");
    }
}
