//! Runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::span::Language;

/// Top-level Cloak configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloakConfig {
    /// Language tag passed to detectors when the caller gives none.
    pub default_language: Language,
    /// Tags the entity source adapter accepts.
    pub supported_languages: Vec<Language>,
    /// Per-attempt timeout for the summarizer call.
    pub summary_timeout_secs: u64,
    /// Extra attempts after the first summarizer failure.
    pub summary_retries: u32,
    /// Documents processed concurrently in a batch.
    pub max_concurrency: usize,
    /// HTTP server port.
    pub port: u16,
    /// LLM provider configuration (`llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl Default for CloakConfig {
    fn default() -> Self {
        Self {
            default_language: Language::english(),
            supported_languages: vec![Language::english()],
            summary_timeout_secs: 30,
            summary_retries: 2,
            max_concurrency: 4,
            port: 3003,
            llm_config_file: PathBuf::from("llm-config.json"),
        }
    }
}

impl CloakConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (env in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(tag) = lookup("CLOAK_LANGUAGE") {
            config.default_language = Language::parse(&tag)
                .map_err(|_| Error::Config(format!("CLOAK_LANGUAGE is not a language tag: {}", tag)))?;
        }

        if let Some(tags) = lookup("CLOAK_LANGUAGES") {
            let parsed: Result<Vec<Language>> = tags
                .split(',')
                .filter(|t| !t.trim().is_empty())
                .map(Language::parse)
                .collect();
            let languages =
                parsed.map_err(|e| Error::Config(format!("CLOAK_LANGUAGES: {}", e)))?;
            if !languages.is_empty() {
                config.supported_languages = languages;
            }
        }

        if !config
            .default_language
            .is_supported_by(&config.supported_languages)
        {
            warn!(
                "Default language {} is not in the supported set; adding it",
                config.default_language
            );
            config.supported_languages.push(config.default_language.clone());
        }

        config.summary_timeout_secs =
            parse_or(&lookup, "CLOAK_SUMMARY_TIMEOUT_SECS", config.summary_timeout_secs);
        config.summary_retries = parse_or(&lookup, "CLOAK_SUMMARY_RETRIES", config.summary_retries);
        config.max_concurrency =
            parse_or(&lookup, "CLOAK_CONCURRENCY", config.max_concurrency).max(1);
        config.port = parse_or(&lookup, "PORT", config.port);

        if let Some(path) = lookup("CLOAK_LLM_CONFIG") {
            config.llm_config_file = PathBuf::from(path);
        }

        if config.summary_timeout_secs == 0 {
            return Err(Error::Config("CLOAK_SUMMARY_TIMEOUT_SECS must be > 0".into()));
        }

        Ok(config)
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs(self.summary_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("Ignoring unparsable {}={}", key, raw);
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CloakConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.default_language.as_str(), "en");
        assert_eq!(config.summary_timeout(), Duration::from_secs(30));
        assert_eq!(config.summary_retries, 2);
        assert_eq!(config.port, 3003);
    }

    #[test]
    fn test_overrides() {
        let config = CloakConfig::from_lookup(lookup(&[
            ("CLOAK_LANGUAGES", "en, de"),
            ("CLOAK_SUMMARY_TIMEOUT_SECS", "5"),
            ("CLOAK_CONCURRENCY", "0"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.supported_languages.len(), 2);
        assert_eq!(config.summary_timeout_secs, 5);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_default_language_added_to_supported() {
        let config = CloakConfig::from_lookup(lookup(&[("CLOAK_LANGUAGE", "fr")])).unwrap();
        assert!(config
            .default_language
            .is_supported_by(&config.supported_languages));
    }

    #[test]
    fn test_bad_values() {
        let config = CloakConfig::from_lookup(lookup(&[("PORT", "not-a-port")])).unwrap();
        assert_eq!(config.port, 3003);
        assert!(CloakConfig::from_lookup(lookup(&[("CLOAK_LANGUAGE", "!!")])).is_err());
        assert!(CloakConfig::from_lookup(lookup(&[("CLOAK_SUMMARY_TIMEOUT_SECS", "0")])).is_err());
    }
}
