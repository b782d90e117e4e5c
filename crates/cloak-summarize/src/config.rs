//! LLM configuration loading and provider selection.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{LLMProvider, ResolvedProvider};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Stored LLM configuration (`llm-config.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}
fn default_temperature() -> f64 {
    0.0
}
fn default_max_tokens() -> usize {
    512
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: default_preferred(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            groq_model: default_groq_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Like [`LLMConfig::load`] with an explicit lookup for API key fallbacks.
    pub fn load_with<F>(config_path: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: LLMConfig = match std::fs::read_to_string(config_path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!("Ignoring malformed {}: {}", config_path.display(), e);
                LLMConfig::default()
            }),
            Err(_) => {
                debug!("No LLM config at {}, using env", config_path.display());
                LLMConfig::default()
            }
        };

        // Env vars as fallback for API keys
        if config.openai_api_key.is_none() {
            config.openai_api_key = lookup("OPENAI_API_KEY");
        }
        if config.anthropic_api_key.is_none() {
            config.anthropic_api_key = lookup("ANTHROPIC_API_KEY");
        }
        if config.groq_api_key.is_none() {
            config.groq_api_key = lookup("GROQ_API_KEY");
        }

        config
    }

    /// Resolve which provider and model to use.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        let pick = |provider: LLMProvider, model: &str, key: &Option<String>| {
            key.as_ref()
                .filter(|k| !k.trim().is_empty())
                .map(|k| ResolvedProvider {
                    provider,
                    model: model.to_string(),
                    api_key: k.clone(),
                })
        };

        // Explicit preference
        if self.preferred_provider != "auto" {
            return match self.preferred_provider.parse::<LLMProvider>().ok()? {
                LLMProvider::OpenAI => pick(LLMProvider::OpenAI, &self.openai_model, &self.openai_api_key),
                LLMProvider::Anthropic => {
                    pick(LLMProvider::Anthropic, &self.anthropic_model, &self.anthropic_api_key)
                }
                LLMProvider::Groq => pick(LLMProvider::Groq, &self.groq_model, &self.groq_api_key),
            };
        }

        // Auto mode: Anthropic > Groq > OpenAI
        pick(LLMProvider::Anthropic, &self.anthropic_model, &self.anthropic_api_key)
            .or_else(|| pick(LLMProvider::Groq, &self.groq_model, &self.groq_api_key))
            .or_else(|| pick(LLMProvider::OpenAI, &self.openai_model, &self.openai_api_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LLMConfig::load_with(&dir.path().join("missing.json"), no_env);
        assert_eq!(config.openai_model, DEFAULT_OPENAI_MODEL);
        assert!(config.resolve_provider().is_none());
    }

    #[test]
    fn test_env_fallback_and_auto_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = LLMConfig::load_with(&dir.path().join("missing.json"), |key| match key {
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            "GROQ_API_KEY" => Some("gsk-groq".into()),
            _ => None,
        });
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::Groq);
        assert_eq!(resolved.api_key, "gsk-groq");
    }

    #[test]
    fn test_file_preference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(
            &path,
            r#"{"preferred_provider": "openai", "openai_api_key": "sk-file", "openai_model": "gpt-4o"}"#,
        )
        .unwrap();
        let config = LLMConfig::load_with(&path, |_| Some("from-env".into()));
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::OpenAI);
        assert_eq!(resolved.model, "gpt-4o");
        assert_eq!(resolved.api_key, "sk-file");
        assert_eq!(config.max_tokens, 512);
    }

    #[test]
    fn test_preferred_without_key() {
        let config = LLMConfig {
            preferred_provider: "anthropic".into(),
            openai_api_key: Some("sk".into()),
            ..LLMConfig::default()
        };
        assert!(config.resolve_provider().is_none());
    }
}
