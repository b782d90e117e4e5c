//! Summarization boundary — redacted text in, short summary out.
//!
//! The core treats summarization as an opaque `Summarizer`. `LlmSummarizer`
//! calls an external chat-completion API (OpenAI, Anthropic or Groq) with a
//! fixed instruction to keep placeholder tokens verbatim.

pub mod config;
pub mod providers;
pub mod summarizer;
pub mod types;

pub use config::LLMConfig;
pub use summarizer::{LlmSummarizer, Summarizer, SUMMARY_INSTRUCTION};
pub use types::*;
