//! External LLM provider calls.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API with the system prompt as a top-level field.

use cloak_core::{Error, Result};
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::types::{ChatMessage, LLMProvider};

/// Send one non-streaming completion request and return the reply text.
pub async fn complete(
    client: &Client,
    provider: LLMProvider,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    temperature: f64,
    max_tokens: usize,
) -> Result<String> {
    match provider {
        LLMProvider::OpenAI | LLMProvider::Groq => {
            complete_openai_compat(
                client,
                provider.endpoint(),
                messages,
                model,
                api_key,
                temperature,
                max_tokens,
            )
            .await
        }
        LLMProvider::Anthropic => {
            complete_anthropic(client, messages, model, api_key, temperature, max_tokens).await
        }
    }
}

/// Complete against an OpenAI-compatible API (OpenAI, Groq).
async fn complete_openai_compat(
    client: &Client,
    url: &str,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    temperature: f64,
    max_tokens: usize,
) -> Result<String> {
    let msgs: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let body = json!({
        "model": model,
        "messages": msgs,
        "temperature": temperature,
        "max_tokens": max_tokens,
        "response_format": {"type": "json_object"},
    });

    debug!("Requesting completion from {} with model {}", url, model);

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(transport_error)?;

    let parsed = read_json(response).await?;
    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::summarizer("Response had no message content"))
}

/// Complete against Anthropic's Messages API.
async fn complete_anthropic(
    client: &Client,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    temperature: f64,
    max_tokens: usize,
) -> Result<String> {
    // Separate system message from conversation
    let system_msg: Option<&str> = messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.as_str());

    let conv_msgs: Vec<serde_json::Value> = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let mut body = json!({
        "model": model,
        "messages": conv_msgs,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });
    if let Some(sys) = system_msg {
        body["system"] = json!(sys);
    }

    debug!("Requesting completion from Anthropic with model {}", model);

    let response = client
        .post(LLMProvider::Anthropic.endpoint())
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(transport_error)?;

    let parsed = read_json(response).await?;
    let text: String = parsed["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::summarizer("Response had no text content"));
    }
    Ok(text)
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &body));
    }
    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| Error::summarizer(format!("Malformed response body: {}", e)))
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::summarizer(format!("Request timed out: {}", e))
    } else {
        Error::summarizer(format!("Request failed: {}", e))
    }
}

/// Rate limits and server errors are worth retrying; auth and request errors are not.
pub(crate) fn status_error(status: StatusCode, body: &str) -> Error {
    let message = format!("API error {}: {}", status, truncate(body, 300));
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        Error::summarizer(message)
    } else {
        Error::summarizer_fatal(message)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Pull the summary out of a model reply.
///
/// Models are asked for `{"summary": ...}`; the field may be a string or a
/// list of bullet strings, and the JSON may come wrapped in a code fence.
/// Replies that are not JSON are used as-is.
pub fn extract_summary(reply: &str) -> String {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    match serde_json::from_str::<serde_json::Value>(unfenced) {
        Ok(value) => match &value["summary"] {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|i| i.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            _ => trimmed.to_string(),
        },
        Err(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_summary_string() {
        let reply = r#"{"summary": "• <PERSON_0> sued <ORG_2>"}"#;
        assert_eq!(extract_summary(reply), "• <PERSON_0> sued <ORG_2>");
    }

    #[test]
    fn test_extract_summary_array_and_fence() {
        let reply = "```json\n{\"summary\": [\"• a\", \"• b\"]}\n```";
        assert_eq!(extract_summary(reply), "• a\n• b");
    }

    #[test]
    fn test_extract_summary_plain_text() {
        assert_eq!(extract_summary("  just text \n"), "just text");
        assert_eq!(extract_summary(r#"{"other": 1}"#), r#"{"other": 1}"#);
    }

    #[test]
    fn test_status_error_retryability() {
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        assert!(status_error(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(!status_error(StatusCode::UNAUTHORIZED, "bad key").is_retryable());
    }

    #[test]
    fn test_truncate_char_safe() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
