use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sieve_core::{Completion, LlmConfig, SieveError};

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use sieve_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Review this code".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use sieve_review::llm::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Anything that can answer a review prompt.
#[async_trait]
pub trait ReviewModel: Send + Sync {
    /// Send `messages` and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Llm`] when the provider cannot be reached or
    /// answers with an error.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<Completion, SieveError>;
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint:
/// OpenAI, Ollama, vLLM, LiteLLM, etc.
///
/// # Examples
///
/// ```
/// use sieve_core::LlmConfig;
/// use sieve_review::llm::LlmClient;
///
/// let config = LlmConfig {
///     api_key: Some("test-key".into()),
///     ..LlmConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SieveError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, SieveError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SieveError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Full URL of the chat completions endpoint.
    ///
    /// A base URL that already ends in `/v1` is used as is.
    pub fn endpoint(&self) -> String {
        let default_base = if self.config.provider == "ollama" {
            "http://localhost:11434"
        } else {
            "https://api.openai.com"
        };
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(default_base)
            .trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }
}

#[async_trait]
impl ReviewModel for LlmClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<Completion, SieveError> {
        let url = self.endpoint();
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": 0.1,
        });

        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        tracing::debug!(model = %self.config.model, %url, "sending chat completion");
        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| SieveError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(SieveError::Llm(format!("LLM API error {status}: {body_text}")));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SieveError::Llm(format!("failed to parse response: {e}")))?;

        completion_from_response(&response_body)
    }
}

/// Extract the first choice of a chat completions response.
///
/// A `null` content (some providers send it for empty replies) becomes an
/// empty string. `finish_reason == "length"` marks the reply as truncated.
///
/// # Errors
///
/// Returns [`SieveError::Llm`] if the response has no choices.
pub fn completion_from_response(body: &serde_json::Value) -> Result<Completion, SieveError> {
    let choice = body
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| SieveError::Llm(format!("unexpected response structure: {body}")))?;

    let content = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();
    let truncated = choice.get("finish_reason").and_then(|r| r.as_str()) == Some("length");

    Ok(Completion { content, truncated })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_returns_config_model() {
        let config = LlmConfig {
            model: "gpt-4.1-mini".into(),
            ..LlmConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        assert_eq!(client.model(), "gpt-4.1-mini");
    }

    #[test]
    fn endpoint_handles_v1_suffix_and_ollama() {
        let with_v1 = LlmClient::new(&LlmConfig {
            base_url: Some("http://localhost:8000/v1/".into()),
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(with_v1.endpoint(), "http://localhost:8000/v1/chat/completions");

        let ollama = LlmClient::new(&LlmConfig {
            provider: "ollama".into(),
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(ollama.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn chat_message_serializes() {
        let msg = ChatMessage {
            role: Role::System,
            content: "hello".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn completion_reads_content_and_finish_reason() {
        let body = serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": "3 : [Logic] x" },
                "finish_reason": "stop"
            }]
        });
        let c = completion_from_response(&body).unwrap();
        assert_eq!(c.content, "3 : [Logic] x");
        assert!(!c.truncated);

        let body = serde_json::json!({
            "choices": [{ "message": { "content": "3 : [Lo" }, "finish_reason": "length" }]
        });
        assert!(completion_from_response(&body).unwrap().truncated);
    }

    #[test]
    fn null_content_is_empty() {
        let body = serde_json::json!({ "choices": [{ "message": { "content": null } }] });
        assert_eq!(completion_from_response(&body).unwrap().content, "");
    }

    #[test]
    fn missing_choices_is_an_error() {
        let body = serde_json::json!({ "error": "nope" });
        assert!(matches!(
            completion_from_response(&body),
            Err(SieveError::Llm(_))
        ));
    }
}
