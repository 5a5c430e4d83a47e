//! OpenAI-compatible provider
//!
//! Speaks the chat completions format used by Groq, OpenAI, vLLM, LM Studio
//! and similar servers. Only plain text replies are supported.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::Message;

use super::{ChatProvider, CompletionRequest, ProviderError};

/// Wire-format chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Clone)]
pub struct OpenAICompatConfig {
    /// Base URL for the API (e.g., https://api.groq.com/openai/v1)
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Used when a request names no model
    pub default_model: String,
    /// Transport-level timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAICompatConfig {
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self {
            base_url: crate::config::DEFAULT_LLM_BASE_URL.to_string(),
            api_key: Some(api_key.into()),
            default_model: crate::config::DEFAULT_LLM_MODEL.to_string(),
            timeout_secs: 60,
        }
    }

    /// Local server (vLLM, LM Studio, etc.)
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            default_model: model.into(),
            timeout_secs: 300, // local inference can be slower
        }
    }
}

pub struct OpenAICompatProvider {
    config: OpenAICompatConfig,
    client: Client,
}

impl OpenAICompatProvider {
    pub fn new(config: OpenAICompatConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OpenAICompatConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl ChatProvider for OpenAICompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Message, ProviderError> {
        let body = ChatCompletionRequest {
            model: if request.model.is_empty() {
                self.config.default_model.clone()
            } else {
                request.model
            },
            messages: request.messages.iter().map(ChatMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut req_builder = self.client.post(self.completions_url());
        if let Some(ref api_key) = self.config.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        tracing::debug!(model = %body.model, messages = body.messages.len(), "chat completion request");

        let response = req_builder.json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::InvalidResponse(describe_error(status, &text)));
        }

        let reply = parse_reply(&text)?;
        Ok(Message::assistant(reply))
    }
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error_resp) => format!("API error: {}", error_resp.error.message),
        Err(_) => format!("HTTP {}: {}", status, body),
    }
}

/// Pull the first choice's text out of a completion body. Blank replies are
/// treated as invalid.
fn parse_reply(body: &str) -> Result<String, ProviderError> {
    let completion: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::InvalidResponse(format!("Failed to parse response: {} - Body: {}", e, body))
    })?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?
        .message
        .content
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(ProviderError::InvalidResponse("Empty reply".to_string()));
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    #[test]
    fn test_config_presets() {
        let groq = OpenAICompatConfig::groq("groq-key");
        assert!(groq.base_url.contains("groq.com"));
        assert_eq!(groq.api_key, Some("groq-key".to_string()));

        let local = OpenAICompatConfig::local("http://localhost:8000/v1", "llama-3");
        assert!(local.api_key.is_none());
        assert_eq!(local.default_model, "llama-3");
    }

    #[test]
    fn test_message_conversion() {
        let msg = Message {
            role: Role::System,
            content: "Be brief".to_string(),
        };
        let chat_msg = ChatMessage::from(&msg);
        assert_eq!(chat_msg.role, "system");
        assert_eq!(chat_msg.content, "Be brief");
    }

    #[test]
    fn test_parse_reply() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Walk me through it."}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "Walk me through it.");

        let blank = r#"{"choices":[{"message":{"role":"assistant","content":"  "}}]}"#;
        assert!(matches!(parse_reply(blank), Err(ProviderError::InvalidResponse(_))));

        let none = r#"{"choices":[]}"#;
        assert!(matches!(parse_reply(none), Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_error_body_is_described() {
        let body = r#"{"error":{"message":"rate limited","type":"tokens"}}"#;
        assert_eq!(
            describe_error(reqwest::StatusCode::TOO_MANY_REQUESTS, body),
            "API error: rate limited"
        );
        assert!(describe_error(reqwest::StatusCode::BAD_GATEWAY, "oops").starts_with("HTTP 502"));
    }
}
