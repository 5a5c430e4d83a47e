//! Chat-completion providers

pub mod openai_compat;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::conversation::Message;

pub use openai_compat::{OpenAICompatConfig, OpenAICompatProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

/// One completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Something that turns a message list into one assistant reply
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<Message, ProviderError>;
}

/// Build the provider described by the environment.
///
/// A missing API key is only an error for remote endpoints; local servers
/// are used without one.
pub fn from_config(config: &Config) -> Result<OpenAICompatProvider, ProviderError> {
    let base_url = config.llm_base_url.trim_end_matches('/');
    let is_local = base_url.contains("localhost") || base_url.contains("127.0.0.1");

    let provider_config = match (&config.groq_api_key, is_local) {
        (Some(key), _) => OpenAICompatConfig {
            base_url: base_url.to_string(),
            ..OpenAICompatConfig::groq(key.clone())
        },
        (None, true) => OpenAICompatConfig::local(base_url, config.llm_model.clone()),
        (None, false) => {
            return Err(ProviderError::NotConfigured(
                "GROQ_API_KEY is not set".to_string(),
            ))
        }
    };

    OpenAICompatProvider::new(provider_config)
}

/// Stand-in used when no provider could be configured. Every call fails, so
/// callers fall back to their canned replies.
pub struct UnconfiguredProvider {
    reason: String,
}

impl UnconfiguredProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for UnconfiguredProvider {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<Message, ProviderError> {
        Err(ProviderError::NotConfigured(self.reason.clone()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted provider for unit tests

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    pub enum Scripted {
        Reply(String),
        Fail,
        Hang,
    }

    /// Plays back scripted outcomes in order and records every request.
    /// Once the script runs out it keeps replying "ok".
    pub struct StubProvider {
        script: Mutex<VecDeque<Scripted>>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl StubProvider {
        pub fn new(script: Vec<Scripted>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(reply: &str) -> Self {
            Self::new(vec![Scripted::Reply(reply.to_string())])
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn last_request(&self) -> Option<CompletionRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl ChatProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<Message, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Scripted::Reply(text)) => Ok(Message::assistant(text)),
                Some(Scripted::Fail) => Err(ProviderError::InvalidResponse("scripted failure".into())),
                Some(Scripted::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Message::assistant("too late"))
                }
                None => Ok(Message::assistant("ok")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LLM_BASE_URL;

    fn config(key: Option<&str>, base_url: &str) -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: 3000,
            groq_api_key: key.map(String::from),
            llm_base_url: base_url.into(),
            llm_model: "llama3-8b-8192".into(),
            service_config_path: None,
        }
    }

    #[test]
    fn test_remote_endpoint_requires_key() {
        let err = from_config(&config(None, DEFAULT_LLM_BASE_URL)).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn test_local_endpoint_without_key() {
        let provider = from_config(&config(None, "http://localhost:8000/v1/")).unwrap();
        assert_eq!(provider.config().base_url, "http://localhost:8000/v1");
        assert!(provider.config().api_key.is_none());
    }

    #[test]
    fn test_key_keeps_configured_base_url() {
        let provider = from_config(&config(Some("k"), "https://example.test/v1")).unwrap();
        assert_eq!(provider.config().base_url, "https://example.test/v1");
        assert_eq!(provider.config().api_key.as_deref(), Some("k"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_always_fails() {
        let provider = UnconfiguredProvider::new("no key");
        let result = provider
            .complete(CompletionRequest {
                messages: vec![Message::user("hi")],
                model: "m".into(),
                temperature: 0.7,
                max_tokens: 10,
            })
            .await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
