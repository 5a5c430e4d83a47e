//! Service tuning loaded from a TOML file
//!
//! Every section is optional. A deployment typically only overrides the
//! model or pins the mock runner's seed:
//!
//! ```toml
//! [llm]
//! model = "llama3-70b-8192"
//!
//! [execution]
//! delay_ms = 0
//! seed = 7
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::prompts::PromptOverrides;

/// Root service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Chat-completion settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Mock execution settings
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Interviewer conversation settings
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// System prompt overrides per situation
    #[serde(default)]
    pub prompts: PromptOverrides,
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.execution;
        for (name, value) in [
            ("execution.base_pass_probability", e.base_pass_probability),
            ("execution.optimal_pass_probability", e.optimal_pass_probability),
            ("execution.issue_penalty", e.issue_penalty),
            ("execution.min_pass_probability", e.min_pass_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.conversation.history_limit == 0 {
            return Err(ConfigError::Validation(
                "conversation.history_limit must be at least 1".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Validation(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }

        Ok(())
    }
}

/// Chat-completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Interviewer model; falls back to `LLM_MODEL`
    #[serde(default)]
    pub model: Option<String>,

    /// Model used for cover letters
    #[serde(default = "default_cover_letter_model")]
    pub cover_letter_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token cap for interviewer replies
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_cover_letter_max_tokens")]
    pub cover_letter_max_tokens: u32,

    /// How long a caller waits on the interviewer before giving up
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_cover_letter_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    300
}

fn default_cover_letter_max_tokens() -> u32 {
    1500
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: None,
            cover_letter_model: default_cover_letter_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            cover_letter_max_tokens: default_cover_letter_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Mock execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Artificial latency before results are reported
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Seed for the grading RNG; unset means a fresh entropy seed per process
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_base_pass_probability")]
    pub base_pass_probability: f64,

    #[serde(default = "default_optimal_pass_probability")]
    pub optimal_pass_probability: f64,

    /// Subtracted once per detected issue
    #[serde(default = "default_issue_penalty")]
    pub issue_penalty: f64,

    #[serde(default = "default_min_pass_probability")]
    pub min_pass_probability: f64,
}

fn default_delay_ms() -> u64 {
    1500
}

fn default_base_pass_probability() -> f64 {
    0.5
}

fn default_optimal_pass_probability() -> f64 {
    0.9
}

fn default_issue_penalty() -> f64 {
    0.15
}

fn default_min_pass_probability() -> f64 {
    0.05
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            seed: None,
            base_pass_probability: default_base_pass_probability(),
            optimal_pass_probability: default_optimal_pass_probability(),
            issue_penalty: default_issue_penalty(),
            min_pass_probability: default_min_pass_probability(),
        }
    }
}

/// Interviewer conversation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Messages of history replayed to the model
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Delay between a test run and the follow-up commentary request
    #[serde(default = "default_feedback_debounce_ms")]
    pub feedback_debounce_ms: u64,

    /// How long a processed result blocks further follow-ups
    #[serde(default = "default_processed_reset_ms")]
    pub processed_reset_ms: u64,

    /// Interviews untouched for this long are dropped (0 keeps them forever)
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

fn default_history_limit() -> usize {
    10
}

fn default_feedback_debounce_ms() -> u64 {
    1000
}

fn default_processed_reset_ms() -> u64 {
    5000
}

fn default_idle_ttl_secs() -> u64 {
    3600
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            feedback_debounce_ms: default_feedback_debounce_ms(),
            processed_reset_ms: default_processed_reset_ms(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
