//! Application configuration

pub mod prompts;
pub mod service;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use prompts::PromptSet;
pub use service::{ConfigError, ServiceConfig};

/// Default OpenAI-compatible endpoint (Groq)
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default interviewer model
pub const DEFAULT_LLM_MODEL: &str = "llama3-8b-8192";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Bearer token for the chat-completion endpoint
    #[serde(skip_serializing)]
    pub groq_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    /// Optional TOML file with tuning for the interviewer and the mock runner
    pub service_config_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            groq_api_key: env::var("GROQ_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            llm_base_url: env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.into()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.into()),
            service_config_path: env::var("COACH_CONFIG").ok().map(PathBuf::from),
        })
    }

    /// Load the service tuning file, falling back to defaults when none is configured
    pub fn load_service_config(&self) -> Result<ServiceConfig, ConfigError> {
        let mut service = match &self.service_config_path {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };

        // The env model wins unless the file names one explicitly
        if service.llm.model.is_none() {
            service.llm.model = Some(self.llm_model.clone());
        }

        service.validate()?;
        Ok(service)
    }
}
