//! Cover-letter generation
//!
//! A single completion call over the job description and résumé text, with
//! the model's habitual preamble stripped from the reply.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::service::LlmConfig;
use crate::conversation::Message;
use crate::providers::{ChatProvider, CompletionRequest, ProviderError};

const SYSTEM_PROMPT: &str = r#"You are a professional cover letter writer. Create a tailored, compelling cover letter based on the job description and resume provided. Do NOT include phrases like "Here is your cover letter:" or "I have created a cover letter for you:" - just provide the letter itself."#;

#[derive(Debug, Error)]
pub enum CoverLetterError {
    #[error("Please enter a job description")]
    MissingJobDescription,

    #[error("Please upload a resume or paste your resume text")]
    MissingResume,

    #[error("Failed to generate cover letter: {0}")]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverLetterRequest {
    pub job_description: String,
    pub resume_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverLetter {
    pub content: String,
    pub model: String,
}

static PREAMBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(Here is|Here's|I've created|I have created|Please find) (a|your|the) (professional|tailored|customized|personalized|concise|compelling)( and (professional|tailored|customized|personalized|concise|compelling))* cover letter( for you| based on your resume and the job description)*:?\s*",
    )
    .unwrap()
});

static COVER_LETTER_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Cover Letter:?\s*").unwrap());

static DRAFT_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Draft Cover Letter:?\s*").unwrap());

/// Strip the introductory sentence or heading models like to prepend
pub fn clean_response(text: &str) -> String {
    let text = PREAMBLE.replace(text, "");
    let text = COVER_LETTER_HEADING.replace(&text, "");
    let text = DRAFT_HEADING.replace(&text, "");
    text.trim().to_string()
}

pub struct CoverLetterWriter {
    provider: Arc<dyn ChatProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl CoverLetterWriter {
    pub fn new(provider: Arc<dyn ChatProvider>, llm: &LlmConfig) -> Self {
        Self {
            provider,
            model: llm.cover_letter_model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.cover_letter_max_tokens,
            timeout: llm.request_timeout(),
        }
    }

    pub async fn generate(&self, request: &CoverLetterRequest) -> Result<CoverLetter, CoverLetterError> {
        let job_description = request.job_description.trim();
        let resume = request.resume_text.trim();

        if job_description.is_empty() {
            return Err(CoverLetterError::MissingJobDescription);
        }
        if resume.is_empty() {
            return Err(CoverLetterError::MissingResume);
        }

        let completion = CompletionRequest {
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(format!(
                    "Job Description: {}\n\nResume: {}\n\nPlease create a professional cover letter that highlights my relevant skills and experience for this position. Start directly with the cover letter content without any introduction.",
                    job_description, resume
                )),
            ],
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let reply = tokio::time::timeout(self.timeout, self.provider.complete(completion))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout.as_secs()))??;

        tracing::info!(model = %self.model, chars = reply.content.len(), "cover letter generated");

        Ok(CoverLetter {
            content: clean_response(&reply.content),
            model: self.model.clone(),
        })
    }
}
