//! Simulated interviewer
//!
//! Picks a system prompt for the current situation, sends it with the rolling
//! history to the chat provider, and keeps the conversation going with canned
//! replies when the provider fails.

use std::sync::Arc;

use crate::analyzer::{is_code_empty, CodeAnalysis};
use crate::catalog::{Language, Problem};
use crate::config::prompts::builtin;
use crate::config::service::LlmConfig;
use crate::config::{PromptSet, DEFAULT_LLM_MODEL};
use crate::conversation::{ConversationSession, Message};
use crate::execution::ExecutionSummary;
use crate::providers::{ChatProvider, CompletionRequest};

/// Sentinel last-message that asks for the opening greeting
pub const START_INTERVIEW: &str = "START_INTERVIEW";

/// Words in the candidate's message that mean they are talking about their code
const CODE_KEYWORDS: &[&str] = &[
    "solution",
    "algorithm",
    "approach",
    "complexity",
    "code",
    "optimize",
    "optimise",
    "implement",
];

/// What the candidate is currently doing, as far as the prompt is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Situation {
    Greeting,
    EmptyCode,
    TestResults,
    DiscussingCode,
    General,
}

/// Everything the interviewer looks at for one turn
#[derive(Debug, Clone, Copy)]
pub struct InterviewContext<'a> {
    pub problem: &'a Problem,
    pub language: &'a Language,
    pub code: &'a str,
    pub last_message: &'a str,
    pub test_results: Option<&'a ExecutionSummary>,
    pub analysis: Option<&'a CodeAnalysis>,
}

impl InterviewContext<'_> {
    pub fn situation(&self) -> Situation {
        if self.last_message == START_INTERVIEW {
            return Situation::Greeting;
        }

        if let Some(summary) = self.test_results {
            return if summary.is_empty {
                Situation::EmptyCode
            } else {
                Situation::TestResults
            };
        }

        let lowered = self.last_message.to_lowercase();
        if CODE_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            return if is_code_empty(self.code) {
                Situation::EmptyCode
            } else {
                Situation::DiscussingCode
            };
        }

        Situation::General
    }

    /// The user turn sent after the system prompt and history
    fn user_turn(&self) -> String {
        let code = if self.code.trim().is_empty() {
            "No code submitted yet"
        } else {
            self.code
        };

        let mut turn = format!(
            "Problem: {}\nProblem Description: {}\nLanguage: {}\nCurrent Code:\n```{}\n{}\n```\n",
            self.problem.title, self.problem.description, self.language, self.language, code
        );

        if let Some(summary) = self.test_results {
            turn.push_str(&format!(
                "Test Results: {} of {} passing{}\n",
                summary.passing,
                summary.total_tests,
                if summary.uses_optimal_solution {
                    " (optimal approach detected)"
                } else {
                    ""
                }
            ));
        }

        if let Some(analysis) = self.analysis.filter(|a| !a.is_empty) {
            turn.push_str(&format!(
                "Detected Approach: time {}, space {}\n",
                analysis.time_complexity.as_deref().unwrap_or("Unknown"),
                analysis.space_complexity.as_deref().unwrap_or("Unknown"),
            ));
            if !analysis.specific_issues.is_empty() {
                turn.push_str(&format!("Issues: {}\n", analysis.specific_issues.join("; ")));
            }
        }

        turn.push_str(&format!("Last User Message: {}", self.last_message));
        turn
    }
}

/// Canned reply for a situation, used when the provider cannot answer
pub fn fallback_reply(situation: Situation, problem_id: &str) -> &'static str {
    match situation {
        Situation::Greeting => builtin::GREETING_FALLBACK,
        Situation::EmptyCode => builtin::EMPTY_CODE_FALLBACK,
        Situation::TestResults | Situation::DiscussingCode => {
            builtin::code_feedback(problem_id).unwrap_or(builtin::CODE_FEEDBACK_FALLBACK)
        }
        Situation::General => builtin::GENERAL_FALLBACK,
    }
}

pub struct Interviewer {
    provider: Arc<dyn ChatProvider>,
    prompts: PromptSet,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Interviewer {
    pub fn new(provider: Arc<dyn ChatProvider>, prompts: PromptSet, llm: &LlmConfig) -> Self {
        Self {
            provider,
            prompts,
            model: llm.model.clone().unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
        }
    }

    /// Produce the interviewer's next message.
    ///
    /// Returns `None` only for a repeated `START_INTERVIEW`, which the caller
    /// must swallow. Provider failures never surface: they bump the retry
    /// count and return the canned reply for the situation.
    pub async fn reply(
        &self,
        conversation: &mut ConversationSession,
        context: &InterviewContext<'_>,
    ) -> Option<String> {
        if context.last_message == START_INTERVIEW && !conversation.begin() {
            tracing::debug!(problem_id = %context.problem.id, "duplicate greeting suppressed");
            return None;
        }

        let situation = context.situation();
        let request = CompletionRequest {
            messages: self.build_messages(situation, conversation, context),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.provider.complete(request).await {
            Ok(message) => {
                conversation.record_exchange(context.last_message, &message.content);
                Some(message.content)
            }
            Err(e) => {
                conversation.record_failure();
                tracing::warn!(
                    provider = self.provider.name(),
                    retry_count = conversation.retry_count(),
                    ?situation,
                    "interviewer call failed, using fallback: {}",
                    e
                );
                Some(fallback_reply(situation, &context.problem.id).to_string())
            }
        }
    }

    fn build_messages(
        &self,
        situation: Situation,
        conversation: &ConversationSession,
        context: &InterviewContext<'_>,
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(conversation.history_len() + 2);
        messages.push(Message::system(self.prompts.system_prompt(situation)));
        messages.extend(conversation.history().cloned());
        messages.push(Message::user(context.user_turn()));
        messages
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::catalog::ProblemCatalog;
    use crate::conversation::Role;
    use crate::providers::testing::{Scripted, StubProvider};

    fn interviewer(provider: Arc<StubProvider>) -> Interviewer {
        Interviewer::new(provider, PromptSet::default(), &LlmConfig::default())
    }

    fn summary(passing: usize, total: usize, is_empty: bool) -> ExecutionSummary {
        ExecutionSummary {
            total_tests: total,
            passing,
            failing: total - passing,
            success: passing == total,
            uses_optimal_solution: false,
            is_empty,
            timestamp: Utc::now(),
        }
    }

    const SOLUTION: &str = "def two_sum(nums, target):\n    seen = {}\n    for i, n in enumerate(nums):\n        if target - n in seen:\n            return [seen[target - n], i]\n        seen[n] = i\n";

    #[tokio::test]
    async fn test_greeting_only_once() {
        let catalog = ProblemCatalog::builtin();
        let problem = catalog.get("two-sum").unwrap();
        let provider = Arc::new(StubProvider::replying("Let's get started with the interview."));
        let interviewer = interviewer(provider.clone());
        let mut conversation = ConversationSession::default();

        let context = InterviewContext {
            problem,
            language: &Language::Python,
            code: "",
            last_message: START_INTERVIEW,
            test_results: None,
            analysis: None,
        };

        let first = interviewer.reply(&mut conversation, &context).await;
        let second = interviewer.reply(&mut conversation, &context).await;

        assert_eq!(first.as_deref(), Some("Let's get started with the interview."));
        assert!(second.is_none());
        assert_eq!(provider.calls(), 1);

        let request = provider.last_request().unwrap();
        assert_eq!(request.messages[0].content, builtin::GREETING);
        assert_eq!(request.model, DEFAULT_LLM_MODEL);
        assert_eq!(request.max_tokens, 300);
    }

    #[tokio::test]
    async fn test_reset_allows_new_greeting() {
        let catalog = ProblemCatalog::builtin();
        let problem = catalog.get("two-sum").unwrap();
        let interviewer = interviewer(Arc::new(StubProvider::new(vec![])));
        let mut conversation = ConversationSession::default();
        let context = InterviewContext {
            problem,
            language: &Language::Cpp,
            code: "",
            last_message: START_INTERVIEW,
            test_results: None,
            analysis: None,
        };

        assert!(interviewer.reply(&mut conversation, &context).await.is_some());
        conversation.reset();
        assert!(interviewer.reply(&mut conversation, &context).await.is_some());
    }

    #[tokio::test]
    async fn test_failure_falls_back_and_counts_retries() {
        let catalog = ProblemCatalog::builtin();
        let problem = catalog.get("palindrome-number").unwrap();
        let provider = Arc::new(StubProvider::new(vec![
            Scripted::Fail,
            Scripted::Fail,
            Scripted::Reply("Better.".into()),
        ]));
        let interviewer = interviewer(provider);
        let mut conversation = ConversationSession::default();

        let context = InterviewContext {
            problem,
            language: &Language::Python,
            code: "def is_palindrome(x):\n    return str(x) == str(x)[::-1]\n",
            last_message: "Is my approach optimal?",
            test_results: None,
            analysis: None,
        };

        let reply = interviewer.reply(&mut conversation, &context).await.unwrap();
        assert_eq!(reply, builtin::code_feedback("palindrome-number").unwrap());
        assert_eq!(conversation.retry_count(), 1);
        assert_eq!(conversation.history_len(), 0);

        let general = InterviewContext {
            last_message: "hello?",
            ..context
        };
        let reply = interviewer.reply(&mut conversation, &general).await.unwrap();
        assert_eq!(reply, builtin::GENERAL_FALLBACK);
        assert_eq!(conversation.retry_count(), 2);

        let reply = interviewer.reply(&mut conversation, &general).await.unwrap();
        assert_eq!(reply, "Better.");
        assert_eq!(conversation.retry_count(), 0);
        assert_eq!(conversation.history_len(), 2);
    }

    #[tokio::test]
    async fn test_history_bounded_and_sent_with_request() {
        let catalog = ProblemCatalog::builtin();
        let problem = catalog.get("two-sum").unwrap();
        let provider = Arc::new(StubProvider::new(vec![]));
        let interviewer = interviewer(provider.clone());
        let mut conversation = ConversationSession::default();

        for i in 0..8 {
            let message = format!("turn {}", i);
            let context = InterviewContext {
                problem,
                language: &Language::Python,
                code: SOLUTION,
                last_message: &message,
                test_results: None,
                analysis: None,
            };
            interviewer.reply(&mut conversation, &context).await;
            assert!(conversation.history_len() <= 10);
        }

        assert_eq!(conversation.history_len(), 10);
        let request = provider.last_request().unwrap();
        // system + 10 history entries before the last exchange was recorded
        assert_eq!(request.messages.len(), 12);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[11].content.ends_with("Last User Message: turn 7"));
    }

    #[test]
    fn test_situation_dispatch() {
        let catalog = ProblemCatalog::builtin();
        let problem = catalog.get("two-sum").unwrap();
        let empty_run = summary(0, 2, true);
        let real_run = summary(1, 2, false);

        let base = InterviewContext {
            problem,
            language: &Language::Python,
            code: SOLUTION,
            last_message: "hi there",
            test_results: None,
            analysis: None,
        };

        assert_eq!(base.situation(), Situation::General);
        assert_eq!(
            InterviewContext { last_message: START_INTERVIEW, ..base }.situation(),
            Situation::Greeting
        );
        assert_eq!(
            InterviewContext { test_results: Some(&real_run), ..base }.situation(),
            Situation::TestResults
        );
        assert_eq!(
            InterviewContext { test_results: Some(&empty_run), ..base }.situation(),
            Situation::EmptyCode
        );
        assert_eq!(
            InterviewContext { last_message: "What's the Complexity here?", ..base }.situation(),
            Situation::DiscussingCode
        );
        assert_eq!(
            InterviewContext {
                last_message: "Which algorithm should I use?",
                code: problem.starter_code_for(&Language::Python),
                ..base
            }
            .situation(),
            Situation::EmptyCode
        );
    }

    #[test]
    fn test_user_turn_contents() {
        let catalog = ProblemCatalog::builtin();
        let problem = catalog.get("two-sum").unwrap();
        let run = summary(1, 2, false);

        let turn = InterviewContext {
            problem,
            language: &Language::Java,
            code: "   ",
            last_message: "thoughts?",
            test_results: Some(&run),
            analysis: None,
        }
        .user_turn();

        assert!(turn.starts_with("Problem: Two Sum\n"));
        assert!(turn.contains("No code submitted yet"));
        assert!(turn.contains("Test Results: 1 of 2 passing"));
        assert!(turn.ends_with("Last User Message: thoughts?"));
    }

    #[test]
    fn test_fallback_for_unknown_problem() {
        assert_eq!(
            fallback_reply(Situation::DiscussingCode, "three-sum"),
            builtin::CODE_FEEDBACK_FALLBACK
        );
        assert_eq!(fallback_reply(Situation::Greeting, "two-sum"), builtin::GREETING_FALLBACK);
    }
}
