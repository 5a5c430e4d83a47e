//! Interviewer prompts and canned fallback replies
//!
//! Each conversational situation has a system prompt. Built-ins can be
//! replaced from the `[prompts]` section of the service config:
//!
//! ```toml
//! [prompts]
//! greeting = "You are a friendly interviewer..."
//! test_results = "Review the candidate's test run..."
//! ```

use serde::{Deserialize, Serialize};

use crate::interviewer::Situation;

/// Optional per-situation system prompt overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptOverrides {
    #[serde(default)]
    pub greeting: Option<String>,

    #[serde(default)]
    pub empty_code: Option<String>,

    #[serde(default)]
    pub test_results: Option<String>,

    #[serde(default)]
    pub discussing_code: Option<String>,

    #[serde(default)]
    pub general: Option<String>,
}

/// Resolved system prompts, one per situation
#[derive(Debug, Clone)]
pub struct PromptSet {
    greeting: String,
    empty_code: String,
    test_results: String,
    discussing_code: String,
    general: String,
}

impl PromptSet {
    /// Built-in prompts with any overrides applied
    pub fn with_overrides(overrides: &PromptOverrides) -> Self {
        let pick = |custom: &Option<String>, fallback: &str| {
            custom
                .as_ref()
                .filter(|p| !p.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            greeting: pick(&overrides.greeting, builtin::GREETING),
            empty_code: pick(&overrides.empty_code, builtin::EMPTY_CODE),
            test_results: pick(&overrides.test_results, builtin::TEST_RESULTS),
            discussing_code: pick(&overrides.discussing_code, builtin::DISCUSSING_CODE),
            general: pick(&overrides.general, builtin::GENERAL),
        }
    }

    pub fn system_prompt(&self, situation: Situation) -> &str {
        match situation {
            Situation::Greeting => &self.greeting,
            Situation::EmptyCode => &self.empty_code,
            Situation::TestResults => &self.test_results,
            Situation::DiscussingCode => &self.discussing_code,
            Situation::General => &self.general,
        }
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::with_overrides(&PromptOverrides::default())
    }
}

/// Built-in prompts that don't require files
pub mod builtin {
    pub const GREETING: &str = r#"You are an AI technical interviewer for a software development interview.
Provide EXACTLY ONE concise introduction to start the interview.
Your message must:
- Start with "Let's get started with the interview."
- Briefly explain the problem
- Ask the candidate to implement a solution
- Mention you'll discuss their approach, complexity, and optimizations
- Be professional but brief

YOUR RESPONSE WILL BE THE ONLY INITIAL MESSAGE. DO NOT SEND MULTIPLE MESSAGES."#;

    pub const EMPTY_CODE: &str = r#"You are an AI technical interviewer. The candidate has not written a meaningful solution yet.
Do not review code that does not exist. Instead:
- Ask how they would approach the problem
- Nudge them toward a first brute-force idea if they seem stuck
- Keep it to two or three sentences"#;

    pub const TEST_RESULTS: &str = r#"You are an AI technical interviewer reviewing the result of the candidate's latest test run.
Keep your response concise and focused.
DO NOT introduce yourself again.
- If tests failed, ask what edge cases their code might miss, without giving the answer away
- If all tests passed, ask about time and space complexity and whether it is optimal
- Refer to the detected approach and issues when they are provided"#;

    pub const DISCUSSING_CODE: &str = r#"You are an AI technical interviewer evaluating a candidate's solution.
Keep your responses concise and focused.
DO NOT say "I'd be happy to simulate..." or introduce yourself again.
Instead, directly respond to what the candidate just said with:
- Specific questions about their approach
- Brief discussion of time/space complexity
- Short suggestions for optimizations
- Direct feedback"#;

    pub const GENERAL: &str = r#"You are an AI technical interviewer in the middle of a coding interview.
Answer the candidate briefly and steer the conversation back to the problem.
Do not write the solution for them."#;

    /// Reply used when the greeting cannot be generated
    pub const GREETING_FALLBACK: &str = "Let's get started with the interview. Take a moment to read the problem, then implement a solution in the editor. Once you have something, we'll discuss your approach, its time and space complexity, and possible optimizations.";

    pub const EMPTY_CODE_FALLBACK: &str = "I don't see a solution yet. Walk me through how you'd approach the problem, then try implementing it and run the tests.";

    pub const GENERAL_FALLBACK: &str = "I'm having trouble processing your response. Could you elaborate on your approach?";

    /// Canned code feedback for known problems
    pub fn code_feedback(problem_id: &str) -> Option<&'static str> {
        match problem_id {
            "two-sum" => Some("Think about whether you really need to check every pair. If you remember the values you've already seen, can you find each complement in a single pass? What would that cost in space?"),
            "palindrome-number" => Some("How does your solution handle negative numbers and numbers ending in zero? Could you reverse half of the number arithmetically instead of converting it to a string?"),
            "longest-substring" => Some("Consider a sliding window that tracks where each character was last seen. How does your window move when you hit a repeated character, and can you do it in one pass?"),
            "merge-k-sorted-lists" => Some("How does your approach scale as the number of lists grows? A min-heap over the current head of each list, or pairwise divide and conquer, gets you to O(n log k)."),
            _ => None,
        }
    }

    pub const CODE_FEEDBACK_FALLBACK: &str = "Walk me through your solution. What is its time and space complexity, and which edge cases have you considered?";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = PromptSet::default();
        assert!(prompts
            .system_prompt(Situation::Greeting)
            .contains("Let's get started with the interview."));
        assert_eq!(prompts.system_prompt(Situation::General), builtin::GENERAL);
    }

    #[test]
    fn test_overrides_replace_only_given_situations() {
        let overrides: PromptOverrides = toml::from_str(
            r#"
test_results = "Custom review prompt"
general = "   "
"#,
        )
        .unwrap();

        let prompts = PromptSet::with_overrides(&overrides);
        assert_eq!(prompts.system_prompt(Situation::TestResults), "Custom review prompt");
        // blank overrides are ignored
        assert_eq!(prompts.system_prompt(Situation::General), builtin::GENERAL);
        assert_eq!(prompts.system_prompt(Situation::EmptyCode), builtin::EMPTY_CODE);
    }

    #[test]
    fn test_code_feedback_known_and_unknown() {
        assert!(builtin::code_feedback("two-sum").is_some());
        assert!(builtin::code_feedback("merge-k-sorted-lists").unwrap().contains("O(n log k)"));
        assert!(builtin::code_feedback("fizz-buzz").is_none());
    }
}
