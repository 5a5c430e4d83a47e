//! Heuristic code analyzer
//!
//! Guesses the algorithmic shape of a submission from surface patterns:
//! loop keywords, map types, self-calls and string conversions. Nothing is
//! parsed or executed. The result is a best guess, deterministic for a given
//! (code, problem, language) triple.

pub mod detectors;
pub mod heuristics;

use serde::{Deserialize, Serialize};

use crate::catalog::Language;

use detectors::Signals;
use heuristics::{Evidence, HeuristicsRegistry};

/// Submissions shorter than this (trimmed, in chars) are treated as empty
pub const MIN_MEANINGFUL_LENGTH: usize = 30;

/// Placeholder fragments from the starter templates
pub const STARTER_MARKERS: &[&str] = &[
    "// Write your solution here",
    "# Write your solution",
    "return new int[0]",
    "return []",
    "return {}",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeAnalysis {
    pub is_empty: bool,
    pub has_nested_loops: bool,
    pub uses_hash_map: bool,
    pub uses_recursion: bool,
    pub uses_string_conversion: bool,
    pub uses_optimal_approach: bool,
    pub time_complexity: Option<String>,
    pub space_complexity: Option<String>,
    pub specific_issues: Vec<String>,
    pub feedback: String,
}

impl CodeAnalysis {
    fn empty(feedback: &str) -> Self {
        Self {
            is_empty: true,
            has_nested_loops: false,
            uses_hash_map: false,
            uses_recursion: false,
            uses_string_conversion: false,
            uses_optimal_approach: false,
            time_complexity: None,
            space_complexity: None,
            specific_issues: Vec::new(),
            feedback: feedback.to_string(),
        }
    }
}

/// True when the code is blank, too short to be a solution, or still carries
/// starter-template placeholders.
pub fn is_code_empty(code: &str) -> bool {
    let trimmed = code.trim();
    if trimmed.is_empty() || trimmed.chars().count() < MIN_MEANINGFUL_LENGTH {
        return true;
    }

    STARTER_MARKERS.iter().any(|marker| code.contains(marker))
}

pub struct CodeAnalyzer {
    registry: HeuristicsRegistry,
}

impl CodeAnalyzer {
    pub fn new(registry: HeuristicsRegistry) -> Self {
        Self { registry }
    }

    /// Analyze a submission. Never fails: unrecognised shapes come back as
    /// "Unknown" complexity with an "approach unclear" issue.
    pub fn analyze(&self, code: &str, problem_id: &str, language: &Language) -> CodeAnalysis {
        if code.trim().is_empty() {
            return CodeAnalysis::empty("No code has been implemented.");
        }
        if is_code_empty(code) {
            return CodeAnalysis::empty("No meaningful solution has been implemented.");
        }

        let signals = Signals::detect(code, language);
        let evidence = Evidence {
            code,
            language,
            signals,
        };
        let assessment = self.registry.get(problem_id).assess(&evidence);

        tracing::debug!(
            problem_id,
            %language,
            nested_loops = signals.nested_loops,
            hash_map = signals.hash_map,
            recursion = signals.recursion,
            time = %assessment.time_complexity,
            "analyzed submission"
        );

        CodeAnalysis {
            is_empty: false,
            has_nested_loops: signals.nested_loops,
            uses_hash_map: signals.hash_map,
            uses_recursion: signals.recursion,
            uses_string_conversion: signals.string_conversion,
            uses_optimal_approach: assessment.optimal,
            time_complexity: Some(assessment.time_complexity),
            space_complexity: assessment.space_complexity,
            specific_issues: assessment.issues,
            feedback: assessment.feedback,
        }
    }
}

impl Default for CodeAnalyzer {
    fn default() -> Self {
        Self::new(HeuristicsRegistry::builtin())
    }
}
