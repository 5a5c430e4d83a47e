//! Problem catalog
//!
//! A fixed, read-only set of coding problems built once at startup and
//! looked up by slug.

mod language;
mod problems;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Worked example shown with the problem statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
    pub explanation: String,
}

/// A test case; both sides may be any JSON shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Value,
    pub expected_output: Value,
}

/// Starter code for each editor language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarterCode {
    pub cpp: String,
    pub java: String,
    pub python: String,
}

impl StarterCode {
    pub fn for_language(&self, language: &Language) -> Option<&str> {
        match language {
            Language::Cpp => Some(&self.cpp),
            Language::Java => Some(&self.java),
            Language::Python => Some(&self.python),
            Language::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub examples: Vec<Example>,
    pub test_cases: Vec<TestCase>,
    pub starter_code: StarterCode,
}

impl Problem {
    /// Starter code for `language`, or a bare comment for languages the editor doesn't ship
    pub fn starter_code_for(&self, language: &Language) -> &str {
        self.starter_code
            .for_language(language)
            .unwrap_or("// Write your solution here")
    }
}

/// Listing entry for the problem index
#[derive(Debug, Clone, Serialize)]
pub struct ProblemSummary {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
}

impl From<&Problem> for ProblemSummary {
    fn from(problem: &Problem) -> Self {
        Self {
            id: problem.id.clone(),
            title: problem.title.clone(),
            difficulty: problem.difficulty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProblemCatalog {
    problems: Vec<Problem>,
}

impl ProblemCatalog {
    /// Catalog with the built-in problem set
    pub fn builtin() -> Self {
        Self::from_problems(problems::builtin())
    }

    pub fn from_problems(problems: Vec<Problem>) -> Self {
        Self { problems }
    }

    pub fn get(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }

    pub fn all(&self) -> &[Problem] {
        &self.problems
    }

    pub fn summaries(&self) -> Vec<ProblemSummary> {
        self.problems.iter().map(ProblemSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}
