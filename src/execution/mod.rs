//! Mock execution engine
//!
//! Nothing is compiled or run. Each test case is graded by a weighted coin
//! flip biased by the analyzer's verdict, and failing cases get a plausible
//! wrong answer derived from the expected output.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analyzer::CodeAnalysis;
use crate::catalog::{Language, Problem};
use crate::config::service::ExecutionConfig;

/// Characters of the submission echoed back in a report
const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub id: usize,
    pub input: String,
    pub expected_output: String,
    /// `None` when there was no solution to "run"
    pub actual_output: Option<String>,
    pub status: TestStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_tests: usize,
    pub passing: usize,
    pub failing: usize,
    pub success: bool,
    pub uses_optimal_solution: bool,
    pub is_empty: bool,
    pub timestamp: DateTime<Utc>,
}

/// Full result of one simulated run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub problem_id: String,
    pub language: Language,
    pub summary: ExecutionSummary,
    pub passing_tests: Vec<TestCaseResult>,
    pub failing_tests: Vec<TestCaseResult>,
    pub code_snippet: String,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionReport {
    /// All results in test-case order
    pub fn results(&self) -> Vec<&TestCaseResult> {
        let mut all: Vec<_> = self.passing_tests.iter().chain(&self.failing_tests).collect();
        all.sort_by_key(|r| r.id);
        all
    }
}

/// Knobs for the grading coin
#[derive(Debug, Clone)]
pub struct ExecutionPolicy {
    pub delay: Duration,
    pub seed: Option<u64>,
    pub base_pass_probability: f64,
    pub optimal_pass_probability: f64,
    pub issue_penalty: f64,
    pub min_pass_probability: f64,
}

impl From<&ExecutionConfig> for ExecutionPolicy {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
            seed: config.seed,
            base_pass_probability: config.base_pass_probability,
            optimal_pass_probability: config.optimal_pass_probability,
            issue_penalty: config.issue_penalty,
            min_pass_probability: config.min_pass_probability,
        }
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::from(&ExecutionConfig::default())
    }
}

pub struct MockExecutionEngine {
    policy: ExecutionPolicy,
    rng: Mutex<StdRng>,
}

impl MockExecutionEngine {
    pub fn new(policy: ExecutionPolicy) -> Self {
        let rng = match policy.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            policy,
            rng: Mutex::new(rng),
        }
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    /// Chance that a single test case passes for this analysis
    pub fn pass_probability(&self, analysis: &CodeAnalysis) -> f64 {
        let base = if analysis.uses_optimal_approach {
            self.policy.optimal_pass_probability
        } else {
            self.policy.base_pass_probability
        };

        let penalty = self.policy.issue_penalty * analysis.specific_issues.len() as f64;
        (base - penalty)
            .max(self.policy.min_pass_probability)
            .clamp(0.0, 1.0)
    }

    /// Grade after the configured artificial delay
    pub async fn simulate(
        &self,
        code: &str,
        language: &Language,
        problem: &Problem,
        analysis: &CodeAnalysis,
    ) -> ExecutionReport {
        tracing::debug!(problem_id = %problem.id, delay_ms = self.policy.delay.as_millis() as u64, "simulating run");
        tokio::time::sleep(self.policy.delay).await;
        self.grade(code, language, problem, analysis)
    }

    /// Grade immediately
    pub fn grade(
        &self,
        code: &str,
        language: &Language,
        problem: &Problem,
        analysis: &CodeAnalysis,
    ) -> ExecutionReport {
        let results: Vec<TestCaseResult> = if analysis.is_empty {
            problem
                .test_cases
                .iter()
                .enumerate()
                .map(|(id, case)| TestCaseResult {
                    id,
                    input: case.input.to_string(),
                    expected_output: case.expected_output.to_string(),
                    actual_output: None,
                    status: TestStatus::Fail,
                })
                .collect()
        } else {
            let probability = self.pass_probability(analysis);
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

            problem
                .test_cases
                .iter()
                .enumerate()
                .map(|(id, case)| {
                    let passed = rng.gen_bool(probability);
                    let actual = if passed {
                        case.expected_output.clone()
                    } else {
                        mutate_output(&case.expected_output, &mut *rng)
                    };

                    TestCaseResult {
                        id,
                        input: case.input.to_string(),
                        expected_output: case.expected_output.to_string(),
                        actual_output: Some(actual.to_string()),
                        status: if passed { TestStatus::Pass } else { TestStatus::Fail },
                    }
                })
                .collect()
        };

        let (passing_tests, failing_tests): (Vec<_>, Vec<_>) = results
            .into_iter()
            .partition(|r| r.status == TestStatus::Pass);

        let timestamp = Utc::now();
        let total_tests = passing_tests.len() + failing_tests.len();
        let summary = ExecutionSummary {
            total_tests,
            passing: passing_tests.len(),
            failing: failing_tests.len(),
            success: !analysis.is_empty && total_tests > 0 && failing_tests.is_empty(),
            uses_optimal_solution: analysis.uses_optimal_approach,
            is_empty: analysis.is_empty,
            timestamp,
        };

        tracing::info!(
            problem_id = %problem.id,
            %language,
            passing = summary.passing,
            total = summary.total_tests,
            "mock run graded"
        );

        ExecutionReport {
            problem_id: problem.id.clone(),
            language: language.clone(),
            summary,
            passing_tests,
            failing_tests,
            code_snippet: code.chars().take(SNIPPET_CHARS).collect(),
            timestamp,
        }
    }
}

impl Default for MockExecutionEngine {
    fn default() -> Self {
        Self::new(ExecutionPolicy::default())
    }
}

/// Derive a wrong-looking answer from the expected one.
///
/// Arrays get one random element bumped by one (when numeric), numbers move
/// by one in a random direction, booleans flip. Anything else comes back
/// unchanged, so a failing string answer can look identical to the expected one.
pub fn mutate_output<R: Rng + ?Sized>(expected: &Value, rng: &mut R) -> Value {
    match expected {
        Value::Array(items) if !items.is_empty() => {
            let mut items = items.clone();
            let index = rng.gen_range(0..items.len());
            if let Some(bumped) = bump_number(&items[index], 1) {
                items[index] = bumped;
            }
            Value::Array(items)
        }
        Value::Number(_) => {
            let delta = if rng.gen_bool(0.5) { 1 } else { -1 };
            bump_number(expected, delta).unwrap_or_else(|| expected.clone())
        }
        Value::Bool(b) => Value::Bool(!b),
        other => other.clone(),
    }
}

fn bump_number(value: &Value, delta: i64) -> Option<Value> {
    if let Some(n) = value.as_i64() {
        return Some(Value::from(n.saturating_add(delta)));
    }
    if let Some(n) = value.as_u64() {
        return Some(Value::from(n.saturating_add_signed(delta)));
    }
    value
        .as_f64()
        .and_then(|n| serde_json::Number::from_f64(n + delta as f64))
        .map(Value::Number)
}
