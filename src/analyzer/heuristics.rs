//! Problem-specific complexity heuristics
//!
//! Each known problem registers a [`ProblemHeuristics`] implementation with
//! the [`HeuristicsRegistry`]. The built-ins are declarative [`RuleTable`]s:
//! ordered rows where the first matching predicate decides the verdict.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::Language;

use super::detectors::Signals;

/// What the heuristics get to look at
#[derive(Debug, Clone, Copy)]
pub struct Evidence<'a> {
    pub code: &'a str,
    pub language: &'a Language,
    pub signals: Signals,
}

impl Evidence<'_> {
    fn mentions(&self, token: &str) -> bool {
        self.code.contains(token)
    }
}

/// Verdict produced for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub optimal: bool,
    pub time_complexity: String,
    pub space_complexity: Option<String>,
    pub issues: Vec<String>,
    pub feedback: String,
}

pub trait ProblemHeuristics: Send + Sync {
    /// Catalog id this heuristic applies to
    fn problem_id(&self) -> &str;

    fn assess(&self, evidence: &Evidence<'_>) -> Assessment;
}

/// One row of a complexity table
pub struct ComplexityRule {
    pub when: fn(&Evidence<'_>) -> bool,
    pub optimal: bool,
    pub time: &'static str,
    pub space: Option<&'static str>,
    pub issue: Option<&'static str>,
    pub feedback: &'static str,
}

impl ComplexityRule {
    fn verdict(&self) -> Assessment {
        Assessment {
            optimal: self.optimal,
            time_complexity: self.time.to_string(),
            space_complexity: self.space.map(str::to_string),
            issues: self.issue.map(|i| vec![i.to_string()]).unwrap_or_default(),
            feedback: self.feedback.to_string(),
        }
    }
}

pub const UNKNOWN: &str = "Unknown";
pub const UNCLEAR_ISSUE: &str = "Implementation approach is unclear";

/// Ordered complexity rules for one problem
pub struct RuleTable {
    pub problem_id: &'static str,
    pub rules: &'static [ComplexityRule],
}

impl ProblemHeuristics for RuleTable {
    fn problem_id(&self) -> &str {
        self.problem_id
    }

    fn assess(&self, evidence: &Evidence<'_>) -> Assessment {
        self.rules
            .iter()
            .find(|rule| (rule.when)(evidence))
            .map(ComplexityRule::verdict)
            .unwrap_or_else(|| Assessment {
                optimal: false,
                time_complexity: UNKNOWN.to_string(),
                space_complexity: Some(UNKNOWN.to_string()),
                issues: vec![UNCLEAR_ISSUE.to_string()],
                feedback: format!("{}.", UNCLEAR_ISSUE),
            })
    }
}

fn always(_: &Evidence<'_>) -> bool {
    true
}

fn uses_hash_map(e: &Evidence<'_>) -> bool {
    e.signals.hash_map
}

fn has_nested_loops(e: &Evidence<'_>) -> bool {
    e.signals.nested_loops
}

// ---- two-sum ----

fn single_pass_lookup(e: &Evidence<'_>) -> bool {
    e.signals.hash_map && e.mentions("return") && !e.mentions("sort")
}

pub static TWO_SUM: RuleTable = RuleTable {
    problem_id: "two-sum",
    rules: &[
        ComplexityRule {
            when: single_pass_lookup,
            optimal: true,
            time: "O(n)",
            space: Some("O(n)"),
            issue: None,
            feedback: "Using optimal HashMap approach with O(n) time complexity.",
        },
        ComplexityRule {
            when: uses_hash_map,
            optimal: true,
            time: "O(n)",
            space: Some("O(n)"),
            issue: Some("Using HashMap but with multiple passes through the array"),
            feedback: "Using HashMap approach but could be further optimized.",
        },
        ComplexityRule {
            when: has_nested_loops,
            optimal: false,
            time: "O(n²)",
            space: Some("O(1)"),
            issue: Some("Using inefficient nested loops with O(n²) time complexity"),
            feedback: "Using brute force approach with nested loops. This is inefficient.",
        },
        ComplexityRule {
            when: always,
            optimal: false,
            time: UNKNOWN,
            space: Some(UNKNOWN),
            issue: Some(UNCLEAR_ISSUE),
            feedback: "Implementation approach is unclear. Check if it handles all cases correctly.",
        },
    ],
};

// ---- palindrome-number ----

fn converts_to_string(e: &Evidence<'_>) -> bool {
    e.signals.string_conversion
}

fn reverses_digits(e: &Evidence<'_>) -> bool {
    e.mentions("/") && e.mentions("%") && !e.signals.string_conversion
}

pub static PALINDROME_NUMBER: RuleTable = RuleTable {
    problem_id: "palindrome-number",
    rules: &[
        ComplexityRule {
            when: converts_to_string,
            optimal: false,
            // n is the number of digits
            time: "O(n)",
            space: Some("O(n)"),
            issue: Some("Using string conversion requires additional space"),
            feedback: "Using string conversion approach. Works but uses extra space.",
        },
        ComplexityRule {
            when: reverses_digits,
            optimal: true,
            time: "O(log n)",
            space: Some("O(1)"),
            issue: None,
            feedback: "Using optimal mathematical approach with O(1) space complexity.",
        },
        ComplexityRule {
            when: always,
            optimal: false,
            time: UNKNOWN,
            space: Some(UNKNOWN),
            issue: Some(UNCLEAR_ISSUE),
            feedback: "Implementation approach is unclear. Check if it handles edge cases like negative numbers.",
        },
    ],
};

// ---- longest-substring ----

fn sliding_window(e: &Evidence<'_>) -> bool {
    e.signals.hash_map
        && (e.mentions("while") || e.mentions("for"))
        && !e.signals.nested_loops
}

pub static LONGEST_SUBSTRING: RuleTable = RuleTable {
    problem_id: "longest-substring",
    rules: &[
        ComplexityRule {
            when: sliding_window,
            optimal: true,
            // m is the charset size
            time: "O(n)",
            space: Some("O(min(m,n))"),
            issue: None,
            feedback: "Using optimal sliding window approach with O(n) time complexity.",
        },
        ComplexityRule {
            when: uses_hash_map,
            optimal: false,
            time: "O(n²)",
            space: Some("O(min(m,n))"),
            issue: Some("Using HashMap but without proper sliding window technique"),
            feedback: "Using HashMap but could be optimized with sliding window technique.",
        },
        ComplexityRule {
            when: has_nested_loops,
            optimal: false,
            time: "O(n³)",
            space: Some("O(min(m,n))"),
            issue: Some("Using inefficient brute force approach"),
            feedback: "Using inefficient brute force approach. Consider a sliding window with HashMap.",
        },
        ComplexityRule {
            when: always,
            optimal: false,
            time: UNKNOWN,
            space: Some(UNKNOWN),
            issue: Some(UNCLEAR_ISSUE),
            feedback: "Implementation approach is unclear. Check efficiency and correctness.",
        },
    ],
};

// ---- merge-k-sorted-lists ----

fn uses_priority_queue(e: &Evidence<'_>) -> bool {
    e.signals.priority_queue
}

fn divide_and_conquer(e: &Evidence<'_>) -> bool {
    e.signals.recursion && !e.signals.nested_loops
}

fn sequential_merge(e: &Evidence<'_>) -> bool {
    !e.signals.nested_loops
        && (e.mentions("merge")
            || (e.mentions("next") && (e.mentions("->") || e.mentions(".next"))))
}

pub static MERGE_K_SORTED_LISTS: RuleTable = RuleTable {
    problem_id: "merge-k-sorted-lists",
    rules: &[
        ComplexityRule {
            when: uses_priority_queue,
            optimal: true,
            // n total elements, k lists
            time: "O(n log k)",
            space: Some("O(k)"),
            issue: None,
            feedback: "Using optimal priority queue/heap approach with O(n log k) time complexity.",
        },
        ComplexityRule {
            when: divide_and_conquer,
            optimal: true,
            time: "O(n log k)",
            // recursion stack
            space: Some("O(log k)"),
            issue: None,
            feedback: "Using efficient divide and conquer approach with O(n log k) time complexity.",
        },
        ComplexityRule {
            when: sequential_merge,
            optimal: false,
            time: "O(nk)",
            space: Some("O(1)"),
            issue: Some("Sequential merging is not optimal for large k"),
            feedback: "Using sequential merging which is O(nk). Consider priority queue for O(n log k).",
        },
        ComplexityRule {
            when: has_nested_loops,
            optimal: false,
            time: "O(n²)",
            space: Some("O(n)"),
            issue: Some("Using inefficient approach with nested loops"),
            feedback: "Using inefficient approach. Consider priority queue or divide and conquer.",
        },
        ComplexityRule {
            when: always,
            optimal: false,
            time: UNKNOWN,
            space: Some(UNKNOWN),
            issue: Some(UNCLEAR_ISSUE),
            feedback: "Implementation approach is unclear. Check efficiency for large inputs.",
        },
    ],
};

/// Used for problem ids without their own table
pub static GENERIC: RuleTable = RuleTable {
    problem_id: "*",
    rules: &[
        ComplexityRule {
            when: has_nested_loops,
            optimal: false,
            time: "O(n²)",
            space: None,
            issue: Some("Using nested loops which may be inefficient"),
            feedback: "Generic code analysis performed.",
        },
        ComplexityRule {
            when: uses_hash_map,
            optimal: true,
            time: "O(n)",
            space: None,
            issue: None,
            feedback: "Generic code analysis performed.",
        },
        ComplexityRule {
            when: always,
            optimal: false,
            time: UNKNOWN,
            space: Some(UNKNOWN),
            issue: Some(UNCLEAR_ISSUE),
            feedback: "Generic code analysis performed. Implementation approach is unclear.",
        },
    ],
};

/// Problem id -> heuristics, with a generic fallback
pub struct HeuristicsRegistry {
    by_problem: HashMap<String, Arc<dyn ProblemHeuristics>>,
    fallback: Arc<dyn ProblemHeuristics>,
}

impl HeuristicsRegistry {
    /// Registry with no problem-specific entries
    pub fn new(fallback: Arc<dyn ProblemHeuristics>) -> Self {
        Self {
            by_problem: HashMap::new(),
            fallback,
        }
    }

    /// Registry covering every problem in the built-in catalog
    pub fn builtin() -> Self {
        let mut registry = Self::new(Arc::new(&GENERIC));
        registry.register(&TWO_SUM);
        registry.register(&PALINDROME_NUMBER);
        registry.register(&LONGEST_SUBSTRING);
        registry.register(&MERGE_K_SORTED_LISTS);
        registry
    }

    pub fn register<H: ProblemHeuristics + 'static>(&mut self, heuristics: H) {
        let id = heuristics.problem_id().to_string();
        self.by_problem.insert(id, Arc::new(heuristics));
    }

    /// Heuristics for `problem_id`, or the generic fallback
    pub fn get(&self, problem_id: &str) -> &dyn ProblemHeuristics {
        self.by_problem
            .get(problem_id)
            .map(|h| h.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    pub fn contains(&self, problem_id: &str) -> bool {
        self.by_problem.contains_key(problem_id)
    }

    pub fn len(&self) -> usize {
        self.by_problem.len()
    }
}

impl Default for HeuristicsRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<T: ProblemHeuristics + ?Sized> ProblemHeuristics for &'static T {
    fn problem_id(&self) -> &str {
        (**self).problem_id()
    }

    fn assess(&self, evidence: &Evidence<'_>) -> Assessment {
        (**self).assess(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence<'a>(code: &'a str, language: &'a Language, signals: Signals) -> Evidence<'a> {
        Evidence {
            code,
            language,
            signals,
        }
    }

    struct FixedVerdict;

    impl ProblemHeuristics for FixedVerdict {
        fn problem_id(&self) -> &str {
            "fizz-buzz"
        }

        fn assess(&self, _evidence: &Evidence<'_>) -> Assessment {
            Assessment {
                optimal: true,
                time_complexity: "O(n)".into(),
                space_complexity: Some("O(1)".into()),
                issues: vec![],
                feedback: "Looks fine.".into(),
            }
        }
    }

    #[test]
    fn test_first_matching_row_wins() {
        let signals = Signals {
            hash_map: true,
            nested_loops: true,
            ..Default::default()
        };
        let java = Language::Java;
        let verdict = TWO_SUM.assess(&evidence("return seen;", &java, signals));
        assert!(verdict.optimal);
        assert_eq!(verdict.time_complexity, "O(n)");
        assert!(verdict.issues.is_empty());
    }

    #[test]
    fn test_sorting_marks_multiple_passes() {
        let signals = Signals {
            hash_map: true,
            ..Default::default()
        };
        let cpp = Language::Cpp;
        let verdict = TWO_SUM.assess(&evidence("sort(v.begin(), v.end()); return v;", &cpp, signals));
        assert_eq!(
            verdict.issues,
            vec!["Using HashMap but with multiple passes through the array".to_string()]
        );
    }

    #[test]
    fn test_generic_falls_through_to_unknown() {
        let python = Language::Python;
        let verdict = GENERIC.assess(&evidence("x = 1", &python, Signals::default()));
        assert_eq!(verdict.time_complexity, UNKNOWN);
        assert_eq!(verdict.issues, vec![UNCLEAR_ISSUE.to_string()]);
        assert!(!verdict.optimal);
    }

    #[test]
    fn test_registry_dispatch_and_fallback() {
        let registry = HeuristicsRegistry::builtin();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("two-sum").problem_id(), "two-sum");
        assert_eq!(registry.get("valid-parentheses").problem_id(), "*");
    }

    #[test]
    fn test_register_new_problem_without_touching_dispatch() {
        let mut registry = HeuristicsRegistry::builtin();
        registry.register(FixedVerdict);
        assert!(registry.contains("fizz-buzz"));

        let python = Language::Python;
        let verdict = registry
            .get("fizz-buzz")
            .assess(&evidence("for i in range(n): print(i)", &python, Signals::default()));
        assert_eq!(verdict.feedback, "Looks fine.");
    }
}
