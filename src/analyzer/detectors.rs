//! Surface-pattern detectors
//!
//! Each detector is a plain `fn(&str) -> bool` registered in [`RULES`] under
//! a (language family, pattern kind) key. Lookups fall back to the generic
//! family, so every kind always resolves to some matcher.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    NestedLoops,
    HashMap,
    Recursion,
    StringConversion,
    PriorityQueue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Cpp,
    Java,
    Python,
    Generic,
}

impl From<&Language> for Family {
    fn from(language: &Language) -> Self {
        match language {
            Language::Cpp => Family::Cpp,
            Language::Java => Family::Java,
            Language::Python => Family::Python,
            Language::Other(_) => Family::Generic,
        }
    }
}

pub type Matcher = fn(&str) -> bool;

struct Rule {
    family: Family,
    kind: PatternKind,
    matcher: Matcher,
}

static RULES: &[Rule] = &[
    // nested loops
    Rule { family: Family::Python, kind: PatternKind::NestedLoops, matcher: indented_nested_loops },
    Rule { family: Family::Generic, kind: PatternKind::NestedLoops, matcher: brace_loop_count },
    // hash maps
    Rule { family: Family::Java, kind: PatternKind::HashMap, matcher: java_hash_map },
    Rule { family: Family::Cpp, kind: PatternKind::HashMap, matcher: cpp_hash_map },
    Rule { family: Family::Python, kind: PatternKind::HashMap, matcher: python_hash_map },
    Rule { family: Family::Generic, kind: PatternKind::HashMap, matcher: generic_hash_map },
    // recursion
    Rule { family: Family::Java, kind: PatternKind::Recursion, matcher: java_recursion },
    Rule { family: Family::Cpp, kind: PatternKind::Recursion, matcher: cpp_recursion },
    Rule { family: Family::Python, kind: PatternKind::Recursion, matcher: python_recursion },
    Rule { family: Family::Generic, kind: PatternKind::Recursion, matcher: never },
    // string conversion
    Rule { family: Family::Java, kind: PatternKind::StringConversion, matcher: java_string_conversion },
    Rule { family: Family::Cpp, kind: PatternKind::StringConversion, matcher: cpp_string_conversion },
    Rule { family: Family::Python, kind: PatternKind::StringConversion, matcher: python_string_conversion },
    Rule { family: Family::Generic, kind: PatternKind::StringConversion, matcher: generic_string_conversion },
    // priority queues
    Rule { family: Family::Java, kind: PatternKind::PriorityQueue, matcher: java_priority_queue },
    Rule { family: Family::Cpp, kind: PatternKind::PriorityQueue, matcher: cpp_priority_queue },
    Rule { family: Family::Python, kind: PatternKind::PriorityQueue, matcher: python_priority_queue },
    Rule { family: Family::Generic, kind: PatternKind::PriorityQueue, matcher: generic_priority_queue },
];

/// Resolve the matcher for `kind` in `language`
pub fn matcher_for(language: &Language, kind: PatternKind) -> Matcher {
    let family = Family::from(language);
    let lookup = |family: Family| {
        RULES
            .iter()
            .find(|rule| rule.family == family && rule.kind == kind)
            .map(|rule| rule.matcher)
    };

    lookup(family)
        .or_else(|| lookup(Family::Generic))
        .unwrap_or(never)
}

/// Everything the detectors found in one submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub nested_loops: bool,
    pub hash_map: bool,
    pub recursion: bool,
    pub string_conversion: bool,
    pub priority_queue: bool,
}

impl Signals {
    pub fn detect(code: &str, language: &Language) -> Self {
        let check = |kind| matcher_for(language, kind)(code);
        Self {
            nested_loops: check(PatternKind::NestedLoops),
            hash_map: check(PatternKind::HashMap),
            recursion: check(PatternKind::Recursion),
            string_conversion: check(PatternKind::StringConversion),
            priority_queue: check(PatternKind::PriorityQueue),
        }
    }
}

fn never(_code: &str) -> bool {
    false
}

// ---- loops ----

static LOOP_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:for|while)\s*\(").unwrap());

/// Brace languages: two or more loop keywords anywhere count as nesting.
/// Sequential loops are reported too.
fn brace_loop_count(code: &str) -> bool {
    LOOP_CALL.find_iter(code).count() >= 2
}

/// Indentation languages: a second `for`/`while` header line counts, whether
/// it sits inside the first loop's block or after it. Comments are skipped.
fn indented_nested_loops(code: &str) -> bool {
    code.lines()
        .map(str::trim_start)
        .filter(|line| !line.starts_with('#'))
        .filter(|line| line.starts_with("for ") || line.starts_with("while "))
        .nth(1)
        .is_some()
}

// ---- hash maps ----

fn java_hash_map(code: &str) -> bool {
    code.contains("HashMap") || code.contains("Map<")
}

fn cpp_hash_map(code: &str) -> bool {
    code.contains("unordered_map") || code.contains("map<")
}

fn python_hash_map(code: &str) -> bool {
    code.contains("dict(")
        || code.contains("{}")
        || code.contains("defaultdict")
        || (code.contains(" in ") && !code.contains("for ") && !code.contains("while "))
}

fn generic_hash_map(code: &str) -> bool {
    code.contains("Map") || code.contains("map") || code.contains("dict") || code.contains("{}")
}

// ---- recursion ----

static JAVA_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(\w+)\s*\([^)]*\)\s*\{").unwrap());

static CPP_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w:<>,*&]+\s+[*&]?(\w+)\s*\([^)]*\)\s*\{").unwrap());

static PYTHON_DEF: Lazy<Regex> = Lazy::new(|| Regex::new(r"def\s+(\w+)\s*\(").unwrap());

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "else", "new", "sizeof", "synchronized",
];

/// Takes the first declared function name and reports whether it is called
/// again after its declaration. Purely textual: comments and shadowed names
/// are not understood.
fn calls_itself(code: &str, declaration: &Regex) -> bool {
    let Some(captures) = declaration.captures_iter(code).find(|c| {
        c.get(1)
            .is_some_and(|name| !CONTROL_KEYWORDS.contains(&name.as_str()))
    }) else {
        return false;
    };

    let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
        return false;
    };

    let body = &code[whole.end()..];
    match Regex::new(&format!(r"\b{}\s*\(", regex::escape(name.as_str()))) {
        Ok(call) => call.is_match(body),
        Err(_) => false,
    }
}

fn java_recursion(code: &str) -> bool {
    calls_itself(code, &JAVA_METHOD)
}

fn cpp_recursion(code: &str) -> bool {
    calls_itself(code, &CPP_FUNCTION)
}

fn python_recursion(code: &str) -> bool {
    calls_itself(code, &PYTHON_DEF)
}

// ---- string conversion ----

fn java_string_conversion(code: &str) -> bool {
    code.contains(".toString()") || code.contains("String.valueOf")
}

fn cpp_string_conversion(code: &str) -> bool {
    code.contains("to_string") || code.contains("std::string")
}

fn python_string_conversion(code: &str) -> bool {
    code.contains("str(") || code.contains(".__str__")
}

fn generic_string_conversion(code: &str) -> bool {
    code.contains("toString") || code.contains("String")
}

// ---- priority queues ----

fn java_priority_queue(code: &str) -> bool {
    code.contains("PriorityQueue") || code.contains("Heap")
}

fn cpp_priority_queue(code: &str) -> bool {
    code.contains("priority_queue") || code.contains("make_heap")
}

fn python_priority_queue(code: &str) -> bool {
    code.contains("heapq") || code.contains("PriorityQueue")
}

fn generic_priority_queue(code: &str) -> bool {
    java_priority_queue(code) || cpp_priority_queue(code) || python_priority_queue(code)
}
