use std::fmt;

use serde::{Deserialize, Serialize};

/// Language tag attached to a submission.
///
/// The three editor languages get dedicated heuristics; anything else is
/// kept verbatim (lowercased) and analyzed with the generic rules.
/// Common aliases are accepted (e.g. "c++", "cc", "py").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    Cpp,
    Java,
    Python,
    Other(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Python => "python",
            Language::Other(name) => name,
        }
    }

    /// Languages with starter code in the catalog
    pub fn supported() -> [Language; 3] {
        [Language::Cpp, Language::Java, Language::Python]
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Cpp
    }
}

impl From<&str> for Language {
    fn from(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "cpp" | "c++" | "cc" => Language::Cpp,
            "java" => Language::Java,
            "python" | "py" | "python3" => Language::Python,
            other => Language::Other(other.to_string()),
        }
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        Language::from(tag.as_str())
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.as_str().to_string()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
