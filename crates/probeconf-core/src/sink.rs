//! Substitutions and defines produced by a configure run.
//!
//! All packages write into one sink. The CLI renders it as a Makefile
//! fragment, a C header and JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

/// Value of a substitution: plain text or a list joined by spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubstitutionValue {
    Text(String),
    List(Vec<String>),
}

impl SubstitutionValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

impl fmt::Display for SubstitutionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::List(items) => write!(f, "{}", items.join(" ")),
        }
    }
}

impl From<String> for SubstitutionValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for SubstitutionValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<String>> for SubstitutionValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub value: SubstitutionValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Named substitutions and preprocessor defines. Setting a key again
/// replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionSink {
    substitutions: BTreeMap<String, Substitution>,
    defines: BTreeMap<String, String>,
}

impl SubstitutionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_substitution(&mut self, name: &str, value: impl Into<SubstitutionValue>) {
        let description = self
            .substitutions
            .remove(name)
            .and_then(|existing| existing.description);
        self.substitutions.insert(
            name.to_string(),
            Substitution {
                value: value.into(),
                description,
            },
        );
    }

    pub fn add_described(
        &mut self,
        name: &str,
        value: impl Into<SubstitutionValue>,
        description: &str,
    ) {
        self.substitutions.insert(
            name.to_string(),
            Substitution {
                value: value.into(),
                description: Some(description.to_string()),
            },
        );
    }

    pub fn add_define(&mut self, name: &str, value: impl Into<String>) {
        self.defines.insert(name.to_string(), value.into());
    }

    pub fn substitution(&self, name: &str) -> Option<&SubstitutionValue> {
        self.substitutions.get(name).map(|s| &s.value)
    }

    pub fn define(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }

    pub const fn substitutions(&self) -> &BTreeMap<String, Substitution> {
        &self.substitutions
    }

    pub const fn defines(&self) -> &BTreeMap<String, String> {
        &self.defines
    }

    /// `NAME = value` lines, with descriptions as comments.
    pub fn render_makefile(&self) -> String {
        let mut out = String::new();
        for (name, substitution) in &self.substitutions {
            if let Some(description) = &substitution.description {
                let _ = writeln!(out, "# {description}");
            }
            let _ = writeln!(out, "{name} = {}", substitution.value);
        }
        out
    }

    /// A C header with one `#define` per define, wrapped in an include guard.
    pub fn render_header(&self, guard: &str) -> String {
        let mut out = format!("#if !defined({guard})\n#define {guard}\n\n");
        for (name, value) in &self.defines {
            let _ = writeln!(out, "#ifndef {name}\n#define {name} {value}\n#endif");
        }
        let _ = writeln!(out, "\n#endif");
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
