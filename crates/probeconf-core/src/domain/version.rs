//! Detected dependency versions.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Dotted numeric version, e.g. `2.1` or `3.4.1`.
///
/// Ordering compares components numerically with missing trailing
/// components treated as zero, so `2.0 == 2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    components: Vec<u32>,
    text: String,
}

impl Version {
    /// Extract the version printed at the start of a line of program output.
    ///
    /// Batch systems sometimes prefix the output of the version program
    /// with lines of their own, so each line is tried in turn. Numbers in
    /// the middle of a line, such as job ids, are never taken.
    pub fn extract(output: &str) -> Option<Self> {
        let pattern = Regex::new(r"(?m)^\s*(\d+(?:\.\d+)*)").ok()?;
        pattern
            .captures_iter(output)
            .find_map(|caps| Self::parse(caps.get(1)?.as_str()))
    }

    /// Parse an exact dotted version string.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let components = text
            .split('.')
            .map(|part| part.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            components,
            text: text.to_string(),
        })
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let a = self.components.get(i).copied().unwrap_or(0);
                let b = other.components.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
