//! Tiny test programs handed to the toolchain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source language of a test program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cxx,
    Fortran,
}

impl Language {
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::C => "C",
            Self::Cxx => "C++",
            Self::Fortran => "Fortran",
        }
    }

    /// Source file extension. Fortran uses `.F` so the preprocessor runs.
    pub const fn source_extension(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cxx => "C",
            Self::Fortran => "F",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A program made of a prologue (includes, declarations) and a main body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestProgram {
    pub language: Language,
    pub includes: String,
    pub body: String,
}

impl TestProgram {
    pub fn new(language: Language, includes: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            language,
            includes: includes.into(),
            body: body.into(),
        }
    }

    /// C program that references `symbol` without a prototype, so linking
    /// succeeds exactly when some library defines it.
    pub fn symbol_reference(symbol: &str) -> Self {
        Self::new(
            Language::C,
            format!("/* Override any gcc2 internal prototype to avoid an error. */\nchar {symbol}();\n"),
            format!("{symbol}();\n"),
        )
    }

    /// Preprocessor-only source including each header.
    pub fn header_inclusion(headers: &[String]) -> String {
        headers
            .iter()
            .map(|header| format!("#include <{header}>\n"))
            .collect()
    }

    /// Full source text for the program.
    pub fn source(&self) -> String {
        match self.language {
            Language::C | Language::Cxx => format!(
                "{}\nint main() {{\n{}\n  return 0;\n}}\n",
                self.includes, self.body
            ),
            Language::Fortran => format!(
                "      program main\n{}{}      end\n",
                self.includes, self.body
            ),
        }
    }
}
