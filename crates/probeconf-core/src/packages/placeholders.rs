//! Packages that are declared but not searched for yet.

use crate::domain::{PackageDescriptor, Placeholder};

fn placeholder(key: &str, display_name: &str, entries: &[(&str, &str)]) -> PackageDescriptor {
    PackageDescriptor {
        key: key.to_string(),
        display_name: display_name.to_string(),
        substitution_prefix: key.to_uppercase(),
        placeholders: entries
            .iter()
            .map(|(name, description)| Placeholder {
                name: (*name).to_string(),
                description: (*description).to_string(),
            })
            .collect(),
        ..Default::default()
    }
}

pub fn adic() -> PackageDescriptor {
    placeholder(
        "adic",
        "ADIC",
        &[
            ("ADIC_DEFINES", "ADIC preprocessor definitions"),
            ("ADIC_CC", "ADIC compiler"),
        ],
    )
}

pub fn blocksolve() -> PackageDescriptor {
    placeholder(
        "blocksolve",
        "BlockSolve",
        &[
            ("BLOCKSOLVE_INCLUDE", "The BlockSolve include flags"),
            ("BLOCKSOLVE_LIB", "The BlockSolve library flags"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_not_probed() {
        for descriptor in [adic(), blocksolve()] {
            assert!(descriptor.is_placeholder(), "{} should be a placeholder", descriptor.key);
            assert_eq!(descriptor.placeholders.len(), 2);
        }
    }
}
