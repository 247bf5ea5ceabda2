//! Text rendering of reports, package lists and candidates.
//!
//! Format-only: every function returns a `String` and never prints.

use probeconf_core::{Candidate, ConfigureReport, PackageDescriptor, PackageOutcome, StubStatus};
use std::fmt::Write;

/// Horizontal separator line.
pub fn separator(width: usize) -> String {
    "-".repeat(width)
}

/// One line per package, with details for the selected installations.
pub fn format_report(report: &ConfigureReport) -> String {
    let mut out = String::new();
    for (key, outcome) in report.iter() {
        match outcome {
            PackageOutcome::Found { selection } => {
                let _ = writeln!(out, "{key}: found ({})", selection.candidate().name());
                if !selection.libraries().is_empty() {
                    let _ = writeln!(out, "    libraries: {}", selection.libraries());
                }
                if !selection.includes().is_empty() {
                    let _ = writeln!(out, "    includes:  {}", selection.includes());
                }
                if let Some(version) = selection.version() {
                    let _ = writeln!(out, "    version:   {version}");
                }
                if selection.is_shared() {
                    let _ = writeln!(out, "    shared");
                }
            }
            PackageOutcome::NotFound { attempts } => {
                let _ = writeln!(out, "{key}: not found ({} candidates tried)", attempts.len());
            }
            PackageOutcome::Disabled => {
                let _ = writeln!(out, "{key}: disabled");
            }
            PackageOutcome::Placeholder => {
                let _ = writeln!(out, "{key}: placeholder");
            }
        }
    }
    if let Some(stubs) = report.stubs() {
        let _ = writeln!(out, "fortran stubs: {}", format_stubs(stubs));
    }
    out
}

fn format_stubs(stubs: &StubStatus) -> String {
    match stubs {
        StubStatus::NotNeeded => "not needed".to_string(),
        StubStatus::Skipped => "skipped (no project directory)".to_string(),
        StubStatus::Present => "present".to_string(),
        StubStatus::Generated { bfort, problems } if problems.is_empty() => {
            format!("generated with {}", bfort.display())
        }
        StubStatus::Generated { bfort, problems } => format!(
            "generated with {} ({} warnings, see configure.log)",
            bfort.display(),
            problems.len()
        ),
    }
}

/// Table of the known packages.
pub fn format_packages(packages: &[PackageDescriptor]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<16} {:<9} {:<9} {:<8} {}",
        "KEY", "NAME", "ENABLED", "REQUIRED", "DOWNLOAD", "DEPENDS ON"
    );
    let _ = writeln!(out, "{}", separator(72));
    for package in packages {
        let kind = |flag: bool| if flag { "yes" } else { "no" };
        let (enabled, required) = if package.is_placeholder() {
            ("-", "-")
        } else {
            (
                kind(package.enabled_by_default),
                kind(package.required_by_default),
            )
        };
        let _ = writeln!(
            out,
            "{:<12} {:<16} {:<9} {:<9} {:<8} {}",
            package.key,
            package.display_name,
            enabled,
            required,
            kind(package.download.is_some()),
            package.dependencies.join(", ")
        );
    }
    out
}

/// Candidates in probe order, with their tier and contents.
pub fn format_candidates(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "No candidates.\n".to_string();
    }
    let mut out = String::new();
    for (index, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {} [{}]", index + 1, candidate.name(), candidate.tier());
        for group in candidate.libraries() {
            let shown = if group.is_empty() {
                "(compiler defaults)".to_string()
            } else {
                group.to_string()
            };
            let _ = writeln!(out, "       libraries: {shown}");
        }
        for group in candidate.includes().iter().filter(|g| !g.is_empty()) {
            let _ = writeln!(out, "       includes:  {group}");
        }
        if let Some(dir) = candidate.install_dir() {
            let _ = writeln!(out, "       installs into {}", dir.display());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use probeconf_core::builtin_packages;
    use probeconf_core::{IncludeGroup, LibraryGroup, Tier};

    #[test]
    fn test_package_table_lists_every_package() {
        let table = format_packages(&builtin_packages());
        assert!(table.starts_with("KEY"));
        for key in ["mpi", "blaslapack", "scotch", "chaco", "adic", "blocksolve"] {
            assert!(table.lines().any(|line| line.starts_with(key)), "{key} missing");
        }
        let scotch = table.lines().find(|l| l.starts_with("scotch")).unwrap();
        assert!(scotch.ends_with("mpi"));
    }

    #[test]
    fn test_candidates_show_compiler_defaults() {
        let candidates = vec![Candidate::new(
            "Default compiler locations",
            Tier::WellKnown,
            vec![LibraryGroup::default()],
            vec![IncludeGroup::default()],
        )];
        let text = format_candidates(&candidates);
        assert!(text.contains("1. Default compiler locations [well-known location]"));
        assert!(text.contains("(compiler defaults)"));
        assert_eq!(format_candidates(&[]), "No candidates.\n");
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(format_report(&ConfigureReport::default()), "");
    }
}
