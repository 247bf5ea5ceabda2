//! Command handlers.
//!
//! Handlers receive ports through the [`Configurator`] or as trait objects,
//! so tests drive them with the core's fakes.

use crate::error::CliError;
use crate::presentation;
use anyhow::Context;
use probeconf_core::{
    Candidate, CandidateGenerator, ConfigureOptions, ConfigureReport, ConfigureResult,
    Configurator, FileSystemProbe, PackageDescriptor, SubstitutionSink, builtin_packages,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::info;

pub const MAKEFILE: &str = "probeconf.mk";
pub const HEADER: &str = "probeconf.h";
pub const SUBSTITUTIONS_JSON: &str = "probeconf.json";
const HEADER_GUARD: &str = "PROBECONF_H";

/// Built-in packages restricted to `requested` and their dependencies.
///
/// An empty request selects every package. Registry order is kept.
pub fn select_packages(requested: &[String]) -> Result<Vec<PackageDescriptor>, CliError> {
    let all = builtin_packages();
    if requested.is_empty() {
        return Ok(all);
    }

    let mut wanted = BTreeSet::new();
    let mut pending: Vec<String> = requested.to_vec();
    while let Some(key) = pending.pop() {
        let descriptor = all
            .iter()
            .find(|d| d.key == key)
            .ok_or_else(|| CliError::Arguments(format!("Unknown package: {key}")))?;
        if wanted.insert(key) {
            pending.extend(descriptor.dependencies.iter().cloned());
        }
    }
    Ok(all.into_iter().filter(|d| wanted.contains(&d.key)).collect())
}

/// Run the configure pipeline and write its outputs into `output_dir`.
pub fn handle_configure(
    configurator: &Configurator<'_>,
    packages: &[PackageDescriptor],
    output_dir: &Path,
    json: bool,
) -> anyhow::Result<ConfigureReport> {
    let mut sink = SubstitutionSink::new();
    let report = configurator
        .run(packages, &mut sink)
        .map_err(CliError::from)?;
    write_outputs(&sink, output_dir)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Serializing configure report")?
        );
    } else {
        print!("{}", presentation::format_report(&report));
    }
    Ok(report)
}

/// Write the Makefile fragment, the C header and the JSON substitutions.
pub fn write_outputs(sink: &SubstitutionSink, output_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir)
        .map_err(CliError::from)
        .with_context(|| format!("Creating {}", output_dir.display()))?;

    let json = sink.to_json().context("Serializing substitutions")?;
    for (name, contents) in [
        (MAKEFILE, sink.render_makefile()),
        (HEADER, sink.render_header(HEADER_GUARD)),
        (SUBSTITUTIONS_JSON, json),
    ] {
        let path = output_dir.join(name);
        fs::write(&path, contents)
            .map_err(CliError::from)
            .with_context(|| format!("Writing {}", path.display()))?;
        info!(file = %path.display(), "Wrote configuration");
    }
    Ok(())
}

pub fn handle_list() {
    print!("{}", presentation::format_packages(&builtin_packages()));
}

/// Candidates for `key` in probe order, without probing them.
pub fn handle_candidates(
    key: &str,
    options: &ConfigureOptions,
    fs: &dyn FileSystemProbe,
) -> anyhow::Result<Vec<Candidate>> {
    let descriptor = builtin_packages()
        .into_iter()
        .find(|d| d.key == key)
        .ok_or_else(|| CliError::Arguments(format!("Unknown package: {key}")))?;
    let candidates = CandidateGenerator::new(&descriptor, options, fs)
        .candidates()
        .collect::<ConfigureResult<Vec<_>>>()
        .map_err(CliError::from)?;

    print!("{}", presentation::format_candidates(&candidates));
    Ok(candidates)
}

pub fn handle_dump(options: &ConfigureOptions) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(options).context("Serializing options")?
    );
    Ok(())
}
