//! Layered option loading.
//!
//! Later layers win: built-in defaults, the JSON `--config` file, the
//! environment and named CLI flags, then package options such as
//! `--with-mpi-dir`.

use crate::error::CliError;
use crate::parser::Cli;
use probeconf_core::ConfigureOptions;
use std::env;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Build the effective options for one invocation.
pub fn load_options(cli: &Cli, package_args: &[String]) -> Result<ConfigureOptions, CliError> {
    let mut options = match &cli.config {
        Some(path) => read_config_file(path)?,
        None => ConfigureOptions::default(),
    };

    apply_cli(&mut options, cli);
    if options.home_dir.is_none() {
        options.home_dir = env::var_os("HOME").map(Into::into);
    }
    options.apply_arguments(package_args)?;

    debug!(
        packages = options.packages.len(),
        project_dir = ?options.project_dir,
        arch = options.arch_name(),
        "Options loaded"
    );
    Ok(options)
}

fn read_config_file(path: &Path) -> Result<ConfigureOptions, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|err| CliError::Config(format!("Cannot read {}: {err}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|err| CliError::Config(format!("Invalid config file {}: {err}", path.display())))
}

fn apply_cli(options: &mut ConfigureOptions, cli: &Cli) {
    if let Some(dir) = &cli.project_dir {
        options.project_dir = Some(dir.clone());
    }
    if let Some(arch) = &cli.arch {
        options.arch = Some(arch.clone());
    }

    let compilers = &mut options.compilers;
    for (slot, value) in [
        (&mut compilers.cc, &cli.cc),
        (&mut compilers.cxx, &cli.cxx),
        (&mut compilers.fc, &cli.fc),
    ] {
        if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
            *slot = Some(value.clone());
        }
    }

    let flags = &mut options.flags;
    for (slot, value) in [
        (&mut flags.cppflags, &cli.cppflags),
        (&mut flags.cflags, &cli.cflags),
        (&mut flags.ldflags, &cli.ldflags),
        (&mut flags.libs, &cli.libs),
    ] {
        if let Some(value) = value {
            *slot = value.split_whitespace().map(ToString::to_string).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use probeconf_core::DownloadPolicy;
    use std::path::PathBuf;

    #[test]
    fn test_package_args_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probeconf.json");
        fs::write(
            &path,
            r#"{
                "arch": "linux-debug",
                "package-dirs": ["/soft"],
                "packages": { "mpi": { "dir": "/opt/old-mpich" } }
            }"#,
        )
        .unwrap();

        let cli = Cli::parse_from([
            "probeconf",
            "--config",
            path.to_str().unwrap(),
            "--arch",
            "linux-opt",
            "dump",
        ]);
        let options = load_options(
            &cli,
            &["--with-mpi-dir=/opt/mpich".to_string(), "--download-scotch".to_string()],
        )
        .unwrap();

        assert_eq!(options.arch.as_deref(), Some("linux-opt"));
        assert_eq!(options.package_dirs, vec![PathBuf::from("/soft")]);
        assert_eq!(
            options.package("mpi").and_then(|p| p.dir.clone()),
            Some(PathBuf::from("/opt/mpich"))
        );
        assert_eq!(options.package_or_default("scotch").download, DownloadPolicy::Always);
    }

    #[test]
    fn test_flags_split_on_whitespace() {
        let cli = Cli::parse_from(["probeconf", "--cflags=-O2  -g", "--libs", "-lm", "dump"]);
        let options = load_options(&cli, &[]).unwrap();
        assert_eq!(options.flags.cflags, vec!["-O2", "-g"]);
        assert_eq!(options.flags.libs, vec!["-lm"]);
    }

    #[test]
    fn test_bad_config_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let cli = Cli::parse_from(["probeconf", "--config", path.to_str().unwrap(), "list"]);
        assert_eq!(load_options(&cli, &[]).unwrap_err().exit_code(), 78);
    }

    #[test]
    fn test_unknown_package_option_is_usage_error() {
        let cli = Cli::parse_from(["probeconf", "list"]);
        let err = load_options(&cli, &["--with-mpi-frobnicate=1".to_string()]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
