//! CLI argument definitions.

use crate::commands::Commands;
use clap::Parser;
use std::path::PathBuf;

/// Locate external libraries and write build configuration for them
#[derive(Parser, Debug)]
#[command(name = "probeconf")]
#[command(about = "Locate external libraries and write build configuration for them", long_about = None)]
#[command(version)]
#[command(after_help = "Package options (--with-<pkg>[-dir|-include|-lib|-shared|-required]=<value>, \
--download-<pkg>[=yes|no|ifneeded], --package-dirs=<dirs>) may be given anywhere on the command line.")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON file with default options
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root of the project being configured
    #[arg(long, global = true, env = "PROBECONF_PROJECT_DIR", value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Build configuration name used for per-arch directories
    #[arg(long, global = true, env = "PROBECONF_ARCH")]
    pub arch: Option<String>,

    /// C compiler
    #[arg(long, global = true, env = "CC")]
    pub cc: Option<String>,

    /// C++ compiler (0 disables C++)
    #[arg(long, global = true, env = "CXX")]
    pub cxx: Option<String>,

    /// Fortran compiler (0 disables Fortran)
    #[arg(long, global = true, env = "FC")]
    pub fc: Option<String>,

    /// Preprocessor flags every probe starts from
    #[arg(long, global = true, env = "CPPFLAGS", allow_hyphen_values = true)]
    pub cppflags: Option<String>,

    /// Compiler flags for probes and source builds
    #[arg(long, global = true, env = "CFLAGS", allow_hyphen_values = true)]
    pub cflags: Option<String>,

    /// Linker flags every probe starts from
    #[arg(long, global = true, env = "LDFLAGS", allow_hyphen_values = true)]
    pub ldflags: Option<String>,

    /// Libraries every probe links against
    #[arg(long, global = true, env = "LIBS", allow_hyphen_values = true)]
    pub libs: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

const PACKAGE_OPTION_PREFIXES: [&str; 5] = [
    "--with-",
    "--download-",
    "--package-dirs",
    "--can-execute",
    "--override-policy",
];

/// Separate package options from the arguments clap understands.
///
/// Package options are open-ended (`--with-<pkg>-dir`) and cannot be
/// declared up front, so they are lifted out of `args` before parsing.
/// Arguments after a bare `--` are left to clap.
pub fn split_configure_args<I, S>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut cli_args = Vec::new();
    let mut package_args = Vec::new();
    let mut passthrough = false;
    for arg in args.into_iter().map(Into::into) {
        if arg == "--" {
            passthrough = true;
        }
        if !passthrough && PACKAGE_OPTION_PREFIXES.iter().any(|p| arg.starts_with(p)) {
            package_args.push(arg);
        } else {
            cli_args.push(arg);
        }
    }
    (cli_args, package_args)
}
