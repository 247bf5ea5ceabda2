//! Subcommand definitions.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe every enabled package and write the build configuration
    Configure {
        /// Directory for probeconf.mk, probeconf.h, probeconf.json and configure.log
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Configure only these packages (and what they depend on)
        #[arg(long, value_delimiter = ',')]
        packages: Vec<String>,

        /// Print the configure report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// List the packages probeconf knows about
    List,

    /// Show the candidates a package would be probed with, without probing
    Candidates {
        /// Package key, such as mpi or blaslapack
        package: String,
    },

    /// Print the effective options after all configuration layers
    Dump,
}

impl Commands {
    /// Directory `configure.log` goes to, for commands that write one.
    pub fn log_dir(&self) -> Option<&std::path::Path> {
        match self {
            Self::Configure { output_dir, .. } => Some(output_dir),
            _ => None,
        }
    }
}
