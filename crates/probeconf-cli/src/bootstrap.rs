//! Wiring of the host adapters.
//!
//! This is the only place the CLI names concrete adapter types; handlers
//! work with the [`Configurator`] and the core port traits.

use crate::error::CliError;
use probeconf_core::{ConfigureOptions, Configurator};
use probeconf_runtime::{CcToolchain, HostFileSystem, SourceInstaller, SystemShell};
use tracing::debug;

/// Host adapters for one invocation.
pub struct HostContext {
    toolchain: CcToolchain,
    fs: HostFileSystem,
    shell: SystemShell,
    installer: SourceInstaller<SystemShell>,
}

impl HostContext {
    /// Detect compilers and set up the shell and source installer.
    pub fn new(options: &ConfigureOptions) -> Result<Self, CliError> {
        let toolchain = CcToolchain::detect(&options.compilers)
            .map_err(|err| CliError::Process(err.to_string()))?
            .with_cflags(options.flags.cflags.join(" "));
        let shell = SystemShell::new().map_err(|err| CliError::Process(err.to_string()))?;
        let installer_shell = SystemShell::new().map_err(|err| CliError::Process(err.to_string()))?;
        let installer =
            SourceInstaller::new(installer_shell).map_err(|err| CliError::Install(err.to_string()))?;
        debug!("Host adapters ready");
        Ok(Self {
            toolchain,
            fs: HostFileSystem::new(),
            shell,
            installer,
        })
    }

    pub fn configurator<'a>(&'a self, options: &'a ConfigureOptions) -> Configurator<'a> {
        Configurator::new(&self.toolchain, &self.fs, &self.shell, &self.installer, options)
    }
}

