//! `sh -c` adapter for the shell port.

use crate::process::{BlockingRuntime, ProcessError, exit_code};
use probeconf_core::ports::{ShellCommand, ShellError, ShellOutput, ShellResult, ShellRunner};
use std::env;
use std::ffi::OsString;
use tokio::process::Command;
use tracing::debug;

/// Runs command lines through the host's `sh`.
#[derive(Debug)]
pub struct SystemShell {
    runtime: BlockingRuntime,
}

impl SystemShell {
    pub fn new() -> ShellResult<Self> {
        Ok(Self {
            runtime: BlockingRuntime::new().map_err(ShellError::Runtime)?,
        })
    }
}

/// `PATH` with `prepend` in front of the current value.
fn search_path(prepend: &[std::path::PathBuf]) -> Option<OsString> {
    if prepend.is_empty() {
        return None;
    }
    let current = env::var_os("PATH").unwrap_or_default();
    let dirs = prepend.iter().cloned().chain(env::split_paths(&current));
    env::join_paths(dirs).ok()
}

impl ShellRunner for SystemShell {
    fn run(&self, command: &ShellCommand) -> ShellResult<ShellOutput> {
        let mut process = Command::new("sh");
        process.arg("-c").arg(&command.command);
        if let Some(dir) = &command.cwd {
            process.current_dir(dir);
        }
        for (key, value) in &command.env {
            process.env(key, value);
        }
        if let Some(path) = search_path(&command.path_prepend) {
            process.env("PATH", path);
        }

        debug!(
            command = %command.command,
            cwd = ?command.cwd,
            timeout_secs = command.timeout.as_secs(),
            "Running shell command"
        );
        let output = self
            .runtime
            .output(process, command.timeout)
            .map_err(|err| match err {
                ProcessError::Spawn(source) => ShellError::Spawn {
                    command: command.command.clone(),
                    source,
                },
                ProcessError::Timeout(timeout) => ShellError::Timeout {
                    command: command.command.clone(),
                    timeout,
                },
            })?;

        let status = exit_code(&output);
        debug!(command = %command.command, status, "Shell command finished");
        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status,
        })
    }
}
