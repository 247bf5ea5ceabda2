//! Shell port: run a command line with a timeout.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {} seconds", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` exited with status {status}:\n{output}")]
    Failed {
        command: String,
        status: i32,
        output: String,
    },

    #[error("Could not start the process runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

pub type ShellResult<T> = Result<T, ShellError>;

/// A command line run through `sh -c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub command: String,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// Directories put in front of `PATH`
    pub path_prepend: Vec<PathBuf>,
    pub timeout: Duration,
}

impl ShellCommand {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            cwd: None,
            env: Vec::new(),
            path_prepend: Vec::new(),
            timeout,
        }
    }

    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn prepend_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path_prepend.push(dir.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl ShellOutput {
    /// Turn a non-zero exit status into [`ShellError::Failed`].
    pub fn ensure_success(self, command: &ShellCommand) -> ShellResult<Self> {
        if self.status == 0 {
            Ok(self)
        } else {
            Err(ShellError::Failed {
                command: command.command.clone(),
                status: self.status,
                output: format!("{}{}", self.stdout, self.stderr),
            })
        }
    }
}

pub trait ShellRunner {
    /// Run `command`, returning its output whatever the exit status.
    fn run(&self, command: &ShellCommand) -> ShellResult<ShellOutput>;
}

impl<T: ShellRunner + ?Sized> ShellRunner for &T {
    fn run(&self, command: &ShellCommand) -> ShellResult<ShellOutput> {
        (**self).run(command)
    }
}
