//! Blocking process execution with timeouts.
//!
//! The engine is synchronous. Adapters that need timeouts or HTTP own a
//! current-thread tokio runtime and block on it.

use std::future::Future;
use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::runtime::{Builder, Runtime};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn: {0}")]
    Spawn(#[source] io::Error),

    #[error("timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),
}

/// A private runtime used to drive child processes and downloads.
#[derive(Debug)]
pub struct BlockingRuntime {
    runtime: Runtime,
}

impl BlockingRuntime {
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { runtime })
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Run `command` to completion, killing it when `timeout` expires.
    ///
    /// Stdin is closed; stdout and stderr are captured.
    pub fn output(&self, mut command: Command, timeout: Duration) -> Result<Output, ProcessError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.block_on(async move {
            match tokio::time::timeout(timeout, command.output()).await {
                Ok(result) => result.map_err(ProcessError::Spawn),
                Err(_) => Err(ProcessError::Timeout(timeout)),
            }
        })
    }
}

/// Exit code of a finished process; signals map to -1.
pub fn exit_code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_output() {
        let runtime = BlockingRuntime::new().unwrap();
        let mut command = Command::new("sh");
        command.arg("-c").arg("echo out; echo err >&2; exit 3");
        let output = runtime.output(command, Duration::from_secs(10)).unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "err\n");
        assert_eq!(exit_code(&output), 3);
    }

    #[test]
    fn test_timeout_kills_child() {
        let runtime = BlockingRuntime::new().unwrap();
        let mut command = Command::new("sh");
        command.arg("-c").arg("sleep 5");
        let err = runtime.output(command, Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, ProcessError::Timeout(_)));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let runtime = BlockingRuntime::new().unwrap();
        let command = Command::new("/nonexistent/probeconf-test-binary");
        let err = runtime.output(command, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ProcessError::Spawn(_)));
    }
}
