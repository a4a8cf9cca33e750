//! External command execution.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SnapshotError};

/// Number of trailing stderr lines kept in error messages.
const STDERR_TAIL_LINES: usize = 20;

/// An external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: String,

    pub args: Vec<String>,

    /// Working directory, inherited when `None`.
    pub cwd: Option<PathBuf>,

    /// Timeout in seconds, 0 waits indefinitely.
    pub timeout_secs: u64,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout_secs: 0,
        }
    }

    /// Build from an argv-style vector (first element is the executable).
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SnapshotError::Config("empty command".to_string()))?;
        Ok(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Render for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub program: String,

    /// Exit code, -1 when terminated by a signal.
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,

    pub duration_ms: u64,

    pub success: bool,
}

impl CommandOutput {
    /// Turn a non-zero exit into `SnapshotError::CommandFailed`.
    pub fn into_result(self) -> Result<CommandOutput> {
        if self.success {
            Ok(self)
        } else {
            Err(SnapshotError::CommandFailed {
                program: self.program.clone(),
                exit_code: self.exit_code,
                stderr: stderr_tail(&self.stderr),
            })
        }
    }
}

/// Last few lines of stderr, trimmed.
pub fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Run a command to completion and capture its output.
///
/// Spawn failures and timeouts are errors; a non-zero exit is not.
pub async fn run_command(spec: &CommandSpec) -> Result<CommandOutput> {
    let start = Instant::now();
    debug!(command = %spec.display(), cwd = ?spec.cwd, "Running command");

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }

    let child = command.spawn().map_err(|source| SnapshotError::Spawn {
        program: spec.program.clone(),
        source,
    })?;

    let output = if spec.timeout_secs > 0 {
        tokio::time::timeout(
            Duration::from_secs(spec.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| SnapshotError::Timeout {
            program: spec.program.clone(),
            timeout_secs: spec.timeout_secs,
        })??
    } else {
        child.wait_with_output().await?
    };

    let duration_ms = start.elapsed().as_millis() as u64;

    Ok(CommandOutput {
        program: spec.program.clone(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration_ms,
        success: output.status.success(),
    })
}
