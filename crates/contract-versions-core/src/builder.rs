//! Build invocation in the checked-out working directory.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Result, SnapshotError};
use crate::manifest::VersionSpec;
use crate::process::{run_command, stderr_tail, CommandSpec};

/// Rebuilds contract artifacts for the currently checked-out revision.
#[async_trait]
pub trait Builder: Send + Sync {
    async fn build(&self, version: &VersionSpec) -> Result<()>;
}

/// `Builder` that runs a configured command (e.g. `yarn build`).
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: Vec<String>,
    work_dir: PathBuf,
    timeout_secs: u64,
}

impl CommandBuilder {
    pub fn new(command: Vec<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            work_dir: work_dir.into(),
            timeout_secs: 0,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn spec(&self) -> Result<CommandSpec> {
        Ok(CommandSpec::from_argv(&self.command)?
            .current_dir(&self.work_dir)
            .timeout_secs(self.timeout_secs))
    }
}

#[async_trait]
impl Builder for CommandBuilder {
    async fn build(&self, version: &VersionSpec) -> Result<()> {
        let spec = self.spec()?;
        debug!(version = %version.name, command = %spec.display(), "Building contracts");

        let output = run_command(&spec).await?;
        if !output.success {
            return Err(SnapshotError::Build(format!(
                "`{}` exited with code {}: {}",
                spec.display(),
                output.exit_code,
                stderr_tail(&output.stderr)
            )));
        }
        Ok(())
    }
}
