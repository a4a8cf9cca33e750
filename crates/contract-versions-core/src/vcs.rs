//! Source checkout control for the shared working directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, SnapshotError};
use crate::process::{run_command, stderr_tail, CommandSpec};

/// Revision checked out before a run, restored after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Revision {
    /// A named branch.
    Branch(String),

    /// Detached HEAD, identified by its commit SHA.
    Detached(String),
}

impl Revision {
    /// The string handed to `checkout` when restoring.
    pub fn as_checkout_target(&self) -> &str {
        match self {
            Revision::Branch(name) => name,
            Revision::Detached(sha) => sha,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Branch(name) => write!(f, "{name}"),
            Revision::Detached(sha) => write!(f, "{sha} (detached)"),
        }
    }
}

/// Version-control capability over a single working directory.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// The revision currently checked out.
    async fn current_revision(&self) -> Result<Revision>;

    /// Switch the working directory to `revision`.
    async fn checkout(&self, revision: &str) -> Result<()>;

    /// Switch back to a previously captured revision.
    async fn restore(&self, revision: &Revision) -> Result<()> {
        self.checkout(revision.as_checkout_target()).await
    }
}

/// `VersionControl` backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    work_dir: PathBuf,
    timeout_secs: u64,
}

impl GitCli {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            timeout_secs: 0,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn git(&self, args: &[&str]) -> CommandSpec {
        CommandSpec::new("git")
            .args(args.iter().copied())
            .current_dir(&self.work_dir)
            .timeout_secs(self.timeout_secs)
    }

    async fn query(&self, args: &[&str]) -> Result<String> {
        let output = run_command(&self.git(args)).await?;
        if !output.success {
            return Err(SnapshotError::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr_tail(&output.stderr)
            )));
        }
        Ok(output.stdout.trim().to_string())
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn current_revision(&self) -> Result<Revision> {
        let branch = self.query(&["branch", "--show-current"]).await?;
        if !branch.is_empty() {
            return Ok(Revision::Branch(branch));
        }

        let sha = self.query(&["rev-parse", "HEAD"]).await?;
        if sha.is_empty() {
            return Err(SnapshotError::Git(
                "git rev-parse HEAD returned empty output".to_string(),
            ));
        }
        Ok(Revision::Detached(sha))
    }

    async fn checkout(&self, revision: &str) -> Result<()> {
        // Trailing `--` keeps git from reading an unknown revision as a pathspec.
        let output = run_command(&self.git(&["checkout", revision, "--"])).await?;
        if !output.success {
            return Err(SnapshotError::Checkout {
                revision: revision.to_string(),
                reason: stderr_tail(&output.stderr),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_checkout_target() {
        assert_eq!(Revision::Branch("main".into()).as_checkout_target(), "main");
        assert_eq!(Revision::Detached("abc".into()).as_checkout_target(), "abc");
    }

    #[test]
    fn test_revision_display() {
        assert_eq!(Revision::Branch("develop".into()).to_string(), "develop");
        assert!(Revision::Detached("abc".into()).to_string().contains("detached"));
    }

    #[test]
    fn test_revision_serializes_tagged() {
        let json = serde_json::to_value(Revision::Branch("main".into())).unwrap();
        assert_eq!(json["kind"], "branch");
        assert_eq!(json["value"], "main");
    }

    #[tokio::test]
    async fn test_current_revision_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new(dir.path());
        assert!(git.current_revision().await.is_err());
    }
}
