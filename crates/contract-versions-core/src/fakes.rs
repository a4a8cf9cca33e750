//! In-memory fakes for the external tool traits (testing only)
//!
//! Provides `FakeVersionControl`, `FakeBuilder`, and `FakeBindingGenerator`
//! that record every call into a shared `CallLog`, so tests can assert the
//! order in which the orchestrator drives its collaborators.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::bindings::BindingGenerator;
use crate::builder::Builder;
use crate::error::{Result, SnapshotError};
use crate::manifest::VersionSpec;
use crate::vcs::{Revision, VersionControl};

/// A recorded call to one of the fakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CurrentRevision,
    Checkout(String),
    Restore(String),
    Build(String),
    Generate { files: Vec<PathBuf>, dest: PathBuf },
}

/// Ordered call log shared between fakes.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// FakeVersionControl
// ---------------------------------------------------------------------------

/// Working directory whose HEAD lives in memory.
#[derive(Debug)]
pub struct FakeVersionControl {
    log: CallLog,
    head: Mutex<Revision>,
    unknown: HashSet<String>,
    fail_capture: bool,
    fail_restore: bool,
}

impl FakeVersionControl {
    /// Start on the given branch.
    pub fn on_branch(branch: &str, log: CallLog) -> Self {
        Self {
            log,
            head: Mutex::new(Revision::Branch(branch.to_string())),
            unknown: HashSet::new(),
            fail_capture: false,
            fail_restore: false,
        }
    }

    /// Revisions that checkout rejects.
    pub fn with_unknown(mut self, revisions: &[&str]) -> Self {
        self.unknown.extend(revisions.iter().map(|r| r.to_string()));
        self
    }

    pub fn failing_capture(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    pub fn failing_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }

    pub fn head(&self) -> Revision {
        self.head.lock().unwrap().clone()
    }
}

#[async_trait]
impl VersionControl for FakeVersionControl {
    async fn current_revision(&self) -> Result<Revision> {
        self.log.push(Call::CurrentRevision);
        if self.fail_capture {
            return Err(SnapshotError::Git("not a git repository".to_string()));
        }
        Ok(self.head())
    }

    async fn checkout(&self, revision: &str) -> Result<()> {
        self.log.push(Call::Checkout(revision.to_string()));
        if self.unknown.contains(revision) {
            return Err(SnapshotError::Checkout {
                revision: revision.to_string(),
                reason: format!("fatal: invalid reference: {revision}"),
            });
        }
        *self.head.lock().unwrap() = Revision::Detached(revision.to_string());
        Ok(())
    }

    async fn restore(&self, revision: &Revision) -> Result<()> {
        self.log.push(Call::Restore(revision.as_checkout_target().to_string()));
        if self.fail_restore {
            return Err(SnapshotError::Checkout {
                revision: revision.as_checkout_target().to_string(),
                reason: "local changes would be overwritten".to_string(),
            });
        }
        *self.head.lock().unwrap() = revision.clone();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeBuilder
// ---------------------------------------------------------------------------

/// Builder that optionally writes a fake artifact tree per version.
#[derive(Debug)]
pub struct FakeBuilder {
    log: CallLog,
    failing: HashSet<String>,
    artifacts_dir: Option<PathBuf>,
}

impl FakeBuilder {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            failing: HashSet::new(),
            artifacts_dir: None,
        }
    }

    /// Version names whose build fails.
    pub fn with_failing(mut self, names: &[&str]) -> Self {
        self.failing.extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Write `<dir>/Dao.sol/Dao.json` (plus a debug variant) on every build.
    pub fn writing_artifacts(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl Builder for FakeBuilder {
    async fn build(&self, version: &VersionSpec) -> Result<()> {
        self.log.push(Call::Build(version.name.clone()));
        if self.failing.contains(&version.name) {
            return Err(SnapshotError::Build(format!(
                "`yarn build` exited with code 1 for {}",
                version.name
            )));
        }
        if let Some(dir) = &self.artifacts_dir {
            let contract_dir = dir.join("Dao.sol");
            std::fs::create_dir_all(&contract_dir)?;
            let body = format!("{{\"contractName\":\"Dao\",\"commit\":\"{}\"}}", version.commit);
            std::fs::write(contract_dir.join("Dao.json"), &body)?;
            std::fs::write(contract_dir.join("Dao.dbg.json"), "{}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeBindingGenerator
// ---------------------------------------------------------------------------

/// Generator that records its input and writes a marker into `dest`.
#[derive(Debug)]
pub struct FakeBindingGenerator {
    log: CallLog,
    fail: bool,
}

impl FakeBindingGenerator {
    pub fn new(log: CallLog) -> Self {
        Self { log, fail: false }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl BindingGenerator for FakeBindingGenerator {
    async fn generate(&self, files: &[PathBuf], dest: &Path) -> Result<()> {
        self.log.push(Call::Generate {
            files: files.to_vec(),
            dest: dest.to_path_buf(),
        });
        if self.fail {
            return Err(SnapshotError::Generation(
                "typechain exited with code 1".to_string(),
            ));
        }
        std::fs::create_dir_all(dest)?;
        std::fs::write(dest.join("index.ts"), format!("// {} contracts\n", files.len()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_vcs_checkout_and_restore() {
        let log = CallLog::default();
        let vcs = FakeVersionControl::on_branch("develop", log.clone()).with_unknown(&["bad"]);

        let original = vcs.current_revision().await.unwrap();
        vcs.checkout("abc").await.unwrap();
        assert_eq!(vcs.head(), Revision::Detached("abc".into()));
        assert!(vcs.checkout("bad").await.is_err());

        vcs.restore(&original).await.unwrap();
        assert_eq!(vcs.head(), Revision::Branch("develop".into()));
        assert_eq!(log.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_fake_builder_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let builder = FakeBuilder::new(CallLog::default()).writing_artifacts(dir.path());
        builder.build(&VersionSpec::new("v1", "abc")).await.unwrap();
        assert!(dir.path().join("Dao.sol/Dao.json").exists());
        assert!(dir.path().join("Dao.sol/Dao.dbg.json").exists());
    }
}
