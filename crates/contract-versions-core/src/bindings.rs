//! Typed binding generation from compiled contract artifacts.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SnapshotError};
use crate::process::{run_command, stderr_tail, CommandSpec};

/// Suffix of auxiliary debug artifacts that are never passed to the generator.
pub const DEBUG_ARTIFACT_SUFFIX: &str = ".dbg.json";

/// Turns a batch of artifact descriptors into typed bindings.
#[async_trait]
pub trait BindingGenerator: Send + Sync {
    /// Generate bindings for all `files` into `dest` in one invocation.
    async fn generate(&self, files: &[PathBuf], dest: &Path) -> Result<()>;
}

/// `BindingGenerator` backed by the `typechain` CLI.
#[derive(Debug, Clone)]
pub struct TypechainGenerator {
    program: String,
    target: String,
    timeout_secs: u64,
}

impl TypechainGenerator {
    pub fn new(program: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            target: target.into(),
            timeout_secs: 0,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// `<program> --target <target> --out-dir <dest> <files...>`
    pub fn command(&self, files: &[PathBuf], dest: &Path) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg("--target")
            .arg(&self.target)
            .arg("--out-dir")
            .arg(dest.to_string_lossy())
            .args(files.iter().map(|f| f.to_string_lossy().into_owned()))
            .timeout_secs(self.timeout_secs)
    }
}

impl Default for TypechainGenerator {
    fn default() -> Self {
        Self::new("typechain", "ethers-v5")
    }
}

#[async_trait]
impl BindingGenerator for TypechainGenerator {
    async fn generate(&self, files: &[PathBuf], dest: &Path) -> Result<()> {
        let spec = self.command(files, dest);
        debug!(files = files.len(), dest = %dest.display(), "Invoking {}", self.program);

        let output = run_command(&spec).await?;
        if !output.success {
            return Err(SnapshotError::Generation(format!(
                "{} exited with code {}: {}",
                self.program,
                output.exit_code,
                stderr_tail(&output.stderr)
            )));
        }
        Ok(())
    }
}

/// Whether `path` is an artifact descriptor eligible for binding generation.
pub fn is_binding_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".json") && !name.ends_with(DEBUG_ARTIFACT_SUFFIX)
}

/// Recursively collect artifact descriptors under `dir`, sorted.
pub fn collect_artifact_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SnapshotError::Generation(format!(
            "artifact directory not found: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    walk(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            walk(&path, files)?;
        } else if file_type.is_file() && is_binding_source(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Enumerate artifacts under `src` and generate bindings into `dest`.
///
/// Returns the number of artifact files passed to the generator.
pub async fn generate_bindings(
    generator: &dyn BindingGenerator,
    src: &Path,
    dest: &Path,
) -> Result<usize> {
    let files = collect_artifact_files(src)?;
    if files.is_empty() {
        return Err(SnapshotError::Generation(format!(
            "no artifact files under {}",
            src.display()
        )));
    }

    generator.generate(&files, dest).await?;
    Ok(files.len())
}
