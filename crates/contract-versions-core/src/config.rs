//! Snapshot configuration and output layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SnapshotError};

/// Name of the metadata file copied into every version directory.
pub const METADATA_FILE_NAME: &str = "active_contracts.json";

/// Subdirectory of a version directory that receives generated bindings.
pub const BINDINGS_SUBDIR: &str = "types";

/// How a run reports per-step failures.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Log failures and report success regardless.
    #[default]
    Lenient,

    /// Aggregate failures and report a non-zero outcome.
    Strict,
}

/// What to do with the remaining steps of a version whose checkout failed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutFailurePolicy {
    /// Copy metadata and generate bindings against whatever is checked out.
    #[default]
    Continue,

    /// Skip the rest of the version.
    SkipVersion,
}

/// Configuration for a snapshot run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Monorepo root; the metadata file is resolved against it.
    pub repo_root: PathBuf,

    /// Contracts package: git and the build command run here.
    pub contracts_dir: PathBuf,

    /// Version manifest (`{"versions": [...]}`).
    pub manifest: PathBuf,

    /// Root of the per-version output directories.
    pub output_root: PathBuf,

    /// Metadata file, relative to `repo_root`.
    pub metadata_file: PathBuf,

    /// Compiled artifacts, relative to `contracts_dir`.
    pub artifacts_subdir: PathBuf,

    /// Build command (first element is the executable).
    pub build_command: Vec<String>,

    /// Binding generator executable.
    pub generator_program: String,

    /// Value passed as `--target` to the binding generator.
    pub generator_target: String,

    /// Timeout for each external command, 0 disables it.
    pub timeout_secs: u64,

    pub mode: RunMode,

    pub on_checkout_failure: CheckoutFailurePolicy,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            contracts_dir: PathBuf::from("packages/contracts"),
            manifest: PathBuf::from("packages/contracts-versions/commit_hashes.json"),
            output_root: PathBuf::from("packages/contracts-versions/build"),
            metadata_file: PathBuf::from(METADATA_FILE_NAME),
            artifacts_subdir: PathBuf::from("artifacts/src"),
            build_command: vec!["yarn".to_string(), "build".to_string()],
            generator_program: "typechain".to_string(),
            generator_target: "ethers-v5".to_string(),
            timeout_secs: 0,
            mode: RunMode::Lenient,
            on_checkout_failure: CheckoutFailurePolicy::Continue,
        }
    }
}

impl SnapshotConfig {
    /// Load a TOML config file. Missing keys fall back to defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| SnapshotError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.build_command.is_empty() {
            return Err(SnapshotError::Config(
                "build_command must not be empty".to_string(),
            ));
        }
        if self.generator_program.trim().is_empty() {
            return Err(SnapshotError::Config(
                "generator_program must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve relative `contracts_dir`, `manifest` and `output_root`
    /// against `repo_root`. Absolute paths are left untouched.
    pub fn anchored(mut self) -> Self {
        for path in [
            &mut self.contracts_dir,
            &mut self.manifest,
            &mut self.output_root,
        ] {
            if path.is_relative() {
                *path = self.repo_root.join(&*path);
            }
        }
        self
    }

    pub fn is_strict(&self) -> bool {
        self.mode == RunMode::Strict
    }

    pub fn version_dir(&self, name: &str) -> PathBuf {
        self.output_root.join(name)
    }

    pub fn metadata_source(&self) -> PathBuf {
        self.repo_root.join(&self.metadata_file)
    }

    pub fn metadata_destination(&self, name: &str) -> PathBuf {
        self.version_dir(name).join(METADATA_FILE_NAME)
    }

    pub fn bindings_dir(&self, name: &str) -> PathBuf {
        self.version_dir(name).join(BINDINGS_SUBDIR)
    }

    /// Fixed build output location, shared by every version.
    pub fn artifacts_dir(&self) -> PathBuf {
        self.contracts_dir.join(&self.artifacts_subdir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_monorepo_layout() {
        let config = SnapshotConfig::default();
        assert_eq!(config.build_command, vec!["yarn", "build"]);
        assert_eq!(config.generator_target, "ethers-v5");
        assert_eq!(config.mode, RunMode::Lenient);
        assert_eq!(config.timeout_secs, 0);
        assert_eq!(
            config.artifacts_dir(),
            PathBuf::from("packages/contracts/artifacts/src")
        );
    }

    #[test]
    fn test_output_layout() {
        let config = SnapshotConfig {
            output_root: PathBuf::from("/out"),
            ..SnapshotConfig::default()
        };
        assert_eq!(
            config.metadata_destination("v1.0.0"),
            PathBuf::from("/out/v1.0.0/active_contracts.json")
        );
        assert_eq!(config.bindings_dir("v1.0.0"), PathBuf::from("/out/v1.0.0/types"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SnapshotConfig::from_toml_str(
            r#"
            output_root = "dist/versions"
            mode = "strict"
            on_checkout_failure = "skip_version"
            timeout_secs = 600
            "#,
        )
        .unwrap();
        assert_eq!(config.output_root, PathBuf::from("dist/versions"));
        assert!(config.is_strict());
        assert_eq!(config.on_checkout_failure, CheckoutFailurePolicy::SkipVersion);
        assert_eq!(config.timeout_secs, 600);
        assert_eq!(config.generator_program, "typechain");
    }

    #[test]
    fn test_anchored_resolves_against_repo_root() {
        let config = SnapshotConfig {
            repo_root: PathBuf::from("/mono"),
            ..SnapshotConfig::default()
        }
        .anchored();

        assert_eq!(
            config.metadata_source(),
            PathBuf::from("/mono/active_contracts.json")
        );
        assert_eq!(
            config.artifacts_dir(),
            PathBuf::from("/mono/packages/contracts/artifacts/src")
        );
        assert_eq!(
            config.manifest,
            PathBuf::from("/mono/packages/contracts-versions/commit_hashes.json")
        );
        assert_eq!(
            config.metadata_destination("v1"),
            PathBuf::from("/mono/packages/contracts-versions/build/v1/active_contracts.json")
        );
    }

    #[test]
    fn test_anchored_keeps_absolute_paths() {
        let config = SnapshotConfig {
            repo_root: PathBuf::from("/mono"),
            output_root: PathBuf::from("/srv/versions"),
            ..SnapshotConfig::default()
        }
        .anchored();

        assert_eq!(config.output_root, PathBuf::from("/srv/versions"));
        assert_eq!(config.contracts_dir, PathBuf::from("/mono/packages/contracts"));
    }

    #[test]
    fn test_empty_build_command_rejected() {
        let err = SnapshotConfig::from_toml_str("build_command = []").unwrap_err();
        assert!(err.to_string().contains("build_command"));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(SnapshotConfig::from_toml_str("mode = \"sometimes\"").is_err());
    }
}
