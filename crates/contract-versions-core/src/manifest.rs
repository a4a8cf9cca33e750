//! Version manifest: the ordered list of `{name, commit}` pairs to snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, SnapshotError};

/// A named pointer to a historical source revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionSpec {
    /// Version name, used as the output directory name.
    pub name: String,

    /// Commit (or any revision git understands) to build from.
    pub commit: String,
}

impl VersionSpec {
    pub fn new(name: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit: commit.into(),
        }
    }
}

/// Ordered version list, as stored in `commit_hashes.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionManifest {
    pub versions: Vec<VersionSpec>,
}

impl VersionManifest {
    /// Load a manifest from disk. Order is preserved and entries are not validated.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Keep only the named versions, in manifest order.
    pub fn select(&self, names: &[String]) -> Result<Vec<VersionSpec>> {
        for name in names {
            if !self.versions.iter().any(|v| &v.name == name) {
                return Err(SnapshotError::UnknownVersion(name.clone()));
            }
        }
        Ok(self
            .versions
            .iter()
            .filter(|v| names.contains(&v.name))
            .cloned()
            .collect())
    }

    /// Advisory checks. The orchestrator never calls this; malformed entries
    /// surface as checkout failures during a run.
    pub fn lint(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for (idx, version) in self.versions.iter().enumerate() {
            if version.name.trim().is_empty() {
                warnings.push(format!("entry {idx}: empty version name"));
            }
            if version.commit.trim().is_empty() {
                warnings.push(format!("entry {idx} ({}): empty commit", version.name));
            }
            if version.name.contains('/') || version.name.contains('\\') {
                warnings.push(format!(
                    "entry {idx} ({}): name contains a path separator",
                    version.name
                ));
            }
            if !seen.insert(version.name.as_str()) {
                warnings.push(format!(
                    "entry {idx} ({}): duplicate name, output will be overwritten",
                    version.name
                ));
            }
        }

        warnings
    }
}
