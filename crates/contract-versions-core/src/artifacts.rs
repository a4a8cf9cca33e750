//! Metadata file copy into a version directory.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::{Result, SnapshotError};

/// A file written into a version directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopiedFile {
    pub bytes: u64,

    /// SHA-256 of the written content (hex).
    pub sha256: String,
}

/// Copy `source` to `destination`, creating parent directories.
///
/// An existing destination is replaced wholesale.
pub async fn copy_metadata(source: &Path, destination: &Path) -> Result<CopiedFile> {
    let copy_err = |reason: String| SnapshotError::Copy {
        source_path: source.to_path_buf(),
        reason,
    };

    let content = tokio::fs::read(source)
        .await
        .map_err(|e| copy_err(format!("cannot read source: {e}")))?;

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| copy_err(format!("cannot create {}: {e}", parent.display())))?;
    }

    tokio::fs::write(destination, &content)
        .await
        .map_err(|e| copy_err(format!("cannot write {}: {e}", destination.display())))?;

    Ok(CopiedFile {
        bytes: content.len() as u64,
        sha256: hex::encode(Sha256::digest(&content)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("active_contracts.json");
        std::fs::write(&src, br#"{"mainnet":{}}"#).unwrap();

        let dest = dir.path().join("build/v1.0.0/active_contracts.json");
        let copied = copy_metadata(&src, &dest).await.unwrap();

        assert_eq!(copied.bytes, 14);
        assert_eq!(copied.sha256.len(), 64);
        assert_eq!(std::fs::read(&dest).unwrap(), br#"{"mainnet":{}}"#);
    }

    #[tokio::test]
    async fn test_copy_replaces_longer_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.json");
        let dest = dir.path().join("dest.json");
        std::fs::write(&src, b"short").unwrap();
        std::fs::write(&dest, b"a much longer previous payload").unwrap();

        let copied = copy_metadata(&src, &dest).await.unwrap();

        assert_eq!(copied.bytes, 5);
        assert_eq!(std::fs::read(&dest).unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_missing_source_is_copy_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_metadata(&dir.path().join("missing.json"), &dir.path().join("out.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Copy { .. }));
        assert!(!dir.path().join("out.json").exists());
    }
}
