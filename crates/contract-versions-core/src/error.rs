//! Error taxonomy for version snapshots.

use std::path::PathBuf;

/// Errors produced while snapshotting contract versions.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read manifest {}: {source}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    #[error("unknown version in selection: {0}")]
    UnknownVersion(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout_secs} seconds")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("{program} exited with code {exit_code}: {stderr}")]
    CommandFailed {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("git error: {0}")]
    Git(String),

    #[error("checkout of {revision} failed: {reason}")]
    Checkout { revision: String, reason: String },

    #[error("build failed: {0}")]
    Build(String),

    #[error("copy of {} failed: {reason}", source_path.display())]
    Copy { source_path: PathBuf, reason: String },

    #[error("binding generation failed: {0}")]
    Generation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;
