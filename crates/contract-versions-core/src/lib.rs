//! Contract Versions - reproducible snapshots of historical contract builds
//!
//! For each `{name, commit}` entry of a version manifest, the snapshot run:
//! - Checks out the commit in the shared contracts working directory
//! - Rebuilds the contract artifacts
//! - Copies the active contracts metadata into `<output>/<name>/`
//! - Generates typed bindings into `<output>/<name>/types/`
//!
//! and finally restores the revision that was checked out before the run.
//! Each external tool sits behind a trait (`VersionControl`, `Builder`,
//! `BindingGenerator`) so orchestration can be tested with the `fakes`.

pub mod artifacts;
pub mod bindings;
pub mod builder;
pub mod config;
pub mod error;
pub mod fakes;
pub mod gate;
pub mod manifest;
pub mod orchestrator;
pub mod process;
pub mod report;
pub mod telemetry;
pub mod vcs;

// Re-export key types
pub use artifacts::{copy_metadata, CopiedFile};
pub use bindings::{
    collect_artifact_files, generate_bindings, BindingGenerator, TypechainGenerator,
    DEBUG_ARTIFACT_SUFFIX,
};
pub use builder::{Builder, CommandBuilder};
pub use config::{CheckoutFailurePolicy, RunMode, SnapshotConfig};
pub use error::{Result, SnapshotError};
pub use gate::{GateVerdict, SnapshotGate};
pub use manifest::{VersionManifest, VersionSpec};
pub use orchestrator::{RunState, SnapshotRunner};
pub use process::{run_command, CommandOutput, CommandSpec};
pub use report::{RunReport, Step, StepOutcome, StepRecord, VersionReport};
pub use telemetry::init_tracing;
pub use vcs::{GitCli, Revision, VersionControl};
