//! Snapshot run orchestration.
//!
//! Versions are processed strictly one at a time: they share a single
//! working directory and a fixed artifact output path, so two builds in
//! flight would corrupt each other.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::artifacts::copy_metadata;
use crate::bindings::{generate_bindings, BindingGenerator, TypechainGenerator};
use crate::builder::{Builder, CommandBuilder};
use crate::config::{CheckoutFailurePolicy, SnapshotConfig};
use crate::error::Result;
use crate::manifest::VersionSpec;
use crate::report::{RunReport, Step, StepOutcome, VersionReport};
use crate::vcs::{GitCli, VersionControl};

/// Orchestrator states, in the order a run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    CapturingBranch,
    Checkout { index: usize },
    Build { index: usize },
    CopyMetadata { index: usize },
    GenerateBindings { index: usize },
    RestoringBranch,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::CapturingBranch => f.write_str("capturing_branch"),
            RunState::Checkout { index } => write!(f, "checkout[{index}]"),
            RunState::Build { index } => write!(f, "build[{index}]"),
            RunState::CopyMetadata { index } => write!(f, "copy_metadata[{index}]"),
            RunState::GenerateBindings { index } => write!(f, "generate_bindings[{index}]"),
            RunState::RestoringBranch => f.write_str("restoring_branch"),
            RunState::Done => f.write_str("done"),
        }
    }
}

/// Tracks and logs state transitions of a single run.
struct Transitions {
    current: RunState,
}

impl Transitions {
    fn new() -> Self {
        Self {
            current: RunState::Idle,
        }
    }

    fn enter(&mut self, next: RunState) {
        debug!(from = %self.current, to = %next, "Run state transition");
        self.current = next;
    }
}

/// Runs checkout, build, metadata copy and binding generation for each version.
pub struct SnapshotRunner {
    vcs: Arc<dyn VersionControl>,
    builder: Arc<dyn Builder>,
    generator: Arc<dyn BindingGenerator>,
    config: SnapshotConfig,
}

impl SnapshotRunner {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        builder: Arc<dyn Builder>,
        generator: Arc<dyn BindingGenerator>,
        config: SnapshotConfig,
    ) -> Self {
        Self {
            vcs,
            builder,
            generator,
            config,
        }
    }

    /// Runner backed by `git`, the configured build command and typechain.
    pub fn from_config(config: SnapshotConfig) -> Self {
        let timeout = config.timeout_secs;
        let vcs = GitCli::new(&config.contracts_dir).with_timeout(timeout);
        let builder = CommandBuilder::new(config.build_command.clone(), &config.contracts_dir)
            .with_timeout(timeout);
        let generator =
            TypechainGenerator::new(&config.generator_program, &config.generator_target)
                .with_timeout(timeout);
        Self::new(Arc::new(vcs), Arc::new(builder), Arc::new(generator), config)
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Snapshot every version in order and restore the original revision.
    ///
    /// Per-step failures are logged and recorded in the report, never
    /// returned. Only failing to capture the starting revision is an error.
    pub async fn run(&self, versions: &[VersionSpec]) -> Result<RunReport> {
        let start = Instant::now();
        let mut state = Transitions::new();

        state.enter(RunState::CapturingBranch);
        let original = self.vcs.current_revision().await?;
        info!(revision = %original, versions = versions.len(), "Starting snapshot run");

        let mut report = RunReport::new(original.clone());

        for (index, version) in versions.iter().enumerate() {
            info!(
                version = %version.name,
                commit = %version.commit,
                "Building contracts for version"
            );
            let version_report = self.snapshot_version(index, version, &mut state).await;
            report.versions.push(version_report);
        }

        state.enter(RunState::RestoringBranch);
        if let Err(e) = self.vcs.restore(&original).await {
            error!(revision = %original, error = %e, "Error restoring original revision");
            report.restore_error = Some(e.to_string());
        } else {
            info!(revision = %original, "Restored original revision");
        }

        state.enter(RunState::Done);
        report.duration_ms = start.elapsed().as_millis() as u64;

        if report.is_clean() {
            info!(run_id = %report.run_id, duration_ms = report.duration_ms, "Snapshot run completed");
        } else {
            warn!(
                run_id = %report.run_id,
                failures = report.failure_count(),
                "Snapshot run completed with failures"
            );
        }

        Ok(report)
    }

    async fn snapshot_version(
        &self,
        index: usize,
        version: &VersionSpec,
        state: &mut Transitions,
    ) -> VersionReport {
        let mut report = VersionReport::new(version);

        state.enter(RunState::Checkout { index });
        let (result, ms) = timed(self.vcs.checkout(&version.commit)).await;
        let checked_out = settle(&mut report, version, Step::Checkout, result, ms).is_some();

        state.enter(RunState::Build { index });
        if checked_out {
            let (result, ms) = timed(self.builder.build(version)).await;
            settle(&mut report, version, Step::Build, result, ms);
        } else {
            report.record(Step::Build, skipped("checkout failed"), 0);
        }

        if !checked_out && self.config.on_checkout_failure == CheckoutFailurePolicy::SkipVersion {
            warn!(version = %version.name, "Skipping version after failed checkout");
            report.record(Step::CopyMetadata, skipped("checkout failed"), 0);
            report.record(Step::GenerateBindings, skipped("checkout failed"), 0);
            return report;
        }

        state.enter(RunState::CopyMetadata { index });
        let source = self.config.metadata_source();
        let destination = self.config.metadata_destination(&version.name);
        let (result, ms) = timed(copy_metadata(&source, &destination)).await;
        if let Some(copied) = settle(&mut report, version, Step::CopyMetadata, result, ms) {
            info!(
                version = %version.name,
                bytes = copied.bytes,
                sha256 = %copied.sha256,
                "Copied active contracts"
            );
        }

        state.enter(RunState::GenerateBindings { index });
        let src = self.config.artifacts_dir();
        let dest = self.config.bindings_dir(&version.name);
        let (result, ms) = timed(generate_bindings(self.generator.as_ref(), &src, &dest)).await;
        if let Some(files) = settle(&mut report, version, Step::GenerateBindings, result, ms) {
            info!(version = %version.name, files, dest = %dest.display(), "Generated bindings");
        }

        report
    }
}

async fn timed<T>(fut: impl Future<Output = Result<T>>) -> (Result<T>, u64) {
    let start = Instant::now();
    let result = fut.await;
    (result, start.elapsed().as_millis() as u64)
}

/// Record a step result, logging and swallowing any error.
fn settle<T>(
    report: &mut VersionReport,
    version: &VersionSpec,
    step: Step,
    result: Result<T>,
    duration_ms: u64,
) -> Option<T> {
    match result {
        Ok(value) => {
            report.record(step, StepOutcome::Succeeded, duration_ms);
            Some(value)
        }
        Err(e) => {
            error!(version = %version.name, step = %step, error = %e, "Snapshot step failed");
            report.record(
                step,
                StepOutcome::Failed {
                    reason: e.to_string(),
                },
                duration_ms,
            );
            None
        }
    }
}

fn skipped(reason: &str) -> StepOutcome {
    StepOutcome::Skipped {
        reason: reason.to_string(),
    }
}
