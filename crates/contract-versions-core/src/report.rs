//! Per-step outcomes aggregated into a run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::manifest::VersionSpec;
use crate::vcs::Revision;

/// A per-version step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Checkout,
    Build,
    CopyMetadata,
    GenerateBindings,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Checkout => "checkout",
            Step::Build => "build",
            Step::CopyMetadata => "copy_metadata",
            Step::GenerateBindings => "generate_bindings",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    Failed { reason: String },
    Skipped { reason: String },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
    pub duration_ms: u64,
}

/// Outcome of all steps for one version, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionReport {
    pub name: String,
    pub commit: String,
    pub steps: Vec<StepRecord>,
}

impl VersionReport {
    pub fn new(version: &VersionSpec) -> Self {
        Self {
            name: version.name.clone(),
            commit: version.commit.clone(),
            steps: Vec::new(),
        }
    }

    pub fn record(&mut self, step: Step, outcome: StepOutcome, duration_ms: u64) {
        self.steps.push(StepRecord {
            step,
            outcome,
            duration_ms,
        });
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.outcome)
    }

    /// Steps that did not succeed.
    pub fn problems(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|r| !r.outcome.is_success())
    }

    pub fn succeeded(&self) -> bool {
        self.problems().next().is_none()
    }
}

/// Aggregate result of a snapshot run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,

    /// Revision captured before the run and restored after it.
    pub original_revision: Revision,

    pub versions: Vec<VersionReport>,

    /// Set when the original revision could not be restored.
    pub restore_error: Option<String>,

    pub duration_ms: u64,
}

impl RunReport {
    pub fn new(original_revision: Revision) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            original_revision,
            versions: Vec::new(),
            restore_error: None,
            duration_ms: 0,
        }
    }

    pub fn failed_versions(&self) -> Vec<&VersionReport> {
        self.versions.iter().filter(|v| !v.succeeded()).collect()
    }

    /// Number of steps that did not succeed, plus a failed restore.
    pub fn failure_count(&self) -> usize {
        let steps: usize = self.versions.iter().map(|v| v.problems().count()).sum();
        steps + usize::from(self.restore_error.is_some())
    }

    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(reason: &str) -> StepOutcome {
        StepOutcome::Failed {
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_clean_report() {
        let mut version = VersionReport::new(&VersionSpec::new("v1", "abc"));
        version.record(Step::Checkout, StepOutcome::Succeeded, 5);
        version.record(Step::Build, StepOutcome::Succeeded, 900);

        let mut report = RunReport::new(Revision::Branch("main".into()));
        report.versions.push(version);

        assert!(report.is_clean());
        assert!(report.failed_versions().is_empty());
    }

    #[test]
    fn test_failures_counted_per_step() {
        let mut version = VersionReport::new(&VersionSpec::new("v1", "bad"));
        version.record(Step::Checkout, failed("unknown revision"), 5);
        version.record(
            Step::Build,
            StepOutcome::Skipped {
                reason: "checkout failed".into(),
            },
            0,
        );
        version.record(Step::CopyMetadata, StepOutcome::Succeeded, 1);

        let mut report = RunReport::new(Revision::Branch("main".into()));
        report.versions.push(version);

        assert_eq!(report.failure_count(), 2);
        assert_eq!(report.failed_versions()[0].name, "v1");
        assert_eq!(
            report.versions[0].outcome(Step::Checkout),
            Some(&failed("unknown revision"))
        );
    }

    #[test]
    fn test_restore_error_counts() {
        let mut report = RunReport::new(Revision::Branch("main".into()));
        report.restore_error = Some("checkout main failed".into());
        assert_eq!(report.failure_count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(failed("boom")).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "boom");
        assert_eq!(serde_json::to_value(Step::CopyMetadata).unwrap(), "copy_metadata");
    }
}
