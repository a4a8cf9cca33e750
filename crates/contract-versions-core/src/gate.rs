//! Strict-mode gate over a run report.

use serde::{Deserialize, Serialize};

use crate::report::{RunReport, StepOutcome};

/// Gate evaluation verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// Violations that caused failure (empty if passed).
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

/// Snapshot gate rules.
pub struct SnapshotGate;

impl SnapshotGate {
    /// Evaluate a finished run.
    ///
    /// Gate rule:
    /// - Every failed or skipped step of every version is a violation
    /// - Failing to restore the original revision is a violation
    pub fn evaluate(report: &RunReport) -> GateVerdict {
        let mut violations = Vec::new();

        for version in &report.versions {
            for record in version.problems() {
                let detail = match &record.outcome {
                    StepOutcome::Failed { reason } => format!("failed: {reason}"),
                    StepOutcome::Skipped { reason } => format!("skipped: {reason}"),
                    StepOutcome::Succeeded => continue,
                };
                violations.push(format!(
                    "Version '{}' step '{}' {}",
                    version.name, record.step, detail
                ));
            }
        }

        if let Some(err) = &report.restore_error {
            violations.push(format!(
                "Original revision '{}' was not restored: {}",
                report.original_revision, err
            ));
        }

        let passed = violations.is_empty();
        let message = if passed {
            format!("All {} version(s) snapshotted", report.versions.len())
        } else {
            format!("Gate failed with {} violation(s)", violations.len())
        };

        GateVerdict {
            passed,
            violations,
            message,
        }
    }
}
