//! Execution passes - converge, inspect, verify
//!
//! All passes walk [`Plan::selected`] in order, one task at a time, and use the
//! same check step. They differ only in whether a mutation step follows, so
//! inspection and mutation always observe the same predicate.

use crate::context::ProgressCallback;
use crate::planner::Plan;
use crate::task::{
    ApplyOutcome, CheckOutcome, Step, TaskExt, TaskResult, apply_task, check_task,
};
use serde::Serialize;

/// Every selected task is satisfied / no apply failed
pub const EXIT_OK: i32 = 0;
/// At least one apply failed
pub const EXIT_APPLY_FAILED: i32 = 1;
/// Verification found unsatisfied tasks
pub const EXIT_UNSATISFIED: i32 = 2;
/// The configuration could not be loaded; no task ran
pub const EXIT_CONFIG: i32 = 2;

/// Report line for a check during a converge pass
pub fn check_line(name: &str, check: &CheckOutcome) -> String {
    format!("[CHECK] {}: {} | {}", name, check.state_label(), check.message)
}

/// Report line for an apply during a converge pass
pub fn apply_line(name: &str, apply: &ApplyOutcome) -> String {
    let status = if apply.succeeded { "CHANGED" } else { "FAILED" };
    format!("[APPLY] {}: {} | {}", name, status, apply.message)
}

/// Report line for an inspect pass
pub fn diff_line(name: &str, check: &CheckOutcome) -> String {
    let verdict = if check.satisfied {
        "no change"
    } else {
        "would change"
    };
    format!("{}: {} - {}", name, verdict, check.message)
}

/// Report line for a verification failure
pub fn fail_line(name: &str, message: &str) -> String {
    format!("[FAIL] {}: {}", name, message)
}

/// One task's passage through a converge pass
#[derive(Debug, Clone)]
pub struct ConvergeEntry {
    pub name: String,
    pub step: Step,
}

/// Result of a converge pass
#[derive(Debug, Clone, Default)]
pub struct ConvergeReport {
    pub dry_run: bool,
    pub entries: Vec<ConvergeEntry>,
}

impl ConvergeReport {
    /// Per-task results for tasks that went through an apply
    pub fn results(&self) -> Vec<TaskResult> {
        self.entries
            .iter()
            .filter_map(|entry| {
                entry.step.apply.as_ref().map(|apply| TaskResult {
                    name: entry.name.clone(),
                    changed: apply.succeeded,
                    message: apply.message.clone(),
                })
            })
            .collect()
    }

    /// Tasks whose apply failed
    pub fn failures(&self) -> impl Iterator<Item = &ConvergeEntry> {
        self.entries.iter().filter(|entry| entry.step.failed())
    }

    pub fn changed(&self) -> usize {
        self.entries.iter().filter(|e| e.step.changed()).count()
    }

    pub fn satisfied(&self) -> usize {
        self.entries.iter().filter(|e| e.step.check.satisfied).count()
    }

    /// Whether no applied task reported failure
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_OK
        } else {
            EXIT_APPLY_FAILED
        }
    }

    /// Full report, one `[CHECK]` line per task plus one `[APPLY]` line per apply
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for entry in &self.entries {
            lines.push(check_line(&entry.name, &entry.step.check));
            if let Some(apply) = &entry.step.apply {
                lines.push(apply_line(&entry.name, apply));
            }
        }
        lines
    }
}

/// Check every selected task and apply the unsatisfied ones.
///
/// With `dry_run` set this degrades to an inspection: no apply is called.
/// A failed apply is recorded and the pass moves on to the next task.
pub fn converge<P: ProgressCallback + ?Sized>(
    plan: &Plan,
    dry_run: bool,
    progress: &mut P,
) -> ConvergeReport {
    let mut report = ConvergeReport {
        dry_run,
        entries: Vec::new(),
    };

    for task in plan.selected() {
        let check = check_task(task);
        progress.on_check(task.name(), &check);

        let apply = if check.satisfied || dry_run {
            None
        } else {
            progress.on_apply_start(task.name());
            let outcome = apply_task(task);
            progress.on_apply(task.name(), &outcome);
            Some(outcome)
        };

        log::debug!(
            "{}: converge {}",
            task.name(),
            match &apply {
                None => "skipped apply",
                Some(a) if a.succeeded => "changed",
                Some(_) => "failed",
            }
        );

        report.entries.push(ConvergeEntry {
            name: task.name().to_string(),
            step: Step { check, apply },
        });
    }

    report
}

/// Result of an inspect pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct InspectReport {
    pub entries: Vec<(String, CheckOutcome)>,
}

impl InspectReport {
    /// Number of tasks an apply would change
    pub fn would_change(&self) -> usize {
        self.entries.iter().filter(|(_, c)| !c.satisfied).count()
    }

    /// Inspection never fails
    pub fn exit_code(&self) -> i32 {
        EXIT_OK
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(name, check)| diff_line(name, check))
            .collect()
    }
}

/// Check every selected task without applying anything
pub fn inspect<P: ProgressCallback + ?Sized>(plan: &Plan, progress: &mut P) -> InspectReport {
    let entries = plan
        .selected()
        .map(|task| {
            let check = check_task(task);
            progress.on_check(task.name(), &check);
            (task.name().to_string(), check)
        })
        .collect();

    InspectReport { entries }
}

/// A task found unsatisfied during verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyFailure {
    pub name: String,
    pub message: String,
}

/// Result of a verify pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub checked: usize,
    pub failures: Vec<VerifyFailure>,
}

impl VerifyReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_OK
        } else {
            EXIT_UNSATISFIED
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| fail_line(&f.name, &f.message))
            .collect()
    }
}

/// Check every selected task and collect the unsatisfied ones
pub fn verify(plan: &Plan) -> VerifyReport {
    let mut report = VerifyReport::default();

    for task in plan.selected() {
        report.checked += 1;
        let check = check_task(task);
        if !check.satisfied {
            report.failures.push(VerifyFailure {
                name: task.name().to_string(),
                message: check.message,
            });
        }
    }

    report
}

/// Run every selected task through [`TaskExt::run`]
pub fn execute(plan: &Plan) -> Vec<TaskResult> {
    plan.selected().map(|task| task.run()).collect()
}
