//! Task trait for idempotent desired-state convergence
//!
//! A Task owns one slice of desired state. It can inspect the live system
//! (`check`) and converge it (`apply`). The engine-provided [`TaskExt::run`]
//! ties the two together and cannot be overridden by implementors.

use crate::tags::TagSet;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a read-only inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Live state matches desired state
    pub satisfied: bool,
    /// An apply would have observable effect (informational)
    pub would_change: bool,
    /// The check could not inspect because a collaborator is missing.
    /// Skipped outcomes are always satisfied.
    pub skipped: bool,
    pub message: String,
}

impl CheckOutcome {
    /// Live state already matches
    pub fn satisfied(message: impl Into<String>) -> Self {
        Self {
            satisfied: true,
            would_change: false,
            skipped: false,
            message: message.into(),
        }
    }

    /// Live state diverges and an apply would change it
    pub fn diverged(message: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            would_change: true,
            skipped: false,
            message: message.into(),
        }
    }

    /// Nothing could be inspected (e.g. the managing tool is not installed)
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            satisfied: true,
            would_change: false,
            skipped: true,
            message: message.into(),
        }
    }

    /// Short state word used in reports
    pub fn state_label(&self) -> &'static str {
        match (self.satisfied, self.skipped) {
            (true, true) => "skipped",
            (true, false) => "present",
            (false, _) => "absent",
        }
    }
}

/// Outcome of a convergence attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub succeeded: bool,
    pub message: String,
}

impl ApplyOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
        }
    }

    /// Build from per-item results: succeeds only if every item did.
    /// Messages are joined with `"; "`, or `empty` when there are none.
    pub fn from_items(succeeded: bool, messages: &[String], empty: &str) -> Self {
        let message = if messages.is_empty() {
            empty.to_string()
        } else {
            messages.join("; ")
        };
        Self { succeeded, message }
    }
}

/// Result of running a single task once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub name: String,
    pub changed: bool,
    pub message: String,
}

/// Core trait for convergence tasks
///
/// Implementors must uphold two rules the engine cannot enforce:
/// - `check` never mutates anything
/// - `apply` is safe to call when the task is already satisfied
///
/// Ordinary divergence is reported through [`CheckOutcome`], never as `Err`.
/// An `Err` from either method is degraded to a reported failure by the
/// engine and never aborts the plan.
pub trait Task: Send + Sync + fmt::Debug {
    /// Stable identifier, unique within one plan
    fn name(&self) -> &str;

    /// Selection labels assigned at construction
    fn tags(&self) -> &TagSet;

    /// Compare live state against desired state
    fn check(&self) -> Result<CheckOutcome>;

    /// Converge live state toward desired state
    fn apply(&self) -> Result<ApplyOutcome>;
}

/// A boxed task for type-erased storage
pub type BoxedTask = Box<dyn Task>;

/// What happened to one task during one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub check: CheckOutcome,
    /// `None` when the check was satisfied or applying was not allowed
    pub apply: Option<ApplyOutcome>,
}

impl Step {
    /// Whether an apply ran and succeeded
    pub fn changed(&self) -> bool {
        self.apply.as_ref().is_some_and(|a| a.succeeded)
    }

    /// Whether an apply ran and failed
    pub fn failed(&self) -> bool {
        self.apply.as_ref().is_some_and(|a| !a.succeeded)
    }
}

/// Run `check`, converting an error into an unsatisfied outcome
pub fn check_task<T: Task + ?Sized>(task: &T) -> CheckOutcome {
    match task.check() {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("{}: check failed: {:#}", task.name(), e);
            CheckOutcome {
                satisfied: false,
                would_change: false,
                skipped: false,
                message: format!("check failed: {e:#}"),
            }
        }
    }
}

/// Run `apply`, converting an error into a failed outcome
pub fn apply_task<T: Task + ?Sized>(task: &T) -> ApplyOutcome {
    match task.apply() {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("{}: apply failed: {:#}", task.name(), e);
            ApplyOutcome::failed(format!("{e:#}"))
        }
    }
}

/// Drive one task through the check/apply state machine.
///
/// UNCHECKED -> CHECKED_SATISFIED, or UNCHECKED -> CHECKED_UNSATISFIED ->
/// APPLIED when `allow_apply` is set.
pub fn step<T: Task + ?Sized>(task: &T, allow_apply: bool) -> Step {
    let check = check_task(task);
    log::debug!(
        "{}: {} ({})",
        task.name(),
        check.state_label(),
        check.message
    );

    let apply = (!check.satisfied && allow_apply).then(|| apply_task(task));
    Step { check, apply }
}

/// Engine-provided operations on every task
pub trait TaskExt {
    /// Check, and apply only if unsatisfied
    fn run(&self) -> TaskResult;
}

impl<T: Task + ?Sized> TaskExt for T {
    fn run(&self) -> TaskResult {
        let Step { check, apply } = step(self, true);
        match apply {
            Some(outcome) => TaskResult {
                name: self.name().to_string(),
                changed: outcome.succeeded,
                message: outcome.message,
            },
            None => TaskResult {
                name: self.name().to_string(),
                changed: false,
                message: check.message,
            },
        }
    }
}
