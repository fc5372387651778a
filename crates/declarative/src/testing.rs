//! Scripted tasks for engine tests

use crate::tags::TagSet;
use crate::task::{ApplyOutcome, CheckOutcome, Task};
use anyhow::{Result, bail};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What a [`StubTask`] does when applied
#[derive(Debug, Clone)]
pub enum OnApply {
    /// Succeed and become satisfied
    Converge,
    /// Report failure with this message and stay unsatisfied
    Fail(&'static str),
    /// Return an `Err`
    Error(&'static str),
    /// Panic; used to prove a pass never applies
    Forbidden,
}

#[derive(Debug)]
pub struct StubTask {
    name: String,
    tags: TagSet,
    satisfied: Mutex<bool>,
    on_apply: OnApply,
    check_error: Option<&'static str>,
    pub applies: AtomicUsize,
}

impl StubTask {
    pub fn new(name: &str, tags: &[&str], satisfied: bool, on_apply: OnApply) -> Self {
        Self {
            name: name.to_string(),
            tags: tags.iter().copied().collect(),
            satisfied: Mutex::new(satisfied),
            on_apply,
            check_error: None,
            applies: AtomicUsize::new(0),
        }
    }

    pub fn satisfied(name: &str, tags: &[&str]) -> Self {
        Self::new(name, tags, true, OnApply::Forbidden)
    }

    pub fn diverged(name: &str, tags: &[&str]) -> Self {
        Self::new(name, tags, false, OnApply::Converge)
    }

    pub fn with_check_error(mut self, message: &'static str) -> Self {
        self.check_error = Some(message);
        self
    }

    pub fn apply_count(&self) -> usize {
        self.applies.load(Ordering::SeqCst)
    }
}

impl Task for StubTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn check(&self) -> Result<CheckOutcome> {
        if let Some(message) = self.check_error {
            bail!(message);
        }
        if *self.satisfied.lock().unwrap() {
            Ok(CheckOutcome::satisfied(format!("{} in place", self.name)))
        } else {
            Ok(CheckOutcome::diverged(format!("{} missing", self.name)))
        }
    }

    fn apply(&self) -> Result<ApplyOutcome> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        match &self.on_apply {
            OnApply::Converge => {
                *self.satisfied.lock().unwrap() = true;
                Ok(ApplyOutcome::ok(format!("{} installed", self.name)))
            }
            OnApply::Fail(message) => Ok(ApplyOutcome::failed(*message)),
            OnApply::Error(message) => bail!(*message),
            OnApply::Forbidden => panic!("apply must not be called on {}", self.name),
        }
    }
}
