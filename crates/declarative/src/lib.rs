//! # Declarative
//!
//! A convergence engine for declarative, idempotent host configuration.
//!
//! The crate provides the pieces that decide *how* desired state is applied,
//! leaving *what* is applied to the tasks a caller registers.
//!
//! ## Core Concepts
//!
//! - **Config**: an immutable nested mapping, built by deep-merging a profile
//!   overlay over a base document
//! - **Task**: one slice of desired state with a read-only `check` and an
//!   idempotent `apply`
//! - **Plan**: tasks in fixed registration order plus a requested tag filter
//! - **Executor**: converge, inspect and verify passes over a plan
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     ApplyOutcome, CheckOutcome, Config, NoProgress, Plan, TagSet, Task, converge,
//! };
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Motd { tags: TagSet, config: Arc<Config> }
//!
//! impl Task for Motd {
//!     fn name(&self) -> &str { "motd" }
//!     fn tags(&self) -> &TagSet { &self.tags }
//!
//!     fn check(&self) -> anyhow::Result<CheckOutcome> {
//!         let want = self.config.str("motd").unwrap_or_default();
//!         let have = std::fs::read_to_string("/etc/motd").unwrap_or_default();
//!         Ok(if have == want {
//!             CheckOutcome::satisfied("motd up to date")
//!         } else {
//!             CheckOutcome::diverged("motd differs")
//!         })
//!     }
//!
//!     fn apply(&self) -> anyhow::Result<ApplyOutcome> {
//!         std::fs::write("/etc/motd", self.config.str("motd").unwrap_or_default())?;
//!         Ok(ApplyOutcome::ok("motd written"))
//!     }
//! }
//!
//! let config = Arc::new(declarative::config::load("site.yml".as_ref(), "base")?);
//! let plan = Plan::builder(TagSet::parse("system"))
//!     .task(Motd { tags: TagSet::from(["system"]), config })
//!     .build();
//!
//! let report = converge(&plan, false, &mut NoProgress);
//! std::process::exit(report.exit_code());
//! ```
//!
//! ## Provider Traits
//!
//! - [`CommandRunner`]: runs external commands for tasks, so tests can script them
//! - [`ProgressCallback`]: receives per-task check/apply events in plan order

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod planner;
pub mod tags;
pub mod task;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use config::{Config, merge};
pub use context::{CommandRunner, NoProgress, ProgressCallback};
pub use error::{Error, Result};
pub use executor::{
    ConvergeReport, EXIT_APPLY_FAILED, EXIT_CONFIG, EXIT_OK, EXIT_UNSATISFIED, InspectReport, VerifyFailure,
    VerifyReport, converge, execute, inspect, verify,
};
pub use planner::{Plan, PlanBuilder};
pub use tags::TagSet;
pub use task::{ApplyOutcome, BoxedTask, CheckOutcome, Task, TaskExt, TaskResult};
pub use types::CommandOutput;
