//! Runner and progress traits
//!
//! These traits let tasks and executors be used without depending on a
//! specific process-spawning implementation or terminal UI.

use crate::task::{ApplyOutcome, CheckOutcome};
use crate::types::CommandOutput;
use anyhow::Result;

/// Runs external commands on behalf of tasks
///
/// Tasks never spawn processes themselves. The CLI injects a runner backed by
/// `std::process`, tests inject a scripted one.
///
/// `Err` means the program could not be started at all (usually: not
/// installed). A program that ran and exited non-zero is `Ok` with
/// `success == false`.
pub trait CommandRunner: Send + Sync {
    /// Run a command and capture its output
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run a command with `input` written to its stdin
    fn run_with_input(&self, cmd: &str, args: &[&str], input: &str) -> Result<CommandOutput>;

    /// Run a command and capture trimmed stdout, failing on non-zero exit
    fn run_capture(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let output = self.run(cmd, args)?;
        if !output.success {
            anyhow::bail!("{} failed: {}", cmd, output.error_message("non-zero exit"));
        }
        Ok(output.stdout_str().trim().to_string())
    }

    /// Resolve a program on `PATH`
    fn which(&self, program: &str) -> Option<String> {
        let output = self.run("which", &[program]).ok()?;
        let path = output.stdout_str().trim().to_string();
        (output.success && !path.is_empty()).then_some(path)
    }
}

/// Progress callback for executor passes
///
/// Called in plan order, strictly sequentially.
pub trait ProgressCallback {
    /// A task was checked
    fn on_check(&mut self, name: &str, outcome: &CheckOutcome);

    /// An apply is about to start (may block for a long time)
    fn on_apply_start(&mut self, _name: &str) {}

    /// An apply finished
    fn on_apply(&mut self, name: &str, outcome: &ApplyOutcome);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_check(&mut self, _name: &str, _outcome: &CheckOutcome) {}
    fn on_apply(&mut self, _name: &str, _outcome: &ApplyOutcome) {}
}
