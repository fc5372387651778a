use anyhow::{Context, Result};
use declarative::{CommandOutput, CommandRunner};
use std::ffi::OsStr;
use std::io::Write;
use std::process::{Command, Stdio};

/// Runs commands on the real host via `std::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        log::trace!("exec: {} {}", cmd, args.join(" "));
        let output = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;
        Ok(output.into())
    }

    fn run_with_input(&self, cmd: &str, args: &[&str], input: &str) -> Result<CommandOutput> {
        log::trace!("exec (stdin): {} {}", cmd, args.join(" "));
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .with_context(|| format!("Failed to write stdin of {cmd}"))?;
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for {cmd}"))?;
        Ok(output.into())
    }

    fn which(&self, program: &str) -> Option<String> {
        let paths = std::env::var_os("PATH")?;
        which_in(program, &paths)
    }
}

/// Resolve an executable `program` in the directories of `paths`
fn which_in(program: &str, paths: &OsStr) -> Option<String> {
    let cwd = std::env::current_dir().ok()?;
    which::which_in(program, Some(paths), cwd)
        .ok()
        .map(|found| found.display().to_string())
}

/// Run a command and return its trimmed stdout, failing on non-zero exit
pub fn run_capture(cmd: &str, args: &[&str]) -> Result<String> {
    SystemRunner.run_capture(cmd, args)
}
