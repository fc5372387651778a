//! Concrete tasks for a Raspberry Pi OS host
//!
//! Every task is built from the shared effective config, its tag set and a
//! [`Host`]. Tasks reach the live system only through the host's command
//! runner and the filesystem paths they are given.

use anyhow::Result;
use declarative::{CommandOutput, CommandRunner};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::paths;
use crate::runner::SystemRunner;

pub mod apt_present;
pub mod desktop_lxqt;
pub mod file_present;
pub mod piapps_present;
pub mod raspi_config;
pub mod systemd_manage;
pub mod vscode_extensions;
pub mod wallpaper_asset;

pub use apt_present::AptPresent;
pub use desktop_lxqt::DesktopLxqt;
pub use file_present::FilePresent;
pub use piapps_present::PiAppsPresent;
pub use raspi_config::RaspiConfig;
pub use systemd_manage::SystemdManage;
pub use vscode_extensions::VsCodeExtensions;
pub use wallpaper_asset::WallpaperAsset;

/// Access to the managed machine: command runner, privilege, home directory
#[derive(Clone)]
pub struct Host {
    runner: Arc<dyn CommandRunner>,
    elevate: bool,
    home: PathBuf,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("elevate", &self.elevate)
            .field("home", &self.home)
            .finish_non_exhaustive()
    }
}

impl Host {
    /// The real machine. Privileged commands go through `sudo` unless
    /// already running as root.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner), !is_root(), paths::home_dir())
    }

    pub fn new(runner: Arc<dyn CommandRunner>, elevate: bool, home: PathBuf) -> Self {
        Self {
            runner,
            elevate,
            home,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Expand `~` and `$VAR` in a config path
    pub fn expand(&self, path: &str) -> PathBuf {
        paths::expand_with_home(path, &self.home)
    }

    pub fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        self.runner.run(cmd, args)
    }

    pub fn run_capture(&self, cmd: &str, args: &[&str]) -> Result<String> {
        self.runner.run_capture(cmd, args)
    }

    pub fn which(&self, program: &str) -> Option<String> {
        self.runner.which(program)
    }

    /// Run a command with elevated privileges
    pub fn sudo(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        if self.elevate {
            self.runner.run("sudo", &prepend(cmd, args))
        } else {
            self.runner.run(cmd, args)
        }
    }

    /// Run a privileged command with `input` on stdin
    pub fn sudo_with_input(&self, cmd: &str, args: &[&str], input: &str) -> Result<CommandOutput> {
        if self.elevate {
            self.runner.run_with_input("sudo", &prepend(cmd, args), input)
        } else {
            self.runner.run_with_input(cmd, args, input)
        }
    }
}

fn prepend<'a>(cmd: &'a str, args: &[&'a str]) -> Vec<&'a str> {
    let mut full = Vec::with_capacity(args.len() + 1);
    full.push(cmd);
    full.extend_from_slice(args);
    full
}

fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// blake3 digest of a file's content, `None` when unreadable
pub(crate) fn digest(path: &Path) -> Option<blake3::Hash> {
    std::fs::read(path).ok().map(|bytes| blake3::hash(&bytes))
}

/// Whether `dest` exists with exactly the content of `src`
pub(crate) fn same_content(src: &Path, dest: &Path) -> bool {
    match (digest(src), digest(dest)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Record the outcome of one command in an apply: returns whether it
/// succeeded and pushes `"<label>: <error>"` on failure.
pub(crate) fn record(
    result: Result<CommandOutput>,
    label: &str,
    failures: &mut Vec<String>,
) -> bool {
    match result {
        Ok(output) if output.success => true,
        Ok(output) => {
            failures.push(format!("{}: {}", label, output.error_message("failed")));
            false
        }
        Err(e) => {
            failures.push(format!("{label}: {e:#}"));
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Host;
    use anyhow::{Result, bail};
    use declarative::{CommandOutput, CommandRunner, Config};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    enum Reply {
        Output(CommandOutput),
        Missing,
    }

    /// Command runner that answers from a script and records every call.
    ///
    /// Rules match when the command line (`"cmd arg1 arg2"`) starts with the
    /// rule's pattern; the first matching rule wins. Unmatched commands
    /// succeed with empty output.
    #[derive(Default)]
    pub struct MockRunner {
        rules: Mutex<Vec<(String, Reply)>>,
        calls: Mutex<Vec<String>>,
        inputs: Mutex<Vec<String>>,
    }

    impl MockRunner {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn ok(&self, pattern: &str, stdout: &str) -> &Self {
            self.push(pattern, Reply::Output(CommandOutput::ok(stdout)))
        }

        pub fn fail(&self, pattern: &str, stderr: &str) -> &Self {
            self.push(pattern, Reply::Output(CommandOutput::failed(stderr)))
        }

        /// Any command starting with `pattern` cannot be spawned
        pub fn missing(&self, pattern: &str) -> &Self {
            self.push(pattern, Reply::Missing)
        }

        fn push(&self, pattern: &str, reply: Reply) -> &Self {
            self.rules.lock().unwrap().push((pattern.to_string(), reply));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn inputs(&self) -> Vec<String> {
            self.inputs.lock().unwrap().clone()
        }

        pub fn called(&self, prefix: &str) -> bool {
            self.calls().iter().any(|c| c.starts_with(prefix))
        }

        fn reply(&self, line: &str) -> Result<CommandOutput> {
            let rules = self.rules.lock().unwrap();
            match rules.iter().find(|(pattern, _)| line.starts_with(pattern.as_str())) {
                Some((_, Reply::Output(output))) => Ok(output.clone()),
                Some((_, Reply::Missing)) => bail!("Failed to execute: {line}"),
                None => Ok(CommandOutput::ok("")),
            }
        }
    }

    impl CommandRunner for MockRunner {
        fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
            let line = std::iter::once(cmd)
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.calls.lock().unwrap().push(line.clone());
            self.reply(&line)
        }

        fn run_with_input(&self, cmd: &str, args: &[&str], input: &str) -> Result<CommandOutput> {
            self.inputs.lock().unwrap().push(input.to_string());
            self.run(cmd, args)
        }
    }

    /// Unprivileged host over `runner` with `home` as the home directory
    pub fn host(runner: &Arc<MockRunner>, home: &Path) -> Host {
        Host::new(runner.clone(), false, home.to_path_buf())
    }

    pub fn config(value: serde_json::Value) -> Arc<Config> {
        Arc::new(Config::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockRunner;
    use super::*;

    #[test]
    fn test_sudo_prefixes_when_elevating() {
        let runner = MockRunner::new();
        let host = Host::new(runner.clone(), true, PathBuf::from("/home/pi"));

        host.sudo("systemctl", &["enable", "--now", "ssh"]).unwrap();
        host.run("hostname", &[]).unwrap();
        assert_eq!(runner.calls(), vec!["sudo systemctl enable --now ssh", "hostname"]);
    }

    #[test]
    fn test_sudo_runs_directly_as_root() {
        let runner = MockRunner::new();
        let host = Host::new(runner.clone(), false, PathBuf::from("/root"));

        host.sudo_with_input("tee", &["/etc/hostname"], "pi\n").unwrap();
        assert_eq!(runner.calls(), vec!["tee /etc/hostname"]);
        assert_eq!(runner.inputs(), vec!["pi\n"]);
    }

    #[test]
    fn test_record_collects_failures() {
        let mut failures = Vec::new();
        assert!(record(Ok(CommandOutput::ok("")), "a", &mut failures));
        assert!(!record(Ok(CommandOutput::failed("denied")), "b", &mut failures));
        assert!(!record(Err(anyhow::anyhow!("not found")), "c", &mut failures));
        assert_eq!(failures, vec!["b: denied", "c: not found"]);
    }

    #[test]
    fn test_same_content_compares_digests() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, "wallpaper").unwrap();

        assert!(!same_content(&a, &b));
        std::fs::write(&b, "wallpaper").unwrap();
        assert!(same_content(&a, &b));
        std::fs::write(&b, "other").unwrap();
        assert!(!same_content(&a, &b));
    }
}
