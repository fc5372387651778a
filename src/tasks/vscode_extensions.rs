//! VS Code extensions installed or removed through the editor CLI

use anyhow::Result;
use declarative::{ApplyOutcome, CheckOutcome, Config, TagSet, Task};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::{Host, record};

const CLI_CANDIDATES: [&str; 3] = ["code", "code-oss", "codium"];

#[derive(Debug)]
pub struct VsCodeExtensions {
    tags: TagSet,
    config: Arc<Config>,
    host: Host,
}

#[derive(Debug, Default)]
struct Changes {
    install: Vec<String>,
    uninstall: Vec<String>,
}

impl VsCodeExtensions {
    pub fn new(config: Arc<Config>, tags: TagSet, host: Host) -> Self {
        Self { tags, config, host }
    }

    fn requested(&self) -> bool {
        self.config.is_set("vscode.extensions")
    }

    fn cli(&self) -> Option<String> {
        CLI_CANDIDATES.iter().find_map(|name| self.host.which(name))
    }

    fn installed(&self, cli: &str) -> BTreeSet<String> {
        match self.host.run(cli, &["--list-extensions"]) {
            Ok(output) if output.success => output
                .stdout_str()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    fn changes(&self, cli: &str) -> Changes {
        let current = self.installed(cli);
        let present: BTreeSet<String> = self.config.str_list("vscode.extensions.present").into_iter().collect();
        let absent: BTreeSet<String> = self.config.str_list("vscode.extensions.absent").into_iter().collect();
        Changes {
            install: present.difference(&current).cloned().collect(),
            uninstall: current.intersection(&absent).cloned().collect(),
        }
    }
}

impl Task for VsCodeExtensions {
    fn name(&self) -> &str {
        "vscode_extensions"
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn check(&self) -> Result<CheckOutcome> {
        if !self.requested() {
            return Ok(CheckOutcome::satisfied("no vscode extensions requested"));
        }
        let Some(cli) = self.cli() else {
            return Ok(CheckOutcome::skipped("vscode cli not found"));
        };

        let changes = self.changes(&cli);
        let mut pieces = Vec::new();
        if !changes.install.is_empty() {
            pieces.push(format!("install: {}", changes.install.join(", ")));
        }
        if !changes.uninstall.is_empty() {
            pieces.push(format!("uninstall: {}", changes.uninstall.join(", ")));
        }
        if pieces.is_empty() {
            Ok(CheckOutcome::satisfied("extensions match desired state"))
        } else {
            Ok(CheckOutcome::diverged(pieces.join("; ")))
        }
    }

    fn apply(&self) -> Result<ApplyOutcome> {
        let cli = match self.cli() {
            Some(cli) if self.requested() => cli,
            _ => return Ok(ApplyOutcome::ok("nothing to do")),
        };

        let changes = self.changes(&cli);
        let mut messages = Vec::new();
        let mut failures = Vec::new();
        for ext in &changes.install {
            if record(self.host.run(&cli, &["--install-extension", ext]), ext, &mut failures) {
                messages.push(format!("{ext}: installed"));
            }
        }
        for ext in &changes.uninstall {
            if record(self.host.run(&cli, &["--uninstall-extension", ext]), ext, &mut failures) {
                messages.push(format!("{ext}: uninstalled"));
            }
        }

        let succeeded = failures.is_empty();
        messages.extend(failures);
        Ok(ApplyOutcome::from_items(succeeded, &messages, "no changes"))
    }
}
