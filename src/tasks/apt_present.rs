//! Debian packages installed through apt

use anyhow::Result;
use declarative::{ApplyOutcome, CheckOutcome, Config, TagSet, Task};
use std::sync::Arc;

use super::{Host, record};

#[derive(Debug)]
pub struct AptPresent {
    tags: TagSet,
    config: Arc<Config>,
    host: Host,
}

impl AptPresent {
    pub fn new(config: Arc<Config>, tags: TagSet, host: Host) -> Self {
        Self { tags, config, host }
    }

    fn is_installed(&self, package: &str) -> bool {
        self.host.run("dpkg", &["-s", package]).is_ok_and(|output| {
            output.success && output.stdout_str().contains("Status: install ok installed")
        })
    }

    fn missing(&self) -> Vec<String> {
        self.config
            .str_list("apt.packages.present")
            .into_iter()
            .filter(|package| !self.is_installed(package))
            .collect()
    }
}

impl Task for AptPresent {
    fn name(&self) -> &str {
        "apt_present"
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn check(&self) -> Result<CheckOutcome> {
        if self.host.which("dpkg").is_none() {
            return Ok(CheckOutcome::skipped("dpkg not available"));
        }
        let missing = self.missing();
        if missing.is_empty() {
            Ok(CheckOutcome::satisfied("all packages present"))
        } else {
            Ok(CheckOutcome::diverged(format!("missing: {}", missing.join(", "))))
        }
    }

    fn apply(&self) -> Result<ApplyOutcome> {
        let missing = self.missing();
        if missing.is_empty() {
            return Ok(ApplyOutcome::ok("no changes"));
        }

        let mut failures = Vec::new();
        if self.config.bool_or("apt.update", true)
            && !record(self.host.sudo("apt-get", &["update"]), "apt-get update", &mut failures)
        {
            return Ok(ApplyOutcome::failed(failures.join("; ")));
        }

        let mut args = vec!["install", "-y"];
        args.extend(missing.iter().map(String::as_str));
        log::info!("Installing {} package(s): {}", missing.len(), missing.join(", "));
        if record(self.host.sudo("apt-get", &args), "apt-get install", &mut failures) {
            Ok(ApplyOutcome::ok(format!("installed {}", missing.join(", "))))
        } else {
            Ok(ApplyOutcome::failed(failures.join("; ")))
        }
    }
}
