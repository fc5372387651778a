//! Applications installed through Pi-Apps

use anyhow::Result;
use declarative::{ApplyOutcome, CheckOutcome, Config, TagSet, Task};
use std::path::PathBuf;
use std::sync::Arc;

use super::{Host, record};

const PIAPPS_REPO: &str = "https://github.com/Botspot/pi-apps";

#[derive(Debug)]
pub struct PiAppsPresent {
    tags: TagSet,
    config: Arc<Config>,
    host: Host,
}

impl PiAppsPresent {
    pub fn new(config: Arc<Config>, tags: TagSet, host: Host) -> Self {
        Self { tags, config, host }
    }

    fn base(&self) -> PathBuf {
        self.host.expand("~/.local/share/pi-apps")
    }

    fn is_installed(&self, app: &str) -> bool {
        self.base().join("apps").join(app).join("installed").exists()
    }

    fn missing(&self) -> Vec<String> {
        self.config
            .str_list("piapps.apps")
            .into_iter()
            .filter(|app| !self.is_installed(app))
            .collect()
    }

    /// Clone Pi-Apps on first use, otherwise fast-forward it
    fn ensure_piapps(&self) -> Result<PathBuf> {
        let base = self.base();
        let target = base.display().to_string();
        if base.exists() {
            let pulled = self.host.run("git", &["-C", &target, "pull", "--ff-only"]);
            if !pulled.as_ref().is_ok_and(|output| output.success) {
                log::warn!("Could not update Pi-Apps in {target}");
            }
        } else {
            let output = self.host.run("git", &["clone", PIAPPS_REPO, &target])?;
            if !output.success {
                anyhow::bail!("git clone failed: {}", output.error_message("unknown error"));
            }
        }
        Ok(base.join("pi-apps"))
    }
}

impl Task for PiAppsPresent {
    fn name(&self) -> &str {
        "piapps_present"
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn check(&self) -> Result<CheckOutcome> {
        if self.config.str_list("piapps.apps").is_empty() {
            return Ok(CheckOutcome::satisfied("no pi-apps requested"));
        }
        let missing = self.missing();
        if missing.is_empty() {
            Ok(CheckOutcome::satisfied("all pi-apps present"))
        } else {
            Ok(CheckOutcome::diverged(format!("missing: {}", missing.join(", "))))
        }
    }

    fn apply(&self) -> Result<ApplyOutcome> {
        let missing = self.missing();
        if missing.is_empty() {
            return Ok(ApplyOutcome::ok("nothing to install"));
        }

        let binary = self.ensure_piapps()?;
        let binary = binary.display().to_string();
        let mut messages = Vec::new();
        let mut failures = Vec::new();
        for app in &missing {
            if record(
                self.host.run("bash", &[&binary, "install", app]),
                app,
                &mut failures,
            ) {
                messages.push(format!("{app}: installed"));
            }
        }

        let succeeded = failures.is_empty();
        messages.extend(failures);
        Ok(ApplyOutcome::from_items(succeeded, &messages, "nothing to install"))
    }
}
