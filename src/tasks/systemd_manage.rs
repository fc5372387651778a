//! Enable or disable systemd units

use anyhow::Result;
use declarative::{ApplyOutcome, CheckOutcome, Config, TagSet, Task};
use std::sync::Arc;

use super::{Host, record};

/// `is-enabled` states that need no `enable` for a running unit. Static,
/// indirect and generated units cannot be enabled at all.
const ENABLED_STATES: [&str; 6] = [
    "enabled",
    "enabled-runtime",
    "static",
    "alias",
    "indirect",
    "generated",
];

#[derive(Debug)]
pub struct SystemdManage {
    tags: TagSet,
    config: Arc<Config>,
    host: Host,
}

/// Units whose state differs from the config
#[derive(Debug, Default)]
struct Pending {
    enable: Vec<String>,
    disable: Vec<String>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.enable.is_empty() && self.disable.is_empty()
    }

    fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.enable.is_empty() {
            parts.push(format!("enable: {}", self.enable.join(", ")));
        }
        if !self.disable.is_empty() {
            parts.push(format!("disable: {}", self.disable.join(", ")));
        }
        parts.join("; ")
    }
}

impl SystemdManage {
    pub fn new(config: Arc<Config>, tags: TagSet, host: Host) -> Self {
        Self { tags, config, host }
    }

    fn query(&self, verb: &str, unit: &str) -> String {
        self.host
            .run("systemctl", &[verb, unit])
            .map(|output| output.stdout_str().trim().to_string())
            .unwrap_or_default()
    }

    fn enablement(&self, unit: &str) -> String {
        self.query("is-enabled", unit)
    }

    fn is_active(&self, unit: &str) -> bool {
        self.query("is-active", unit) == "active"
    }

    fn pending(&self) -> Pending {
        let enable = self
            .config
            .str_list("services.enable")
            .into_iter()
            .filter(|unit| {
                !(self.is_active(unit) && ENABLED_STATES.contains(&self.enablement(unit).as_str()))
            })
            .collect();
        let disable = self
            .config
            .str_list("services.disable")
            .into_iter()
            .filter(|unit| {
                matches!(self.enablement(unit).as_str(), "enabled" | "enabled-runtime")
                    || self.is_active(unit)
            })
            .collect();
        Pending { enable, disable }
    }
}

impl Task for SystemdManage {
    fn name(&self) -> &str {
        "systemd_manage"
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn check(&self) -> Result<CheckOutcome> {
        if self.host.which("systemctl").is_none() {
            return Ok(CheckOutcome::skipped("systemctl not available"));
        }
        let pending = self.pending();
        if pending.is_empty() {
            Ok(CheckOutcome::satisfied("services in desired state"))
        } else {
            Ok(CheckOutcome::diverged(pending.summary()))
        }
    }

    fn apply(&self) -> Result<ApplyOutcome> {
        if self.host.which("systemctl").is_none() {
            return Ok(ApplyOutcome::ok("systemctl not available"));
        }

        let pending = self.pending();
        let mut messages = Vec::new();
        let mut failures = Vec::new();

        for unit in &pending.enable {
            if record(
                self.host.sudo("systemctl", &["enable", "--now", unit]),
                unit,
                &mut failures,
            ) {
                messages.push(format!("enabled {unit}"));
            }
        }
        for unit in &pending.disable {
            if record(
                self.host.sudo("systemctl", &["disable", "--now", unit]),
                unit,
                &mut failures,
            ) {
                messages.push(format!("disabled {unit}"));
            }
        }

        let succeeded = failures.is_empty();
        messages.extend(failures);
        Ok(ApplyOutcome::from_items(succeeded, &messages, "no changes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::testing::{MockRunner, config, host};
    use declarative::TaskExt;
    use serde_json::json;
    use std::path::Path;

    fn task(runner: &Arc<MockRunner>) -> SystemdManage {
        SystemdManage::new(
            config(json!({"services": {"enable": ["ssh"], "disable": ["bluetooth"]}})),
            TagSet::from(["system", "services"]),
            host(runner, Path::new("/home/pi")),
        )
    }

    #[test]
    fn test_missing_systemctl_is_skipped() {
        let runner = MockRunner::new();
        let outcome = task(&runner).check().unwrap();
        assert!(outcome.satisfied);
        assert!(outcome.skipped);
        assert_eq!(outcome.state_label(), "skipped");
    }

    #[test]
    fn test_check_satisfied_when_units_match() {
        let runner = MockRunner::new();
        runner
            .ok("which systemctl", "/usr/bin/systemctl\n")
            .ok("systemctl is-enabled ssh", "enabled\n")
            .ok("systemctl is-active ssh", "active\n")
            .fail("systemctl is-enabled bluetooth", "disabled")
            .fail("systemctl is-active bluetooth", "inactive");

        let outcome = task(&runner).check().unwrap();
        assert!(outcome.satisfied);
        assert!(!outcome.skipped);
    }

    #[test]
    fn test_check_and_apply_diverged_units() {
        let runner = MockRunner::new();
        runner
            .ok("which systemctl", "/usr/bin/systemctl\n")
            .ok("systemctl is-enabled ssh", "disabled\n")
            .ok("systemctl is-enabled bluetooth", "enabled\n");

        let task = task(&runner);
        let outcome = task.check().unwrap();
        assert!(outcome.would_change);
        assert_eq!(outcome.message, "enable: ssh; disable: bluetooth");

        let applied = task.apply().unwrap();
        assert!(applied.succeeded);
        assert_eq!(applied.message, "enabled ssh; disabled bluetooth");
        assert!(runner.called("systemctl enable --now ssh"));
        assert!(runner.called("systemctl disable --now bluetooth"));
    }

    #[test]
    fn test_static_active_unit_settles() {
        let runner = MockRunner::new();
        runner
            .ok("which systemctl", "/usr/bin/systemctl\n")
            .ok("systemctl is-enabled", "static\n")
            .ok("systemctl is-active", "active\n");

        let task = SystemdManage::new(
            config(json!({"services": {"enable": ["systemd-timesyncd"]}})),
            TagSet::from(["system", "services"]),
            host(&runner, Path::new("/home/pi")),
        );

        let result = task.run();
        assert!(!result.changed, "{}", result.message);
        assert_eq!(result.message, "services in desired state");
        assert!(!runner.called("systemctl enable"));
    }

    #[test]
    fn test_static_inactive_unit_is_started() {
        let runner = MockRunner::new();
        runner
            .ok("which systemctl", "/usr/bin/systemctl\n")
            .ok("systemctl is-enabled", "static\n")
            .missing("systemctl is-active");

        let task = SystemdManage::new(
            config(json!({"services": {"enable": ["fstrim.timer"]}})),
            TagSet::new(),
            host(&runner, Path::new("/home/pi")),
        );

        assert_eq!(task.check().unwrap().message, "enable: fstrim.timer");
    }

    #[test]
    fn test_apply_failure_is_reported() {
        let runner = MockRunner::new();
        runner
            .ok("which systemctl", "/usr/bin/systemctl\n")
            .fail("systemctl enable", "Unit ssh.service not found.");

        let applied = task(&runner).apply().unwrap();
        assert!(!applied.succeeded);
        assert_eq!(applied.message, "ssh: Unit ssh.service not found.");
    }
}
