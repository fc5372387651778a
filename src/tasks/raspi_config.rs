//! Core system identity: hostname, timezone, locale, keyboard, GPU memory

use anyhow::Result;
use declarative::{ApplyOutcome, CheckOutcome, Config, TagSet, Task};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::{Host, record};
use crate::facts::parse_key_values;

/// System files inspected and rewritten by [`RaspiConfig`]
#[derive(Debug, Clone)]
pub struct SystemFiles {
    pub hostname: PathBuf,
    pub timezone: PathBuf,
    pub locale_gen: PathBuf,
    pub default_locale: PathBuf,
    pub default_keyboard: PathBuf,
    pub boot_config: PathBuf,
}

impl Default for SystemFiles {
    fn default() -> Self {
        Self {
            hostname: PathBuf::from("/etc/hostname"),
            timezone: PathBuf::from("/etc/timezone"),
            locale_gen: PathBuf::from("/etc/locale.gen"),
            default_locale: PathBuf::from("/etc/default/locale"),
            default_keyboard: PathBuf::from("/etc/default/keyboard"),
            boot_config: PathBuf::from("/boot/firmware/config.txt"),
        }
    }
}

/// One identity setting that differs from the config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Setting {
    Hostname,
    Timezone,
    Locale,
    Keyboard,
    GpuMem,
}

impl Setting {
    const ALL: [Self; 5] = [
        Self::Hostname,
        Self::Timezone,
        Self::Locale,
        Self::Keyboard,
        Self::GpuMem,
    ];

    fn key(self) -> &'static str {
        match self {
            Self::Hostname => "hostname",
            Self::Timezone => "timezone",
            Self::Locale => "locale",
            Self::Keyboard => "keyboard_layout",
            Self::GpuMem => "gpu_mem",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            other => other.key(),
        }
    }
}

#[derive(Debug)]
pub struct RaspiConfig {
    tags: TagSet,
    config: Arc<Config>,
    host: Host,
    files: SystemFiles,
}

impl RaspiConfig {
    pub fn new(config: Arc<Config>, tags: TagSet, host: Host) -> Self {
        Self::with_files(config, tags, host, SystemFiles::default())
    }

    pub fn with_files(config: Arc<Config>, tags: TagSet, host: Host, files: SystemFiles) -> Self {
        Self {
            tags,
            config,
            host,
            files,
        }
    }

    fn desired(&self, setting: Setting) -> Option<String> {
        self.config
            .scalar(setting.key())
            .filter(|value| !value.is_empty())
    }

    fn current(&self, setting: Setting) -> Option<String> {
        match setting {
            Setting::Hostname => self.host.run_capture("hostname", &[]).ok(),
            Setting::Timezone => read_trimmed(&self.files.timezone).or_else(|| {
                self.host
                    .run_capture("timedatectl", &["show", "-p", "Timezone", "--value"])
                    .ok()
            }),
            Setting::Locale => read_key(&self.files.default_locale, "LANG"),
            Setting::Keyboard => read_key(&self.files.default_keyboard, "XKBLAYOUT"),
            Setting::GpuMem => read_key(&self.files.boot_config, "gpu_mem"),
        }
    }

    /// Settings requested by the config that the host does not match yet
    fn diverged(&self) -> Vec<(Setting, String)> {
        Setting::ALL
            .into_iter()
            .filter_map(|setting| {
                let want = self.desired(setting)?;
                (self.current(setting).as_deref() != Some(want.as_str()))
                    .then_some((setting, want))
            })
            .collect()
    }

    fn converge(&self, setting: Setting, value: &str, failures: &mut Vec<String>) -> bool {
        let label = setting.label();
        match setting {
            Setting::Hostname => {
                let hostname_file = self.files.hostname.display().to_string();
                record(
                    self.host
                        .sudo_with_input("tee", &[&hostname_file], &format!("{value}\n")),
                    label,
                    failures,
                ) && record(
                    self.host.sudo("hostnamectl", &["set-hostname", value]),
                    label,
                    failures,
                )
            }
            Setting::Timezone => record(
                self.host.sudo("timedatectl", &["set-timezone", value]),
                label,
                failures,
            ),
            Setting::Locale => {
                let locale_gen = self.files.locale_gen.display().to_string();
                let uncomment = format!("s/^#\\s*{value}/{value}/");
                let lang = format!("LANG={value}");
                record(
                    self.host.sudo("sed", &["-i", &uncomment, &locale_gen]),
                    label,
                    failures,
                ) && record(self.host.sudo("locale-gen", &[]), label, failures)
                    && record(self.host.sudo("update-locale", &[&lang]), label, failures)
            }
            Setting::Keyboard => {
                let selection = format!(
                    "keyboard-configuration keyboard-configuration/layoutcode string {value}\n"
                );
                record(
                    self.host
                        .sudo_with_input("debconf-set-selections", &[], &selection),
                    label,
                    failures,
                ) && record(
                    self.host.sudo(
                        "dpkg-reconfigure",
                        &["-f", "noninteractive", "keyboard-configuration"],
                    ),
                    label,
                    failures,
                )
            }
            Setting::GpuMem => {
                let boot_config = self.files.boot_config.display().to_string();
                record(
                    self.host.sudo("sed", &["-i", "/^gpu_mem=/d", &boot_config]),
                    label,
                    failures,
                ) && record(
                    self.host.sudo_with_input(
                        "tee",
                        &["-a", &boot_config],
                        &format!("gpu_mem={value}\n"),
                    ),
                    label,
                    failures,
                )
            }
        }
    }
}

impl Task for RaspiConfig {
    fn name(&self) -> &str {
        "raspi_config"
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn check(&self) -> Result<CheckOutcome> {
        let diverged = self.diverged();
        if diverged.is_empty() {
            return Ok(CheckOutcome::satisfied("ok"));
        }
        let labels: Vec<&str> = diverged.iter().map(|(s, _)| s.label()).collect();
        Ok(CheckOutcome::diverged(format!("needs: {}", labels.join(", "))))
    }

    fn apply(&self) -> Result<ApplyOutcome> {
        let mut messages = Vec::new();
        let mut failures = Vec::new();

        for (setting, value) in self.diverged() {
            if self.converge(setting, &value, &mut failures) {
                messages.push(format!("{}->{}", setting.label(), value));
            }
        }

        let succeeded = failures.is_empty();
        messages.extend(failures);
        Ok(ApplyOutcome::from_items(succeeded, &messages, "no changes"))
    }
}

fn read_trimmed(path: &std::path::Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let trimmed = content.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn read_key(path: &std::path::Path, key: &str) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    parse_key_values(&content).remove(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::testing::{MockRunner, config, host};
    use serde_json::json;
    use tempfile::TempDir;

    fn files(dir: &TempDir) -> SystemFiles {
        let root = dir.path();
        SystemFiles {
            hostname: root.join("hostname"),
            timezone: root.join("timezone"),
            locale_gen: root.join("locale.gen"),
            default_locale: root.join("locale"),
            default_keyboard: root.join("keyboard"),
            boot_config: root.join("config.txt"),
        }
    }

    #[test]
    fn test_check_ok_when_everything_matches() {
        let dir = TempDir::new().unwrap();
        let files = files(&dir);
        fs::write(&files.timezone, "Europe/Lisbon\n").unwrap();
        fs::write(&files.default_locale, "LANG=en_GB.UTF-8\n").unwrap();
        fs::write(&files.default_keyboard, "XKBMODEL=\"pc105\"\nXKBLAYOUT=\"gb\"\n").unwrap();
        fs::write(&files.boot_config, "dtparam=audio=on\ngpu_mem=128\n").unwrap();

        let runner = MockRunner::new();
        runner.ok("hostname", "pi\n");

        let task = RaspiConfig::with_files(
            config(json!({
                "hostname": "pi",
                "timezone": "Europe/Lisbon",
                "locale": "en_GB.UTF-8",
                "keyboard_layout": "gb",
                "gpu_mem": 128,
            })),
            TagSet::from(["system"]),
            host(&runner, dir.path()),
            files,
        );

        let outcome = task.check().unwrap();
        assert!(outcome.satisfied, "{}", outcome.message);
        assert_eq!(outcome.message, "ok");
    }

    #[test]
    fn test_check_lists_diverged_settings() {
        let dir = TempDir::new().unwrap();
        let files = files(&dir);
        fs::write(&files.timezone, "UTC\n").unwrap();

        let runner = MockRunner::new();
        runner.ok("hostname", "raspberrypi");

        let task = RaspiConfig::with_files(
            config(json!({"hostname": "pi", "timezone": "UTC", "gpu_mem": 64})),
            TagSet::new(),
            host(&runner, dir.path()),
            files,
        );

        let outcome = task.check().unwrap();
        assert!(!outcome.satisfied);
        assert!(outcome.would_change);
        assert_eq!(outcome.message, "needs: hostname, gpu_mem");
    }

    #[test]
    fn test_check_without_settings_is_ok() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let task = RaspiConfig::with_files(
            config(json!({"apt": {}})),
            TagSet::new(),
            host(&runner, dir.path()),
            files(&dir),
        );

        assert!(task.check().unwrap().satisfied);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_timezone_falls_back_to_timedatectl() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        runner.ok("timedatectl show", "Europe/Berlin\n");

        let task = RaspiConfig::with_files(
            config(json!({"timezone": "Europe/Berlin"})),
            TagSet::new(),
            host(&runner, dir.path()),
            files(&dir),
        );

        assert!(task.check().unwrap().satisfied);
    }

    #[test]
    fn test_apply_touches_only_diverged_settings() {
        let dir = TempDir::new().unwrap();
        let files = files(&dir);
        fs::write(&files.timezone, "UTC\n").unwrap();
        let boot_config = files.boot_config.display().to_string();
        let hostname_file = files.hostname.display().to_string();

        let runner = MockRunner::new();
        runner.ok("hostname", "raspberrypi");

        let task = RaspiConfig::with_files(
            config(json!({"hostname": "pi", "timezone": "UTC", "gpu_mem": 128})),
            TagSet::new(),
            host(&runner, dir.path()),
            files,
        );

        let outcome = task.apply().unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.message, "hostname->pi; gpu_mem->128");
        assert!(runner.called(&format!("tee {hostname_file}")));
        assert!(runner.called("hostnamectl set-hostname pi"));
        assert!(runner.called(&format!("sed -i /^gpu_mem=/d {boot_config}")));
        assert!(!runner.called("timedatectl set-timezone"));
        assert_eq!(runner.inputs(), vec!["pi\n", "gpu_mem=128\n"]);
    }

    #[test]
    fn test_apply_reports_failed_step() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        runner
            .fail("timedatectl set-timezone", "Invalid time zone")
            .fail("timedatectl show", "");

        let task = RaspiConfig::with_files(
            config(json!({"timezone": "Mars/Olympus"})),
            TagSet::new(),
            host(&runner, dir.path()),
            files(&dir),
        );

        let outcome = task.apply().unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.message, "timezone: Invalid time zone");
    }
}
