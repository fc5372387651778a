//! Files copied into place from sources shipped next to the config

use anyhow::{Context, Result, anyhow};
use declarative::{ApplyOutcome, CheckOutcome, Config, TagSet, Task};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Host, same_content};

const DEFAULT_MODE: u32 = 0o644;

/// Paths listed in a check message before the rest is summarised
const LISTED: usize = 3;

#[derive(Debug, Deserialize)]
struct RawEntry {
    src: String,
    dest: String,
    #[serde(default)]
    mode: Option<Value>,
    #[serde(default = "default_backup")]
    backup: bool,
}

const fn default_backup() -> bool {
    true
}

/// One `files[]` entry with paths expanded
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileEntry {
    src: PathBuf,
    dest: PathBuf,
    mode: u32,
    backup: bool,
}

#[derive(Debug)]
pub struct FilePresent {
    tags: TagSet,
    config: Arc<Config>,
    host: Host,
}

impl FilePresent {
    pub fn new(config: Arc<Config>, tags: TagSet, host: Host) -> Self {
        Self { tags, config, host }
    }

    fn entries(&self) -> Result<Vec<FileEntry>> {
        let Some(items) = self.config.get("files").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let raw = match serde_json::from_value::<RawEntry>(item.clone()) {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Ignoring files entry {item}: {e}");
                    continue;
                }
            };
            let mode = match &raw.mode {
                Some(value) => parse_mode(value)
                    .ok_or_else(|| anyhow!("invalid mode {value} for {}; quote it, e.g. \"0644\"", raw.dest))?,
                None => DEFAULT_MODE,
            };
            entries.push(FileEntry {
                src: self.host.expand(&raw.src),
                dest: self.host.expand(&raw.dest),
                mode,
                backup: raw.backup,
            });
        }
        Ok(entries)
    }

    fn pending(&self) -> Result<Vec<FileEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| !same_content(&entry.src, &entry.dest))
            .collect())
    }
}

impl Task for FilePresent {
    fn name(&self) -> &str {
        "file_present"
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn check(&self) -> Result<CheckOutcome> {
        let pending = self.pending()?;
        if pending.is_empty() {
            return Ok(CheckOutcome::satisfied("all files present"));
        }

        let mut listed: Vec<String> = pending
            .iter()
            .take(LISTED)
            .map(|entry| entry.dest.display().to_string())
            .collect();
        if pending.len() > LISTED {
            listed.push(format!("+{} more", pending.len() - LISTED));
        }
        Ok(CheckOutcome::diverged(format!("differs: {}", listed.join(", "))))
    }

    fn apply(&self) -> Result<ApplyOutcome> {
        let mut messages = Vec::new();
        let mut failures = Vec::new();

        for entry in self.pending()? {
            match install(&entry) {
                Ok(()) => messages.push(format!("wrote {}", entry.dest.display())),
                Err(e) => failures.push(format!("{}: {e:#}", entry.dest.display())),
            }
        }

        let succeeded = failures.is_empty();
        messages.extend(failures);
        Ok(ApplyOutcome::from_items(succeeded, &messages, "no changes"))
    }
}

fn install(entry: &FileEntry) -> Result<()> {
    if entry.backup && entry.dest.exists() {
        let backup = backup_path(&entry.dest);
        fs::copy(&entry.dest, &backup)
            .with_context(|| format!("Failed to back up to {}", backup.display()))?;
    }
    if let Some(parent) = entry.dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(&entry.src, &entry.dest)
        .with_context(|| format!("Failed to copy {}", entry.src.display()))?;
    fs::set_permissions(&entry.dest, fs::Permissions::from_mode(entry.mode))
        .with_context(|| format!("Failed to set mode {:o}", entry.mode))?;
    Ok(())
}

fn backup_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Octal mode from `"0644"`, `"0o644"`, `"644"` or a bare YAML number `644`.
///
/// YAML 1.2 reads `0o644` as the integer 420, which cannot be told apart
/// from a bare `420`; numbers are taken only when their decimal digits are
/// all octal and exceed `0o777`, so anything that small is rejected.
fn parse_mode(value: &Value) -> Option<u32> {
    let mode = match value {
        Value::String(s) => {
            let s = s.trim();
            u32::from_str_radix(s.strip_prefix("0o").unwrap_or(s), 8).ok()?
        }
        Value::Number(n) => {
            let n = n.as_u64().filter(|&n| n > 0o777)?;
            u32::from_str_radix(&n.to_string(), 8).ok()?
        }
        _ => return None,
    };
    (mode <= 0o7777).then_some(mode)
}
