//! Read-only survey of the host: platform, OS release, desktop session, board model

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::runner;

const OSRELEASE: &str = "/proc/sys/kernel/osrelease";
const OS_RELEASE: &str = "/etc/os-release";
const MODEL: &str = "/proc/device-tree/model";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facts {
    pub platform: String,
    pub kernel: String,
    pub os_release: BTreeMap<String, String>,
    pub desktop: String,
    pub wayland: bool,
    pub model: String,
}

impl Facts {
    pub fn detect() -> Self {
        let kernel = kernel_release();
        Self {
            platform: platform(&kernel),
            os_release: fs::read_to_string(OS_RELEASE)
                .map(|content| parse_key_values(&content))
                .unwrap_or_default(),
            desktop: std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default(),
            wayland: std::env::var("WAYLAND_DISPLAY").is_ok_and(|v| !v.is_empty()),
            model: read_model(Path::new(MODEL)),
            kernel,
        }
    }
}

/// `<OS>-<kernel>-<arch>`, e.g. `Linux-6.6.31+rpt-rpi-v8-aarch64`
fn platform(kernel: &str) -> String {
    let os = match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        other => other,
    };
    format!("{os}-{kernel}-{}", std::env::consts::ARCH)
}

fn kernel_release() -> String {
    if let Ok(release) = fs::read_to_string(OSRELEASE) {
        return release.trim().to_string();
    }
    runner::run_capture("uname", &["-r"]).unwrap_or_else(|e| {
        log::debug!("uname -r failed: {e:#}");
        String::new()
    })
}

fn read_model(path: &Path) -> String {
    fs::read(path)
        .map(|bytes| {
            String::from_utf8_lossy(&bytes)
                .replace('\0', "")
                .trim()
                .to_string()
        })
        .unwrap_or_default()
}

/// Parse `KEY=value` lines as found in os-release and `/etc/default/*`.
///
/// Blank lines and `#` comments are skipped; surrounding quotes are removed
/// from values.
pub fn parse_key_values(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}
