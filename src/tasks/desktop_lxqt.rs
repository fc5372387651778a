//! LXQt session: autostart entries and the panel layout

use anyhow::{Context, Result};
use declarative::{ApplyOutcome, CheckOutcome, Config, TagSet, Task};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Host;

#[derive(Debug, Deserialize)]
struct Autostart {
    name: String,
    #[serde(default)]
    exec: String,
    #[serde(default)]
    comment: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl Autostart {
    fn file_name(&self) -> String {
        format!("{}.desktop", self.name.replace(' ', "_"))
    }

    fn render(&self) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name={}\n\
             Comment={}\n\
             Exec={}\n\
             X-GNOME-Autostart-enabled={}\n",
            self.name, self.comment, self.exec, self.enabled
        )
    }
}

/// One plugin in the panel, written as `plugin` or `{type, name}`
#[derive(Debug, Clone, PartialEq, Eq)]
struct PanelPlugin {
    kind: String,
    name: String,
}

impl PanelPlugin {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(kind) => Some(Self {
                kind: kind.clone(),
                name: kind.clone(),
            }),
            Value::Object(map) => {
                let kind = map.get("type").and_then(Value::as_str)?.to_string();
                let name = map
                    .get("name")
                    .and_then(Value::as_str)
                    .map_or_else(|| kind.clone(), str::to_string);
                Some(Self { kind, name })
            }
            _ => None,
        }
    }
}

fn render_panel(plugins: &[PanelPlugin]) -> String {
    let names: Vec<&str> = plugins.iter().map(|p| p.name.as_str()).collect();
    let mut out = String::from("[General]\n__userfile__=true\n\n[panel1]\n");
    let _ = writeln!(out, "plugins={}", names.join(", "));
    out.push_str("position=Bottom\n");
    for plugin in plugins {
        let _ = write!(out, "\n[{}]\ntype={}\n", plugin.name, plugin.kind);
    }
    out
}

/// A file this task owns and its desired content
#[derive(Debug)]
struct Managed {
    label: String,
    path: PathBuf,
    content: String,
}

impl Managed {
    fn is_current(&self) -> bool {
        fs::read_to_string(&self.path).is_ok_and(|existing| existing == self.content)
    }

    fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, &self.content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

#[derive(Debug)]
pub struct DesktopLxqt {
    tags: TagSet,
    config: Arc<Config>,
    host: Host,
}

impl DesktopLxqt {
    pub fn new(config: Arc<Config>, tags: TagSet, host: Host) -> Self {
        Self { tags, config, host }
    }

    fn config_dir(&self) -> PathBuf {
        self.host.home().join(".config")
    }

    fn managed(&self) -> Vec<Managed> {
        let mut files = Vec::new();

        let autostart_dir = self.config_dir().join("autostart");
        for item in self.config.get("desktop.autostart").and_then(Value::as_array).into_iter().flatten() {
            match serde_json::from_value::<Autostart>(item.clone()) {
                Ok(entry) => files.push(Managed {
                    label: entry.file_name(),
                    path: autostart_dir.join(entry.file_name()),
                    content: entry.render(),
                }),
                Err(e) => log::warn!("Ignoring autostart entry {item}: {e}"),
            }
        }

        let plugins: Vec<PanelPlugin> = self
            .config
            .get("desktop.lxqt.panel.entries")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(PanelPlugin::from_value)
            .collect();
        if !plugins.is_empty() {
            files.push(Managed {
                label: "panel.conf".to_string(),
                path: panel_path(&self.config_dir()),
                content: render_panel(&plugins),
            });
        }

        files
    }
}

fn panel_path(config_dir: &Path) -> PathBuf {
    config_dir.join("lxqt").join("panel.conf")
}

impl Task for DesktopLxqt {
    fn name(&self) -> &str {
        "desktop_lxqt"
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn check(&self) -> Result<CheckOutcome> {
        if !self.config.is_set("desktop") {
            return Ok(CheckOutcome::satisfied("no desktop config"));
        }
        let stale: Vec<String> = self
            .managed()
            .into_iter()
            .filter(|file| !file.is_current())
            .map(|file| file.label)
            .collect();
        if stale.is_empty() {
            Ok(CheckOutcome::satisfied("desktop entries present"))
        } else {
            Ok(CheckOutcome::diverged(format!("missing: {}", stale.join(", "))))
        }
    }

    fn apply(&self) -> Result<ApplyOutcome> {
        let mut written = Vec::new();
        for file in self.managed().into_iter().filter(|file| !file.is_current()) {
            if let Err(e) = file.write() {
                return Ok(ApplyOutcome::failed(format!("{e:#}")));
            }
            written.push(file.label);
        }
        if written.is_empty() {
            Ok(ApplyOutcome::ok("no changes"))
        } else {
            Ok(ApplyOutcome::ok(format!("wrote {}", written.join(", "))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::testing::{MockRunner, config, host};
    use serde_json::json;
    use tempfile::TempDir;

    fn task(dir: &TempDir, desktop: Value) -> DesktopLxqt {
        let runner = MockRunner::new();
        DesktopLxqt::new(config(json!({ "desktop": desktop })), TagSet::from(["desktop"]), host(&runner, dir.path()))
    }

    #[test]
    fn test_autostart_entry_render() {
        let entry = Autostart {
            name: "Screen Saver".to_string(),
            exec: "xscreensaver -no-splash".to_string(),
            comment: String::new(),
            enabled: false,
        };
        assert_eq!(entry.file_name(), "Screen_Saver.desktop");
        assert_eq!(
            entry.render(),
            "[Desktop Entry]\nType=Application\nName=Screen Saver\nComment=\nExec=xscreensaver -no-splash\nX-GNOME-Autostart-enabled=false\n"
        );
    }

    #[test]
    fn test_render_panel() {
        let plugins: Vec<PanelPlugin> = [json!("mainmenu"), json!({"type": "taskbar", "name": "tasks"})]
            .iter()
            .filter_map(PanelPlugin::from_value)
            .collect();
        assert_eq!(
            render_panel(&plugins),
            "[General]\n__userfile__=true\n\n[panel1]\nplugins=mainmenu, tasks\nposition=Bottom\n\n[mainmenu]\ntype=mainmenu\n\n[tasks]\ntype=taskbar\n"
        );
    }

    #[test]
    fn test_no_desktop_config() {
        let dir = TempDir::new().unwrap();
        let outcome = task(&dir, json!({})).check().unwrap();
        assert!(outcome.satisfied);
        assert_eq!(outcome.message, "no desktop config");
    }

    #[test]
    fn test_apply_writes_entries_and_panel_once() {
        let dir = TempDir::new().unwrap();
        let task = task(
            &dir,
            json!({
                "autostart": [{"name": "Sync Notes", "exec": "notes --sync"}],
                "lxqt": {"panel": {"entries": ["mainmenu", "clock"]}},
            }),
        );

        let outcome = task.check().unwrap();
        assert!(outcome.would_change);
        assert_eq!(outcome.message, "missing: Sync_Notes.desktop, panel.conf");

        let applied = task.apply().unwrap();
        assert_eq!(applied.message, "wrote Sync_Notes.desktop, panel.conf");

        let entry = fs::read_to_string(dir.path().join(".config/autostart/Sync_Notes.desktop")).unwrap();
        assert!(entry.contains("Exec=notes --sync\n"));
        assert!(entry.contains("X-GNOME-Autostart-enabled=true\n"));
        let panel = fs::read_to_string(dir.path().join(".config/lxqt/panel.conf")).unwrap();
        assert!(panel.contains("plugins=mainmenu, clock\n"));

        assert!(task.check().unwrap().satisfied);
        assert_eq!(task.apply().unwrap().message, "no changes");
    }

    #[test]
    fn test_edited_entry_is_rewritten() {
        let dir = TempDir::new().unwrap();
        let task = task(&dir, json!({"autostart": [{"name": "htop", "exec": "lxterminal -e htop"}]}));
        task.apply().unwrap();

        let path = dir.path().join(".config/autostart/htop.desktop");
        fs::write(&path, "[Desktop Entry]\n").unwrap();
        assert!(!task.check().unwrap().satisfied);
        task.apply().unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("Exec=lxterminal -e htop"));
    }
}
