//! The fixed task list for a Raspberry Pi OS host

use anyhow::{Context, Result};
use declarative::{Config, Plan, TagSet};
use std::path::Path;
use std::sync::Arc;

use crate::tasks::{
    AptPresent, DesktopLxqt, FilePresent, Host, PiAppsPresent, RaspiConfig, SystemdManage,
    VsCodeExtensions, WallpaperAsset,
};

/// Register every task in execution order.
///
/// Order matters: system identity and services first, then packages, the
/// desktop, files and finally user-level applications.
pub fn build_plan(config: Arc<Config>, tags: TagSet, host: &Host) -> Plan {
    let c = || config.clone();
    let h = || host.clone();

    Plan::builder(tags)
        .task(RaspiConfig::new(c(), TagSet::from(["system"]), h()))
        .task(SystemdManage::new(c(), TagSet::from(["system", "services"]), h()))
        .task(AptPresent::new(c(), TagSet::from(["apt", "apps"]), h()))
        .task(DesktopLxqt::new(c(), TagSet::from(["desktop"]), h()))
        .task(WallpaperAsset::new(c(), TagSet::from(["desktop", "files"]), h()))
        .task(FilePresent::new(c(), TagSet::from(["files"]), h()))
        .task(PiAppsPresent::new(c(), TagSet::from(["apps", "piapps"]), h()))
        .task(VsCodeExtensions::new(c(), TagSet::from(["apps", "vscode"]), h()))
        .build()
}

/// Load `config` with `profile` layered on top and build the plan for the
/// real host
pub fn load(config: &Path, profile: &str, tags: &str) -> Result<Plan> {
    let merged = declarative::config::load(config, profile)
        .with_context(|| format!("Invalid configuration {}", config.display()))?;
    log::debug!("Loaded {} (profile {profile})", config.display());
    Ok(build_plan(
        Arc::new(merged),
        TagSet::parse(tags),
        &Host::system(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::testing::{MockRunner, host};

    fn plan(tags: &str) -> Plan {
        let runner = MockRunner::new();
        build_plan(
            Arc::new(Config::default()),
            TagSet::parse(tags),
            &host(&runner, Path::new("/home/pi")),
        )
    }

    fn names(plan: &Plan) -> Vec<String> {
        plan.selected().map(|t| t.name().to_string()).collect()
    }

    #[test]
    fn test_registration_order() {
        assert_eq!(
            names(&plan("")),
            vec![
                "raspi_config",
                "systemd_manage",
                "apt_present",
                "desktop_lxqt",
                "wallpaper_asset",
                "file_present",
                "piapps_present",
                "vscode_extensions",
            ]
        );
    }

    #[test]
    fn test_tag_selection() {
        assert_eq!(names(&plan("system")), vec!["raspi_config", "systemd_manage"]);
        assert_eq!(
            names(&plan("files")),
            vec!["wallpaper_asset", "file_present"]
        );
        assert_eq!(
            names(&plan("apps")),
            vec!["apt_present", "piapps_present", "vscode_extensions"]
        );
        assert_eq!(names(&plan("vscode, desktop")), vec![
            "desktop_lxqt",
            "wallpaper_asset",
            "vscode_extensions",
        ]);
        assert!(names(&plan("nope")).is_empty());
    }

    #[test]
    fn test_task_tags() {
        let plan = plan("");
        let tags: Vec<(String, String)> = plan
            .tasks()
            .map(|t| (t.name().to_string(), t.tags().to_string()))
            .collect();
        assert_eq!(tags[1], ("systemd_manage".to_string(), "services,system".to_string()));
        assert_eq!(tags[7], ("vscode_extensions".to_string(), "apps,vscode".to_string()));
    }
}
