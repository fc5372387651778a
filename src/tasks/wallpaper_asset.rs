//! Desktop wallpaper installed into the shared wallpaper directory

use anyhow::Result;
use declarative::{ApplyOutcome, CheckOutcome, Config, TagSet, Task};
use std::path::PathBuf;
use std::sync::Arc;

use super::{Host, record, same_content};

pub const WALLPAPER_DIR: &str = "/usr/share/rpd-wallpaper";

#[derive(Debug)]
pub struct WallpaperAsset {
    tags: TagSet,
    config: Arc<Config>,
    host: Host,
    dir: PathBuf,
}

impl WallpaperAsset {
    pub fn new(config: Arc<Config>, tags: TagSet, host: Host) -> Self {
        Self::with_dir(config, tags, host, PathBuf::from(WALLPAPER_DIR))
    }

    pub fn with_dir(config: Arc<Config>, tags: TagSet, host: Host, dir: PathBuf) -> Self {
        Self {
            tags,
            config,
            host,
            dir,
        }
    }

    /// Source and destination, when a wallpaper is configured
    fn paths(&self) -> Option<(PathBuf, PathBuf)> {
        let src = self
            .config
            .str("desktop.wallpaper_asset.src")
            .filter(|s| !s.is_empty())?;
        let src = self.host.expand(src);
        let name = match self.config.str("desktop.wallpaper_asset.name") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => src.file_name()?.to_string_lossy().into_owned(),
        };
        let dest = self.dir.join(name);
        Some((src, dest))
    }
}

impl Task for WallpaperAsset {
    fn name(&self) -> &str {
        "wallpaper_asset"
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn check(&self) -> Result<CheckOutcome> {
        let Some((src, dest)) = self.paths() else {
            return Ok(CheckOutcome::satisfied("no wallpaper requested"));
        };
        if !src.is_file() {
            return Ok(CheckOutcome::diverged(format!("source missing: {}", src.display())));
        }
        if same_content(&src, &dest) {
            Ok(CheckOutcome::satisfied(format!("{} up to date", dest.display())))
        } else {
            Ok(CheckOutcome::diverged(format!("{} differs", dest.display())))
        }
    }

    fn apply(&self) -> Result<ApplyOutcome> {
        let Some((src, dest)) = self.paths() else {
            return Ok(ApplyOutcome::ok("no changes"));
        };
        if !src.is_file() {
            return Ok(ApplyOutcome::failed(format!("source not found: {}", src.display())));
        }

        let src = src.display().to_string();
        let target = dest.display().to_string();
        let mut failures = Vec::new();
        if record(
            self.host
                .sudo("install", &["-D", "-m", "0644", &src, &target]),
            "install",
            &mut failures,
        ) {
            Ok(ApplyOutcome::ok(format!("installed {target}")))
        } else {
            Ok(ApplyOutcome::failed(failures.join("; ")))
        }
    }
}
