use anyhow::{Context as _, Result};

use crate::facts::Facts;
use crate::ui;

pub fn run(json: bool) -> Result<i32> {
    let facts = Facts::detect();

    if json {
        let out = serde_json::to_string_pretty(&facts).context("Failed to serialize facts")?;
        println!("{out}");
        return Ok(declarative::EXIT_OK);
    }

    ui::header("System facts");
    ui::kv("Platform", &facts.platform, 9);
    ui::kv("Kernel", &facts.kernel, 9);
    ui::kv("Model", &ui::or_none(&facts.model), 9);

    ui::section("OS Release");
    for (key, value) in &facts.os_release {
        ui::kv(key, value, 20);
    }

    ui::section("Session");
    ui::kv("Desktop", &ui::or_none(&facts.desktop), 9);
    ui::kv("Wayland", &facts.wayland.to_string(), 9);

    Ok(declarative::EXIT_OK)
}
