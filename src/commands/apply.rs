use anyhow::Result;
use colored::Colorize;
use declarative::converge;

use super::ConsoleProgress;
use crate::Context;
use crate::cli::ApplyArgs;
use crate::plan;
use crate::ui;

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<i32> {
    let plan = plan::load(&args.plan.config, &args.plan.profile, &args.plan.tags)?;
    log::info!(
        "{} of {} tasks selected (tags: {})",
        plan.selected().count(),
        plan.len(),
        if plan.tags().is_empty() { "all".to_string() } else { plan.tags().to_string() }
    );

    if args.dry_run {
        println!(
            "{}\n",
            "Dry-run: showing checks only. No changes will be made.".yellow()
        );
    }

    let report = {
        let mut progress = ConsoleProgress::new(ctx.quiet);
        converge(&plan, args.dry_run, &mut progress)
    };

    println!("\nDone.");
    let failed = report.failures().count();
    if failed > 0 {
        ui::warn(&format!("{failed} task(s) failed"));
    } else if !ctx.quiet && !args.dry_run && report.changed() > 0 {
        ui::success(&format!("{} task(s) changed", report.changed()));
    }

    Ok(report.exit_code())
}
