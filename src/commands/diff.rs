use anyhow::Result;
use declarative::{NoProgress, inspect};

use crate::cli::PlanArgs;
use crate::plan;

pub fn run(args: &PlanArgs) -> Result<i32> {
    let plan = plan::load(&args.config, &args.profile, &args.tags)?;
    let report = inspect(&plan, &mut NoProgress);

    for line in report.lines() {
        println!("{line}");
    }
    log::info!("{} task(s) would change", report.would_change());

    Ok(report.exit_code())
}
