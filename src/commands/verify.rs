use anyhow::Result;
use colored::Colorize;
use declarative::verify;

use super::paint;
use crate::cli::PlanArgs;
use crate::plan;

pub fn run(args: &PlanArgs) -> Result<i32> {
    let plan = plan::load(&args.config, &args.profile, &args.tags)?;
    let report = verify(&plan);

    if report.is_success() {
        println!("{}", "All good!".green());
    } else {
        for line in report.lines() {
            println!("{}", paint(&line));
        }
    }
    log::info!(
        "{} checked, {} unsatisfied",
        report.checked,
        report.failures.len()
    );

    Ok(report.exit_code())
}
