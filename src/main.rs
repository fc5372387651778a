mod cli;
mod commands;
mod facts;
mod paths;
mod plan;
mod progress;
mod runner;
mod tasks;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match run(&ctx, cli.command) {
        Ok(code) => exit_code(code),
        Err(e) => {
            ui::error(&format!("{e:#}"));
            exit_code(error_code(&e))
        }
    }
}

fn run(ctx: &Context, command: Command) -> Result<i32> {
    log::trace!("verbosity {}", ctx.verbose);
    match command {
        Command::Facts { json } => commands::facts::run(json),
        Command::Apply(args) => commands::apply::run(ctx, &args),
        Command::Diff(args) => commands::diff::run(&args),
        Command::Verify(args) => commands::verify::run(&args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "rpios-setup", &mut io::stdout());
            Ok(declarative::EXIT_OK)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

/// Exit status for a command that could not run to completion
fn error_code(e: &anyhow::Error) -> i32 {
    if e.downcast_ref::<declarative::Error>().is_some() {
        declarative::EXIT_CONFIG
    } else {
        1
    }
}
