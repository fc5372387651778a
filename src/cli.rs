use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rpios-setup")]
#[command(version)]
#[command(about = "Declarative, idempotent setup for Raspberry Pi OS", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print detected system facts (model, OS release, desktop session)
    Facts {
        /// Print raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Make the machine match the config
    Apply(ApplyArgs),

    /// Show which tasks would change, without applying
    Diff(PlanArgs),

    /// Exit non-zero if any task is not satisfied
    Verify(PlanArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Which config, profile and tasks to operate on
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Path to the base config (YAML, TOML or JSON)
    #[arg(short, long, env = "RPIOS_SETUP_CONFIG")]
    pub config: PathBuf,

    /// Profile merged over the base, from profiles/<name>.<ext>
    #[arg(short, long, default_value = "base")]
    pub profile: String,

    /// Comma-separated tags limiting which tasks run (e.g. apt,apps,desktop)
    #[arg(short, long, default_value = "")]
    pub tags: String,
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Show what would change, without applying
    #[arg(long)]
    pub dry_run: bool,
}
