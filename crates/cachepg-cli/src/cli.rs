use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "cachepg")]
#[command(version)]
#[command(about = "Keep ElastiCache parameter groups in line with a manifest", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Config file (defaults to <config dir>/cachepg/config.json)
    #[arg(long, global = true, env = "CACHEPG_CONFIG")]
    pub config: Option<PathBuf>,

    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS shared-config profile
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// State file
    #[arg(long, global = true, env = "CACHEPG_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(ManifestArgs),

    /// Create, update and delete parameter groups to match the manifest
    Apply(ManifestArgs),

    /// Delete every parameter group tracked in state
    Destroy {
        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },

    /// Start tracking an existing parameter group
    Import {
        /// Parameter group name
        name: String,
    },

    /// Print the state file
    Show,
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Manifest file
    #[arg(short, long, default_value = "cachepg.json")]
    pub manifest: PathBuf,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
