use cachepg_cli::config::{self, Overrides};
use clap::Parser;
use eyre::Result;

mod cli;
mod commands;

use cli::{Cli, Command, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let settings = config::load_config(&config_path)?.resolve(Overrides {
        region: cli.region,
        profile: cli.profile,
        state_path: cli.state,
    })?;
    let ctx = commands::Context::connect(settings).await;

    match cli.command {
        Command::Plan(args) => commands::plan(&ctx, &args.manifest, args.json).await,
        Command::Apply(args) => commands::apply(&ctx, &args.manifest, args.json).await,
        Command::Destroy { yes } => commands::destroy(&ctx, yes).await,
        Command::Import { name } => commands::import(&ctx, &name).await,
        Command::Show => commands::show(&ctx).await,
    }
}

/// `RUST_LOG` wins; otherwise `info`, raised by `-v`.
fn init_tracing(verbose: u8, format: LogFormat) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
