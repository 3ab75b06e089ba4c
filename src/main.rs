use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod actuals;
mod capability;
mod cli;
mod config;
mod error;
mod model;
mod output;
mod runner;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("shiftplan=debug")
    } else {
        EnvFilter::new("shiftplan=warn")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Plan(args) => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            cli::plan::execute(args, config).await
        }
        Commands::Evaluate(args) => cli::evaluate::execute(args),
        Commands::List(args) => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            cli::list::execute(args, config)
        }
        Commands::Schema(args) => cli::schema::execute(args),
    }
}
