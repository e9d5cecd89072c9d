//! jamf-auditor - find unscoped and unused objects in Jamf Pro

use clap::Parser;
use log::LevelFilter;

mod audit;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod output;

use cli::{Cli, Commands, GlobalOptions, InspectCommands};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Log to stderr at `warn` unless `RUST_LOG` says otherwise; `--debug` raises
/// this crate to `debug`.
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_module(env!("CARGO_CRATE_NAME"), LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Audit(args) => cli::audit::run(&opts, &args).await,
        Commands::Inspect(InspectCommands::Policy { id }) => cli::inspect::policy(&opts, id).await,
        Commands::Inspect(InspectCommands::Profile { id }) => {
            cli::inspect::profile(&opts, id).await
        }
        Commands::Version => {
            println!("jamf-auditor version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
