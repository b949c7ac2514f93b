mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod table;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, &cli.log_file)?;

    info!("lambar v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Optimize(args) => commands::optimize::run(args),
        Commands::Batch(args) => commands::batch::run(args),
    }
}
