//! timemachine - periodic file backup
//!
//! Main binary entry point for the command-line interface.

use clap::Parser;
use timemachine::cli::{self, Cli, Commands};
use timemachine::logging::{default_level, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(default_level(cli.verbose, cli.quiet), cli.log_format)?;

    let settings = cli.settings()?;

    match cli.command {
        None => cli::backup::run(Default::default(), &settings)?,
        Some(Commands::Backup(args)) => cli::backup::run(args, &settings)?,
        Some(Commands::Add(args)) => cli::watch::add(args, &settings)?,
        Some(Commands::Remove(args)) => cli::watch::remove(args, &settings)?,
        Some(Commands::List) => cli::watch::list(&settings)?,
        Some(Commands::Standalone(_)) => cli::standalone::run(&settings).await?,
        Some(Commands::History(args)) => cli::history::run(args, &settings)?,
    }

    Ok(())
}
