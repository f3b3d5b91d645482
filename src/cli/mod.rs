//! Command-line interface for timemachine.
//!
//! Global flags locate the watch list and the backup root; the subcommand
//! picks what to do with them. Running without a subcommand performs a
//! single backup pass.

use crate::config::{Overrides, Settings};
use crate::logging::LogFormat;
use crate::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod backup;
pub mod history;
pub mod standalone;
pub mod watch;

/// timemachine - back up watched files whenever their content changes
#[derive(Parser, Debug)]
#[command(name = "timemachine")]
#[command(about = "Back up watched files into timestamped snapshots when their content changes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Location of the watch-list file
    #[arg(long, global = true, value_name = "FILE")]
    pub config_location: Option<PathBuf>,

    /// Location of the backup directory
    #[arg(long, global = true, value_name = "DIR", env = "TIMEMACHINE_BACKUP_ROOT")]
    pub backup_location: Option<PathBuf>,

    /// Optional TOML settings file
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Log debug output
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single backup pass over the watch list (default)
    Backup(backup::BackupArgs),
    /// Add a file to the list of files being watched
    Add(watch::AddArgs),
    /// Remove a file from the list of files being watched
    Remove(watch::RemoveArgs),
    /// List files being watched
    List,
    /// Keep running, backing up every interval
    Standalone(standalone::StandaloneArgs),
    /// Show the snapshots taken of a watched file
    History(history::HistoryArgs),
}

impl Cli {
    /// Resolve settings from the optional settings file and the flags
    pub fn settings(&self) -> Result<Settings> {
        let interval_secs = match &self.command {
            Some(Commands::Standalone(args)) => args.interval,
            _ => None,
        };

        let settings = Settings::load(self.settings.as_deref())?.apply(Overrides {
            watch_list: self.config_location.clone(),
            backup_root: self.backup_location.clone(),
            interval_secs,
        });
        settings.validate()?;
        Ok(settings)
    }
}
