//! Single backup pass command.

use crate::backup::{BackupEngine, PassSummary};
use crate::config::Settings;
use crate::watchlist::WatchList;
use crate::Result;
use clap::Args;
use tracing::{info, warn};

/// Arguments for the backup command
#[derive(Args, Debug, Default)]
pub struct BackupArgs {
    /// Print a JSON summary of the pass to stdout
    #[arg(long)]
    pub json: bool,
}

/// Run one pass over the watch list
pub fn run(args: BackupArgs, settings: &Settings) -> Result<()> {
    let summary = run_pass(settings)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

/// Back up every watched file once and report what happened
pub fn run_pass(settings: &Settings) -> Result<PassSummary> {
    let watch_list = WatchList::open(&settings.watch_list)?;
    let files = watch_list.list_files()?;

    if files.is_empty() {
        warn!(
            "Config file {} does not contain any files, nothing to do.",
            settings.watch_list.display()
        );
        return Ok(PassSummary::default());
    }

    let engine = BackupEngine::new(&settings.backup_root);
    let summary = engine.backup_all(&files);

    info!(
        "Backup complete: {} backed up, {} unchanged, {} skipped, {} failed",
        summary.backed_up, summary.unchanged, summary.skipped, summary.failed
    );
    Ok(summary)
}
