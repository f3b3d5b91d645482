//! Snapshot history of a single watched file.

use crate::backup::BackupEngine;
use crate::config::Settings;
use crate::Result;
use clap::Args;
use tracing::info;

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Absolute path of the watched file
    pub file: String,
}

pub fn run(args: HistoryArgs, settings: &Settings) -> Result<()> {
    let engine = BackupEngine::new(&settings.backup_root);
    let snapshots = engine.history(&args.file)?;

    if snapshots.is_empty() {
        info!("No snapshots of {} under {}", args.file, settings.backup_root.display());
        return Ok(());
    }

    for snapshot in snapshots {
        println!(
            "{}  {}",
            snapshot.taken_at.format("%Y-%m-%d %H:%M:%S"),
            snapshot.path.display()
        );
    }
    Ok(())
}
