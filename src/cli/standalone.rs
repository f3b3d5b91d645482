//! Standalone (daemon) mode command.

use crate::backup::BackupEngine;
use crate::config::Settings;
use crate::scheduler::Standalone;
use crate::watchlist::WatchList;
use crate::Result;
use clap::Args;
use std::sync::Arc;
use tracing::info;

/// Arguments for the standalone command
#[derive(Args, Debug)]
pub struct StandaloneArgs {
    /// Seconds between backup passes (default: 60)
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,
}

/// Back up the watch list every interval until interrupted
pub async fn run(settings: &Settings) -> Result<()> {
    let watch_list = WatchList::open(&settings.watch_list)?;
    let engine = Arc::new(BackupEngine::new(&settings.backup_root));

    let passes = Standalone::new(engine, watch_list, settings.interval())
        .run()
        .await?;

    info!("Standalone mode stopped after {} passes", passes);
    Ok(())
}
