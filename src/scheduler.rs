//! Standalone mode: run a backup pass at a fixed interval.
//!
//! Passes never overlap. Each one runs on the blocking pool and is awaited
//! before the next tick is taken; ticks missed while a long pass was running
//! are dropped instead of fired in a burst.

use crate::backup::{BackupEngine, PassSummary};
use crate::watchlist::WatchList;
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Periodic backup runner
pub struct Standalone {
    engine: Arc<BackupEngine>,
    watch_list: WatchList,
    interval: Duration,
    max_passes: Option<usize>,
}

impl Standalone {
    pub fn new(engine: Arc<BackupEngine>, watch_list: WatchList, interval: Duration) -> Self {
        Self {
            engine,
            watch_list,
            interval,
            max_passes: None,
        }
    }

    /// Stop after `passes` passes instead of running until interrupted
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// Run until Ctrl-C. Returns the number of passes completed.
    pub async fn run(&self) -> Result<usize> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves. A pass already in progress is always
    /// allowed to finish.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<usize>
    where
        F: Future<Output = ()>,
    {
        if self.interval.is_zero() {
            return Err(Error::Scheduling {
                reason: "Backup interval must be greater than zero".to_string(),
            });
        }

        info!(
            "Scheduling a backup run every {} seconds ...",
            self.interval.as_secs_f64()
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut passes = 0usize;
        loop {
            if self.max_passes.is_some_and(|max| passes >= max) {
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, leaving standalone mode");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_pass().await {
                        Ok(summary) => info!(
                            "Backup complete ... ({} backed up, {} unchanged, {} skipped, {} failed)",
                            summary.backed_up, summary.unchanged, summary.skipped, summary.failed
                        ),
                        Err(e) => error!("Backup pass failed: {}", e),
                    }
                    passes += 1;
                }
            }
        }

        Ok(passes)
    }

    /// Read the watch list and back up everything on it
    pub async fn run_pass(&self) -> Result<PassSummary> {
        info!("Starting backup ...");
        let files = self.watch_list.list_files()?;
        if files.is_empty() {
            warn!(
                "Watch list {} does not contain any files, nothing to do.",
                self.watch_list.path().display()
            );
        }

        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.backup_all(files))
            .await
            .map_err(|e| Error::Scheduling {
                reason: format!("Backup pass did not complete: {}", e),
            })
    }
}
