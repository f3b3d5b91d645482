//! # timemachine
//!
//! Periodic backup of individual files with content-hash change detection.
//!
//! ## Features
//!
//! - **Backup Engine**: mirrors each watched file's absolute path under a backup root
//! - **Change Detection**: SHA-1 comparison against the `latest` snapshot, so unchanged files are never copied
//! - **Watch List**: a plain newline-delimited file of absolute paths
//! - **Standalone Mode**: re-runs a pass every 60 seconds, never overlapping passes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use timemachine::backup::BackupEngine;
//!
//! let engine = BackupEngine::new("/var/backups/timemachine");
//! let summary = engine.backup_all(["/etc/hosts", "/home/me/notes.txt"]);
//! println!("{} files backed up", summary.backed_up);
//! ```

pub mod backup;
pub mod cli;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hash;
pub mod logging;
pub mod scheduler;
pub mod watchlist;

// Re-export commonly used types
pub use backup::{BackupEngine, BackupOutcome, PassSummary};
pub use diagnostics::{CapturingSink, DiagnosticsSink, TracingSink};
pub use error::{Error, Result};
pub use watchlist::WatchList;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
