//! Watch-list management commands: add, remove, list.

use crate::config::Settings;
use crate::watchlist::WatchList;
use crate::{Error, Result};
use clap::Args;
use std::path::Path;
use tracing::info;

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Absolute path of the file to watch
    pub file: String,
}

/// Arguments for the remove command
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Path exactly as it appears in the watch list
    pub file: String,
}

/// Add a file to the watch list after checking it is an existing absolute file
pub fn add(args: AddArgs, settings: &Settings) -> Result<()> {
    validate_watchable(&args.file)?;
    WatchList::open(&settings.watch_list)?.add_file(&args.file)?;
    Ok(())
}

pub fn remove(args: RemoveArgs, settings: &Settings) -> Result<()> {
    WatchList::open(&settings.watch_list)?.remove_file(&args.file)?;
    Ok(())
}

pub fn list(settings: &Settings) -> Result<()> {
    let files = WatchList::open(&settings.watch_list)?.list_files()?;
    info!("The following files are being monitored: ");
    for file in files.iter().filter(|f| !f.trim().is_empty()) {
        println!("{}", file);
    }
    Ok(())
}

/// Only existing regular files given by absolute path may be watched
pub fn validate_watchable(file: &str) -> Result<()> {
    let path = Path::new(file);
    if !path.exists() {
        return Err(Error::MissingFile {
            path: file.to_string(),
        });
    }
    if !path.is_file() {
        return Err(Error::NotAFile {
            path: file.to_string(),
        });
    }
    if !path.is_absolute() {
        return Err(Error::RelativePath {
            path: file.to_string(),
        });
    }
    Ok(())
}
