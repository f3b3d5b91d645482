//! Time source for snapshot labels

use chrono::{DateTime, Local, NaiveDateTime};

/// strftime pattern of snapshot file names, e.g. `07-Mar-24_14-05-09`
pub const SNAPSHOT_LABEL_FORMAT: &str = "%d-%b-%y_%H-%M-%S";

/// Supplies the wall-clock time used to name snapshots
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now: DateTime<Local> = Local::now();
        now.naive_local()
    }
}

/// Format a moment as a snapshot label
pub fn snapshot_label(moment: &NaiveDateTime) -> String {
    moment.format(SNAPSHOT_LABEL_FORMAT).to_string()
}

/// Parse a snapshot label back into the moment it names
pub fn parse_snapshot_label(label: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(label, SNAPSHOT_LABEL_FORMAT).ok()
}
