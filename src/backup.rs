//! Backup engine: change detection and timestamped snapshots
//!
//! Every watched file gets its own snapshot directory, found by mirroring the
//! file's absolute path underneath the backup root:
//!
//! ```text
//! <backup_root>/<absolute-path-of-watched-file>/
//!     latest                  byte-identical copy of the newest snapshot
//!     <DD-Mon-YY_HH-MM-SS>    one file per detected change
//! ```
//!
//! A file is copied only when its SHA-1 differs from `latest`, so repeated
//! passes over unchanged files write nothing.

use crate::clock::{parse_snapshot_label, snapshot_label, Clock, SystemClock};
use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::hash::hash_file;
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf, Prefix};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Name of the mutable pointer file inside every snapshot directory
pub const LATEST_FILE_NAME: &str = "latest";

/// What happened to one watch-list entry during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackupOutcome {
    /// Empty or whitespace-only entry
    Blank,
    /// Path is not an existing regular file
    Missing,
    /// Path is not absolute
    Relative,
    /// Content matches `latest`, nothing written
    Unchanged,
    /// A new snapshot was written and `latest` updated
    BackedUp { snapshot: PathBuf },
    /// An IO error interrupted this entry; the pass carried on
    Failed { reason: String },
}

/// Outcome of one entry, keyed by the entry as it appeared in the watch list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathReport {
    pub path: String,
    pub outcome: BackupOutcome,
}

/// Result of a whole backup pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub backed_up: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub entries: Vec<PathReport>,
}

impl PassSummary {
    fn record(&mut self, path: &str, outcome: BackupOutcome) {
        match outcome {
            BackupOutcome::BackedUp { .. } => self.backed_up += 1,
            BackupOutcome::Unchanged => self.unchanged += 1,
            BackupOutcome::Failed { .. } => self.failed += 1,
            BackupOutcome::Blank | BackupOutcome::Missing | BackupOutcome::Relative => {
                self.skipped += 1
            }
        }
        self.entries.push(PathReport {
            path: path.to_string(),
            outcome,
        });
    }
}

/// A historical snapshot of one watched file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    pub path: PathBuf,
    pub taken_at: NaiveDateTime,
    /// Collision suffix; 0 for the first snapshot taken within a second
    pub sequence: u32,
}

/// Backup engine for watched files
pub struct BackupEngine {
    backup_root: PathBuf,
    sink: Arc<dyn DiagnosticsSink>,
    clock: Arc<dyn Clock>,
}

impl BackupEngine {
    /// Create an engine writing under `backup_root`, logging through `tracing`
    pub fn new<P: AsRef<Path>>(backup_root: P) -> Self {
        Self {
            backup_root: backup_root.as_ref().to_path_buf(),
            sink: Arc::new(TracingSink),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the diagnostics sink
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the clock used to name snapshots
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Back up every entry in order. Failures are reported per entry and
    /// never stop the pass.
    pub fn backup_all<I, S>(&self, paths: I) -> PassSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = PassSummary::default();
        for path in paths {
            let path = path.as_ref();
            let outcome = self.backup_one(path);
            summary.record(path, outcome);
        }
        summary
    }

    /// Back up a single watch-list entry
    pub fn backup_one(&self, entry: &str) -> BackupOutcome {
        if entry.trim().is_empty() {
            return BackupOutcome::Blank;
        }

        let path = Path::new(entry);
        if !path.is_file() {
            self.sink.warn(&format!(
                "{} does not exist! Please remove from file list. Ignoring and continuing.",
                entry
            ));
            return BackupOutcome::Missing;
        }

        if !path.is_absolute() {
            self.sink.warn(&format!(
                "{} is a relative path, and is not supported! Please remove from file list. Ignoring and continuing.",
                entry
            ));
            return BackupOutcome::Relative;
        }

        match self.backup_file(path) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.sink.warn(&format!(
                    "Failed to back up {}: {}. Ignoring and continuing.",
                    entry, e
                ));
                BackupOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Snapshot directory of a watched file under this engine's root
    pub fn snapshot_dir<P: AsRef<Path>>(&self, watched: P) -> PathBuf {
        snapshot_dir(&self.backup_root, watched.as_ref())
    }

    /// Timestamped snapshots of a watched file, oldest first
    pub fn history(&self, entry: &str) -> Result<Vec<SnapshotEntry>> {
        let path = Path::new(entry);
        if !path.is_absolute() {
            return Err(Error::RelativePath {
                path: entry.to_string(),
            });
        }

        let dir = self.snapshot_dir(path);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for dir_entry in fs::read_dir(&dir)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name == LATEST_FILE_NAME {
                continue;
            }
            if let Some((taken_at, sequence)) = parse_snapshot_name(name) {
                snapshots.push(SnapshotEntry {
                    path: dir_entry.path(),
                    taken_at,
                    sequence,
                });
            }
        }

        snapshots.sort_by(|a, b| (a.taken_at, a.sequence).cmp(&(b.taken_at, b.sequence)));
        Ok(snapshots)
    }

    /// Compare against `latest` and copy when the content changed
    fn backup_file(&self, path: &Path) -> Result<BackupOutcome> {
        let dir = self.snapshot_dir(path);
        let prev_latest = dir.join(LATEST_FILE_NAME);

        if prev_latest.is_file() {
            let prev_hash = hash_file(&prev_latest)?;
            let new_hash = hash_file(path)?;
            if prev_hash == new_hash {
                self.sink.info(&format!(
                    "{} is unchanged, not backing up ...",
                    path.display()
                ));
                return Ok(BackupOutcome::Unchanged);
            }
        } else {
            fs::create_dir_all(&dir)?;
        }

        let snapshot = self.copy_timestamped(path, &dir)?;
        Ok(BackupOutcome::BackedUp { snapshot })
    }

    /// Write a new timestamped snapshot, then refresh `latest` from it
    fn copy_timestamped(&self, source: &Path, dir: &Path) -> Result<PathBuf> {
        let label = snapshot_label(&self.clock.now());
        let target = unique_snapshot_path(dir, &label);

        fs::copy(source, &target)?;
        if let Err(e) = replace_latest(&target, dir) {
            // No snapshot may outlive a failed `latest` update
            let _ = fs::remove_file(&target);
            return Err(e);
        }

        self.sink.info(&format!(
            "Backed up {} into {}",
            source.display(),
            target.display()
        ));
        Ok(target)
    }
}

/// Point `latest` at the content of `snapshot`.
///
/// The copy goes to a fresh temp file in the same directory which is then
/// renamed over `latest`, so permission bits copied from a read-only source
/// never block the next update.
fn replace_latest(snapshot: &Path, dir: &Path) -> Result<()> {
    let mut staged = NamedTempFile::new_in(dir)?;
    let mut source = File::open(snapshot)?;
    io::copy(&mut source, staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    staged
        .persist(dir.join(LATEST_FILE_NAME))
        .map_err(|e| e.error)?;
    Ok(())
}

/// Mirror `watched` underneath `backup_root`.
///
/// The root and any drive prefix are folded into plain path segments and
/// `..` is resolved lexically, so the result always stays inside the root.
pub fn snapshot_dir(backup_root: &Path, watched: &Path) -> PathBuf {
    let mut dir = backup_root.to_path_buf();
    let mut depth = 0usize;

    for component in watched.components() {
        match component {
            Component::Prefix(prefix) => dir.extend(prefix_segments(prefix.kind())),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    dir.pop();
                    depth -= 1;
                }
            }
            Component::Normal(part) => {
                dir.push(part);
                depth += 1;
            }
        }
    }

    dir
}

/// Drive letters map to a single segment; every other prefix kind gets its
/// own multi-letter tag followed by its parts, so no two kinds share a path.
fn prefix_segments(prefix: Prefix<'_>) -> Vec<String> {
    match prefix {
        Prefix::Disk(letter) | Prefix::VerbatimDisk(letter) => vec![(letter as char).to_string()],
        Prefix::UNC(server, share) | Prefix::VerbatimUNC(server, share) => vec![
            "UNC".to_string(),
            server.to_string_lossy().into_owned(),
            share.to_string_lossy().into_owned(),
        ],
        Prefix::Verbatim(name) => vec![
            "VERBATIM".to_string(),
            name.to_string_lossy().into_owned(),
        ],
        Prefix::DeviceNS(name) => vec![
            "DEVICE".to_string(),
            name.to_string_lossy().into_owned(),
        ],
    }
}

/// First free name for `label` in `dir`: `label`, then `label.1`, `label.2`, ...
fn unique_snapshot_path(dir: &Path, label: &str) -> PathBuf {
    let candidate = dir.join(label);
    if !candidate.exists() {
        return candidate;
    }

    let mut sequence = 1u32;
    loop {
        let candidate = dir.join(format!("{}.{}", label, sequence));
        if !candidate.exists() {
            return candidate;
        }
        sequence += 1;
    }
}

fn parse_snapshot_name(name: &str) -> Option<(NaiveDateTime, u32)> {
    match name.split_once('.') {
        Some((label, suffix)) => {
            let sequence = suffix.parse::<u32>().ok()?;
            Some((parse_snapshot_label(label)?, sequence))
        }
        None => Some((parse_snapshot_label(name)?, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CapturingSink;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicI64, Ordering};
    use tempfile::TempDir;

    /// Clock that advances one second per reading
    struct SteppingClock {
        start: NaiveDateTime,
        ticks: AtomicI64,
    }

    impl SteppingClock {
        fn new() -> Self {
            Self {
                start: NaiveDate::from_ymd_opt(2024, 3, 7)
                    .unwrap()
                    .and_hms_opt(14, 5, 9)
                    .unwrap(),
                ticks: AtomicI64::new(0),
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> NaiveDateTime {
            self.start + Duration::seconds(self.ticks.fetch_add(1, Ordering::SeqCst))
        }
    }

    /// Clock frozen at a single instant
    struct FrozenClock(NaiveDateTime);

    impl Clock for FrozenClock {
        fn now(&self) -> NaiveDateTime {
            self.0
        }
    }

    struct Fixture {
        temp_dir: TempDir,
        sink: Arc<CapturingSink>,
        engine: BackupEngine,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_clock(Arc::new(SteppingClock::new()))
        }

        fn with_clock(clock: Arc<dyn Clock>) -> Self {
            let temp_dir = TempDir::new().unwrap();
            let sink = Arc::new(CapturingSink::new());
            let engine = BackupEngine::new(temp_dir.path().join("backup"))
                .with_sink(sink.clone())
                .with_clock(clock);
            Self {
                temp_dir,
                sink,
                engine,
            }
        }

        fn write(&self, relative: &str, content: &[u8]) -> String {
            let path = self.temp_dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path.to_string_lossy().into_owned()
        }

        fn source(&self, relative: &str) -> String {
            self.temp_dir.path().join(relative).to_string_lossy().into_owned()
        }
    }

    fn dir_file_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_first_backup_creates_snapshot_and_latest() -> Result<()> {
        let fx = Fixture::new();
        let file = fx.write("data/a.txt", b"hello");

        let outcome = fx.engine.backup_one(&file);

        let dir = fx.engine.snapshot_dir(&file);
        let snapshot = dir.join("07-Mar-24_14-05-09");
        assert_eq!(outcome, BackupOutcome::BackedUp { snapshot: snapshot.clone() });
        assert_eq!(fs::read(&snapshot)?, b"hello");
        assert_eq!(fs::read(dir.join(LATEST_FILE_NAME))?, b"hello");
        assert_eq!(dir_file_count(&dir), 2);
        assert!(fx.sink.warnings().is_empty());
        Ok(())
    }

    #[test]
    fn test_unchanged_file_is_not_copied_again() -> Result<()> {
        let fx = Fixture::new();
        let file = fx.write("data/a.txt", b"hello");

        fx.engine.backup_one(&file);
        let outcome = fx.engine.backup_one(&file);

        let dir = fx.engine.snapshot_dir(&file);
        assert_eq!(outcome, BackupOutcome::Unchanged);
        assert_eq!(dir_file_count(&dir), 2);
        assert_eq!(
            hash_file(dir.join(LATEST_FILE_NAME))?,
            hash_file(&file)?
        );
        let infos = fx.sink.messages_at(tracing::Level::INFO);
        assert!(infos.last().unwrap().contains("is unchanged, not backing up"));
        Ok(())
    }

    #[test]
    fn test_changed_file_gets_new_snapshot() -> Result<()> {
        let fx = Fixture::new();
        let file = fx.write("data/a.txt", b"v1");

        fx.engine.backup_one(&file);
        fs::write(&file, b"v2")?;
        fx.engine.backup_one(&file);

        let history = fx.engine.history(&file)?;
        let contents: Vec<Vec<u8>> = history
            .iter()
            .map(|s| fs::read(&s.path).unwrap())
            .collect();
        assert_eq!(contents, vec![b"v1".to_vec(), b"v2".to_vec()]);
        assert!(history[0].taken_at < history[1].taken_at);

        let latest = fx.engine.snapshot_dir(&file).join(LATEST_FILE_NAME);
        assert_eq!(fs::read(latest)?, b"v2");
        Ok(())
    }

    #[test]
    fn test_same_second_snapshots_do_not_overwrite() -> Result<()> {
        let moment = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let fx = Fixture::with_clock(Arc::new(FrozenClock(moment)));
        let file = fx.write("notes.txt", b"one");

        fx.engine.backup_one(&file);
        fs::write(&file, b"two")?;
        fx.engine.backup_one(&file);
        fs::write(&file, b"three")?;
        fx.engine.backup_one(&file);

        let dir = fx.engine.snapshot_dir(&file);
        assert_eq!(fs::read(dir.join("02-Jan-24_03-04-05"))?, b"one");
        assert_eq!(fs::read(dir.join("02-Jan-24_03-04-05.1"))?, b"two");
        assert_eq!(fs::read(dir.join("02-Jan-24_03-04-05.2"))?, b"three");

        let sequences: Vec<u32> = fx.engine.history(&file)?.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_missing_file_warns_once_and_writes_nothing() {
        let fx = Fixture::new();
        let missing = fx.source("data/missing.txt");

        let outcome = fx.engine.backup_one(&missing);

        assert_eq!(outcome, BackupOutcome::Missing);
        assert_eq!(fx.sink.warnings().len(), 1);
        assert!(fx.sink.warnings()[0].contains("does not exist"));
        assert!(!fx.engine.backup_root().exists());
    }

    #[test]
    fn test_relative_path_is_rejected() {
        let fx = Fixture::new();

        // Resolved against the package root when tests run
        let outcome = fx.engine.backup_one("Cargo.toml");

        assert_eq!(outcome, BackupOutcome::Relative);
        assert_eq!(fx.sink.warnings().len(), 1);
        assert!(fx.sink.warnings()[0].contains("relative path"));
        assert!(!fx.engine.backup_root().exists());
    }

    #[test]
    fn test_blank_entries_are_silent() {
        let fx = Fixture::new();

        let summary = fx.engine.backup_all(["", "   ", "\t"]);

        assert_eq!(summary.skipped, 3);
        assert!(fx.sink.entries().is_empty());
        assert!(!fx.engine.backup_root().exists());
    }

    #[test]
    fn test_pass_with_missing_file_backs_up_the_rest() -> Result<()> {
        let fx = Fixture::new();
        let present = fx.write("data/a.txt", b"hello");
        let missing = fx.source("data/missing.txt");

        let summary = fx.engine.backup_all(vec![present.clone(), missing.clone()]);

        assert_eq!(summary.backed_up, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.entries[1].outcome, BackupOutcome::Missing);

        let dir = fx.engine.snapshot_dir(&present);
        assert_eq!(fs::read(dir.join(LATEST_FILE_NAME))?, b"hello");
        assert!(!fx.engine.snapshot_dir(&missing).exists());
        assert_eq!(fx.sink.warnings().len(), 1);
        Ok(())
    }

    #[test]
    fn test_io_failure_does_not_abort_pass() -> Result<()> {
        let fx = Fixture::new();
        let broken = fx.write("broken.txt", b"data");
        let fine = fx.write("fine.txt", b"data");

        // A directory squatting on `latest` makes the pointer update fail
        fs::create_dir_all(fx.engine.snapshot_dir(&broken).join(LATEST_FILE_NAME))?;

        let summary = fx.engine.backup_all([broken.as_str(), fine.as_str()]);

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.backed_up, 1);
        assert!(matches!(summary.entries[0].outcome, BackupOutcome::Failed { .. }));
        assert_eq!(fx.sink.warnings().len(), 1);
        assert!(fx.sink.warnings()[0].contains("Failed to back up"));
        assert!(fx.engine.history(&broken)?.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_source_keeps_latest_current() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        let file = fx.write("keys/id.key", b"A");
        fs::set_permissions(&file, fs::Permissions::from_mode(0o400))?;

        assert!(matches!(fx.engine.backup_one(&file), BackupOutcome::BackedUp { .. }));

        fs::set_permissions(&file, fs::Permissions::from_mode(0o600))?;
        fs::write(&file, b"B")?;
        fs::set_permissions(&file, fs::Permissions::from_mode(0o400))?;

        assert!(matches!(fx.engine.backup_one(&file), BackupOutcome::BackedUp { .. }));
        assert_eq!(fx.engine.backup_one(&file), BackupOutcome::Unchanged);

        let latest = fx.engine.snapshot_dir(&file).join(LATEST_FILE_NAME);
        assert_eq!(fs::read(latest)?, b"B");
        let contents: Vec<Vec<u8>> = fx
            .engine
            .history(&file)?
            .iter()
            .map(|s| fs::read(&s.path).unwrap())
            .collect();
        assert_eq!(contents, vec![b"A".to_vec(), b"B".to_vec()]);
        assert!(fx.sink.warnings().is_empty());
        Ok(())
    }

    #[test]
    fn test_prefix_kinds_never_share_segments() {
        use std::ffi::OsStr;

        let prefixes = [
            Prefix::Disk(b'C'),
            Prefix::DeviceNS(OsStr::new("C")),
            Prefix::Verbatim(OsStr::new("C")),
            Prefix::UNC(OsStr::new("s"), OsStr::new("sh")),
            Prefix::Verbatim(OsStr::new("UNC_s_sh")),
            Prefix::UNC(OsStr::new("a_b"), OsStr::new("c")),
            Prefix::UNC(OsStr::new("a"), OsStr::new("b_c")),
        ];

        let mut segments: Vec<Vec<String>> = prefixes.iter().map(|p| prefix_segments(*p)).collect();
        segments.sort();
        segments.dedup();
        assert_eq!(segments.len(), prefixes.len());

        // Same volume spelled two ways still lands in one place
        assert_eq!(
            prefix_segments(Prefix::Disk(b'D')),
            prefix_segments(Prefix::VerbatimDisk(b'D'))
        );
    }

    #[test]
    fn test_duplicate_entries_are_tolerated() {
        let fx = Fixture::new();
        let file = fx.write("dup.txt", b"same");

        let summary = fx.engine.backup_all([file.as_str(), file.as_str()]);

        assert_eq!(summary.backed_up, 1);
        assert_eq!(summary.unchanged, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_snapshot_dir_mirrors_absolute_path() {
        let root = Path::new("/backup");

        assert_eq!(
            snapshot_dir(root, Path::new("/data/a.txt")),
            PathBuf::from("/backup/data/a.txt")
        );
        assert_eq!(
            snapshot_dir(root, Path::new("/data/./sub/../a.txt")),
            PathBuf::from("/backup/data/a.txt")
        );
        assert_eq!(
            snapshot_dir(root, Path::new("/../../etc/passwd")),
            PathBuf::from("/backup/etc/passwd")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_distinct_paths_get_distinct_directories() {
        let root = Path::new("/backup");
        let paths = ["/data/a.txt", "/data/a.txt.bak", "/data/a", "/other/data/a.txt", "/a.txt"];

        let mut dirs: Vec<PathBuf> = paths
            .iter()
            .map(|p| snapshot_dir(root, Path::new(p)))
            .collect();
        dirs.sort();
        dirs.dedup();
        assert_eq!(dirs.len(), paths.len());
    }

    #[test]
    fn test_history_of_unknown_file_is_empty() -> Result<()> {
        let fx = Fixture::new();
        assert!(fx.engine.history(&fx.source("never.txt"))?.is_empty());
        assert!(matches!(
            fx.engine.history("relative.txt"),
            Err(Error::RelativePath { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_parse_snapshot_name() {
        assert_eq!(parse_snapshot_name("latest"), None);
        assert_eq!(parse_snapshot_name("07-Mar-24_14-05-09.x"), None);
        assert_eq!(parse_snapshot_name("07-Mar-24_14-05-09.3").map(|(_, s)| s), Some(3));
        assert_eq!(parse_snapshot_name("07-Mar-24_14-05-09").map(|(_, s)| s), Some(0));
    }

    #[test]
    fn test_summary_serializes_outcomes() -> Result<()> {
        let mut summary = PassSummary::default();
        summary.record("/a", BackupOutcome::Unchanged);

        let json = serde_json::to_value(&summary)?;
        assert_eq!(json["unchanged"], 1);
        assert_eq!(json["entries"][0]["outcome"]["status"], "unchanged");
        Ok(())
    }
}
