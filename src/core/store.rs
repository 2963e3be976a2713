//! Day-keyed snapshot storage
//!
//! One pretty-printed JSON file per UTC day, named `<YYYY-MM-DD>.json`.
//! Reads degrade per file: a corrupt day is reported as a warning and left
//! out, it never fails the whole read.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::consts::SNAPSHOT_EXT;
use crate::core::types::{DailySnapshot, SnapshotWarning, TokenTotals};
use crate::error::AppError;
use crate::utils::{format_day, parse_day_key};

/// Outcome of reading a single day
#[derive(Debug)]
pub(crate) enum DayRead {
    Absent,
    Present(DailySnapshot),
    Corrupt(SnapshotWarning),
}

/// Folded totals over a date range
#[derive(Debug, Default)]
pub(crate) struct RangeSum {
    pub(crate) totals: TokenTotals,
    pub(crate) days: usize,
    pub(crate) warnings: Vec<SnapshotWarning>,
}

#[derive(Debug, Clone)]
pub(crate) struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}.{}", format_day(date), SNAPSHOT_EXT))
    }

    pub(crate) fn read_day(&self, date: NaiveDate) -> DayRead {
        read_snapshot_file(&self.day_path(date), date)
    }

    /// Sum all valid days in `[start, end]`, both ends inclusive
    pub(crate) fn sum_range(&self, start: NaiveDate, end: NaiveDate) -> RangeSum {
        let mut sum = RangeSum::default();
        let (snapshots, warnings) = self.scan(start, end);
        for snapshot in &snapshots {
            sum.totals.add(&snapshot.totals());
        }
        sum.days = snapshots.len();
        sum.warnings = warnings;
        debug!(
            "Summed {} day(s) in {}..={} from {}",
            sum.days,
            format_day(start),
            format_day(end),
            self.dir.display()
        );
        sum
    }

    /// Valid snapshots in `[start, end]`, oldest first
    pub(crate) fn list_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> (Vec<DailySnapshot>, Vec<SnapshotWarning>) {
        self.scan(start, end)
    }

    fn scan(&self, start: NaiveDate, end: NaiveDate) -> (Vec<DailySnapshot>, Vec<SnapshotWarning>) {
        let mut snapshots = Vec::new();
        let mut warnings = Vec::new();
        if start > end || !self.dir.is_dir() {
            return (snapshots, warnings);
        }

        let start_key = format_day(start);
        let end_key = format_day(end);

        for (path, stem) in self.day_files() {
            let Some(date) = parse_day_key(&stem) else {
                warnings.push(corrupt(&path, "file name is not a YYYY-MM-DD date"));
                continue;
            };
            // Fixed-width keys compare correctly as strings.
            if stem.as_str() < start_key.as_str() || stem.as_str() > end_key.as_str() {
                continue;
            }
            match read_snapshot_file(&path, date) {
                DayRead::Present(snapshot) => snapshots.push(snapshot),
                DayRead::Corrupt(warning) => warnings.push(warning),
                DayRead::Absent => {}
            }
        }

        snapshots.sort_by_key(|s| s.date);
        for warning in &warnings {
            warn!("{warning}");
        }
        (snapshots, warnings)
    }

    /// All `*.json` files in the store directory with their stems
    fn day_files(&self) -> Vec<(PathBuf, String)> {
        let dir = glob::Pattern::escape(&self.dir.to_string_lossy());
        let Ok(entries) = glob::glob(&format!("{dir}/*.{SNAPSHOT_EXT}")) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .filter_map(|p| {
                let stem = p.file_stem()?.to_str()?.to_string();
                Some((p, stem))
            })
            .collect()
    }

    /// Atomically replace the snapshot for `snapshot.date`, then verify it.
    ///
    /// The content is written to a temp file in the same directory, synced,
    /// re-read and validated, then renamed over the final path. On failure
    /// the temp file is removed and any previous file is left untouched.
    pub(crate) fn write_day(&self, snapshot: &DailySnapshot) -> Result<PathBuf, AppError> {
        let path = self.day_path(snapshot.date);
        let fail = |reason: String| AppError::PersistFailure {
            path: path.clone(),
            reason,
        };

        snapshot.check_consistency().map_err(&fail)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| fail(format!("cannot create {}: {e}", self.dir.display())))?;

        let mut content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| fail(format!("serialization failed: {e}")))?;
        content.push('\n');

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| fail(format!("cannot create temp file: {e}")))?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| fail(format!("cannot write temp file: {e}")))?;

        // Validate what actually landed on disk before it becomes visible.
        let written = fs::read_to_string(tmp.path())
            .map_err(|e| fail(format!("cannot re-read temp file: {e}")))?;
        let parsed: DailySnapshot = serde_json::from_str(&written)
            .map_err(|e| fail(format!("temp file is not a valid snapshot: {e}")))?;
        if !parsed.same_content(snapshot) {
            return Err(fail("temp file content differs from snapshot".to_string()));
        }

        tmp.persist(&path)
            .map_err(|e| fail(format!("rename failed: {}", e.error)))?;
        debug!("Wrote snapshot {}", path.display());

        self.verify_written(snapshot, &path)?;
        Ok(path)
    }

    fn verify_written(&self, expected: &DailySnapshot, path: &Path) -> Result<(), AppError> {
        let fail = |reason: String| AppError::PersistVerificationFailure {
            path: path.to_path_buf(),
            reason,
        };
        match self.read_day(expected.date) {
            DayRead::Present(actual) => {
                if actual.totals() != expected.totals()
                    || actual.total_tokens != expected.total_tokens
                {
                    return Err(fail(format!(
                        "read back {}/{} tokens, expected {}/{}",
                        actual.input_tokens,
                        actual.output_tokens,
                        expected.input_tokens,
                        expected.output_tokens
                    )));
                }
                Ok(())
            }
            DayRead::Absent => Err(fail("file missing after rename".to_string())),
            DayRead::Corrupt(w) => Err(fail(w.reason)),
        }
    }
}

fn corrupt(path: &Path, reason: impl Into<String>) -> SnapshotWarning {
    SnapshotWarning {
        file: path.display().to_string(),
        reason: reason.into(),
    }
}

fn read_snapshot_file(path: &Path, date: NaiveDate) -> DayRead {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return DayRead::Absent,
        Err(e) => return DayRead::Corrupt(corrupt(path, format!("unreadable: {e}"))),
    };
    let snapshot: DailySnapshot = match serde_json::from_str(&content) {
        Ok(s) => s,
        Err(e) => return DayRead::Corrupt(corrupt(path, format!("invalid snapshot: {e}"))),
    };
    if snapshot.date != date {
        return DayRead::Corrupt(corrupt(
            path,
            format!("date field {} does not match file name", snapshot.day_key()),
        ));
    }
    if let Err(reason) = snapshot.check_consistency() {
        return DayRead::Corrupt(corrupt(path, reason));
    }
    DayRead::Present(snapshot)
}
