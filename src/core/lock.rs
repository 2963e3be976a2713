//! Host-local exclusive lock around the read-modify-write cycle
//!
//! An advisory `fs2` exclusive lock on a lock file next to the snapshots.
//! The kernel drops it when the holder exits, so a killed process never
//! leaves the store locked. The file itself stays in place; its content
//! (`<pid> <unix-seconds>`) is only for diagnostics.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::AppError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lock location and timing
#[derive(Debug, Clone)]
pub(crate) struct LockSettings {
    pub(crate) path: PathBuf,
    pub(crate) timeout: Duration,
}

impl LockSettings {
    pub(crate) fn new(path: PathBuf, timeout: Duration) -> Self {
        Self { path, timeout }
    }
}

/// Held lock; released when dropped (and by the kernel if the process dies)
#[derive(Debug)]
pub(crate) struct LockGuard {
    path: PathBuf,
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!("Released lock {}", self.path.display()),
            Err(e) => warn!("Failed to release lock {}: {e}", self.path.display()),
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Holder recorded in the lock file, for timeout diagnostics
fn recorded_holder(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let pid = content.split_whitespace().next()?;
    Some(pid.to_string())
}

fn open_lock_file(path: &Path) -> Result<File, AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Config(format!(
                "cannot create lock directory {}: {e}",
                parent.display()
            ))
        })?;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| AppError::Config(format!("cannot open lock file {}: {e}", path.display())))
}

/// Record the holder; a failure here does not give up the lock
fn record_holder(file: &mut File) {
    let result = file
        .set_len(0)
        .and_then(|()| write!(file, "{} {}", std::process::id(), now_secs()))
        .and_then(|()| file.flush());
    if let Err(e) = result {
        debug!("Could not record lock holder: {e}");
    }
}

/// Acquire the lock, polling until `settings.timeout` elapses
pub(crate) fn acquire(settings: &LockSettings) -> Result<LockGuard, AppError> {
    let path = &settings.path;
    let deadline = Instant::now().checked_add(settings.timeout).ok_or_else(|| {
        AppError::Config(format!(
            "lock timeout of {:.0}s is too large",
            settings.timeout.as_secs_f64()
        ))
    })?;
    let mut file = open_lock_file(path)?;

    loop {
        match file.try_lock_exclusive() {
            Ok(()) => {
                record_holder(&mut file);
                debug!("Acquired lock {}", path.display());
                return Ok(LockGuard {
                    path: path.clone(),
                    file,
                });
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {}
            Err(e) => {
                return Err(AppError::Config(format!(
                    "cannot lock {}: {e}",
                    path.display()
                )));
            }
        }

        if Instant::now() >= deadline {
            if let Some(pid) = recorded_holder(path) {
                debug!("Lock {} last taken by pid {pid}", path.display());
            }
            return Err(AppError::LockTimeout {
                path: path.clone(),
                timeout: settings.timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Run `f` while holding the lock; released on every exit path
pub(crate) fn with_lock<T>(
    settings: &LockSettings,
    f: impl FnOnce() -> Result<T, AppError>,
) -> Result<T, AppError> {
    let _guard = acquire(settings)?;
    f()
}
