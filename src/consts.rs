/// Canonical day key, also the snapshot filename stem: "2026-02-01"
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Model name recorded when a session does not report one
pub(crate) const UNKNOWN: &str = "unknown";

/// Extension of snapshot files inside the data directory
pub(crate) const SNAPSHOT_EXT: &str = "json";

/// Lock marker file name when no explicit lock path is configured
pub(crate) const LOCK_FILE_NAME: &str = ".sessionstats.lock";
