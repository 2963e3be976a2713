use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Exit status for transient failures worth retrying (EX_TEMPFAIL)
pub(crate) const EXIT_TEMPFAIL: i32 = 75;
/// Exit status for malformed input data (EX_DATAERR)
pub(crate) const EXIT_DATAERR: i32 = 65;
/// Exit status when there is nothing to account for (EX_NOINPUT)
pub(crate) const EXIT_NOINPUT: i32 = 66;
/// Exit status for snapshot persistence failures (EX_IOERR)
pub(crate) const EXIT_IOERR: i32 = 74;
/// Exit status for configuration problems (EX_CONFIG)
pub(crate) const EXIT_CONFIG: i32 = 78;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Session source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Session source returned malformed data: {reason}")]
    SourceMalformed { reason: String },

    #[error("No active sessions reported by the session source")]
    NoActiveSessions,

    #[error("Unknown model \"{model}\" (not in pricing table)")]
    UnknownModel { model: String },

    #[error("Invalid {field} for session \"{key}\": {value}")]
    InvalidTokenCount {
        key: String,
        field: &'static str,
        value: String,
    },

    #[error("Timed out after {:.1}s waiting for lock {}", timeout.as_secs_f64(), path.display())]
    LockTimeout { path: PathBuf, timeout: Duration },

    #[error("Failed to persist snapshot {}: {reason}", path.display())]
    PersistFailure { path: PathBuf, reason: String },

    #[error("Snapshot {} did not verify after write: {reason}", path.display())]
    PersistVerificationFailure { path: PathBuf, reason: String },

    #[error("Invalid date \"{input}\" (expected YYYYMMDD or YYYY-MM-DD)")]
    InvalidDate { input: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Pricing(#[from] PricingError),
}

impl AppError {
    /// Process exit status for this error class
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            AppError::SourceUnavailable { .. } | AppError::LockTimeout { .. } => EXIT_TEMPFAIL,
            AppError::SourceMalformed { .. } | AppError::InvalidTokenCount { .. } => EXIT_DATAERR,
            AppError::NoActiveSessions => EXIT_NOINPUT,
            AppError::PersistFailure { .. } | AppError::PersistVerificationFailure { .. } => {
                EXIT_IOERR
            }
            AppError::UnknownModel { .. }
            | AppError::InvalidDate { .. }
            | AppError::Config(_)
            | AppError::Pricing(_) => EXIT_CONFIG,
        }
    }

    /// Whether re-running the same invocation later may succeed
    pub(crate) fn is_retryable(&self) -> bool {
        self.exit_code() == EXIT_TEMPFAIL
    }

    /// Suggested remedy shown below the error message
    pub(crate) fn hint(&self) -> Option<&'static str> {
        match self {
            AppError::SourceUnavailable { .. } => Some(
                "Check that the assistant platform is installed and running, or point --source-command/--source-url at it.",
            ),
            AppError::SourceMalformed { .. } => {
                Some("The source must return {\"sessions\": [{\"key\", \"model\", \"inputTokens\", \"outputTokens\"}]}.")
            }
            AppError::NoActiveSessions => {
                Some("Start a session first; pricing needs at least one session to pick a model.")
            }
            AppError::UnknownModel { .. } => Some(
                "Update the pricing table (--pricing-file or `pricing_file` in config) with this model's rates.",
            ),
            AppError::LockTimeout { .. } => {
                Some("Another instance is presumed active. Retry later, or raise --lock-timeout.")
            }
            AppError::PersistFailure { .. } | AppError::PersistVerificationFailure { .. } => {
                Some("Check free space and permissions on the snapshot directory (--data-dir).")
            }
            AppError::InvalidTokenCount { .. }
            | AppError::InvalidDate { .. }
            | AppError::Config(_)
            | AppError::Pricing(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum PricingError {
    #[error("Failed to read pricing file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse pricing file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Pricing table is empty")]
    Empty,

    #[error("Duplicate pricing entry for model \"{model}\"")]
    Duplicate { model: String },

    #[error("Invalid rate for model \"{model}\": {rate}")]
    InvalidRate { model: String, rate: f64 },
}
