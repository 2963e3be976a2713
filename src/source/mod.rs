//! Session source abstraction layer
//!
//! The assistant platform is queried through the `SessionSource` trait so
//! the aggregator never cares whether sessions came from a command, an HTTP
//! endpoint or a file.

pub(crate) mod command;
pub(crate) mod file;
pub(crate) mod http;
pub(crate) mod parser;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::core::Session;
use crate::error::AppError;

pub(crate) use command::CommandSource;
pub(crate) use file::FileSource;
pub(crate) use http::HttpSource;
pub(crate) use parser::parse_sessions;

/// Query interface for current in-flight sessions
pub(crate) trait SessionSource {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Current sessions in source order; an empty list is returned as-is
    fn list_sessions(&self) -> Result<Vec<Session>, AppError>;
}

/// Where sessions come from, resolved from CLI flags and config
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SourceSpec {
    Command { argv: Vec<String>, timeout: Duration },
    Http { url: String, timeout: Duration },
    File { path: PathBuf },
}

/// Box type for dynamic dispatch
pub(crate) type BoxedSource = Box<dyn SessionSource>;

pub(crate) fn build_source(spec: &SourceSpec) -> Result<BoxedSource, AppError> {
    Ok(match spec {
        SourceSpec::Command { argv, timeout } => Box::new(CommandSource::new(argv, *timeout)?),
        SourceSpec::Http { url, timeout } => Box::new(HttpSource::new(url.clone(), *timeout)),
        SourceSpec::File { path } => Box::new(FileSource::new(path.clone())),
    })
}

fn unavailable(source_name: &str, reason: impl Into<String>) -> AppError {
    AppError::SourceUnavailable {
        source_name: source_name.to_string(),
        reason: reason.into(),
    }
}

/// Point in time a request must finish by; oversized timeouts are rejected
fn deadline_after(source_name: &str, timeout: Duration) -> Result<Instant, AppError> {
    Instant::now().checked_add(timeout).ok_or_else(|| {
        AppError::Config(format!(
            "{source_name} source timeout of {}s is too large",
            timeout.as_secs()
        ))
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;

    use super::*;
    use crate::core::TokenTotals;

    /// In-memory source for aggregator tests
    pub(crate) struct StaticSource {
        result: Result<Vec<Session>, String>,
        pub(crate) calls: Cell<usize>,
    }

    impl StaticSource {
        pub(crate) fn new(sessions: &[(&str, &str, u64, u64)]) -> Self {
            let sessions = sessions
                .iter()
                .map(|(key, model, input, output)| Session {
                    key: key.to_string(),
                    model: model.to_string(),
                    tokens: TokenTotals::new(*input, *output),
                })
                .collect();
            Self {
                result: Ok(sessions),
                calls: Cell::new(0),
            }
        }

        pub(crate) fn failing(reason: &str) -> Self {
            Self {
                result: Err(reason.to_string()),
                calls: Cell::new(0),
            }
        }
    }

    impl SessionSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        fn list_sessions(&self) -> Result<Vec<Session>, AppError> {
            self.calls.set(self.calls.get() + 1);
            self.result
                .clone()
                .map_err(|reason| unavailable(self.name(), reason))
        }
    }
}
