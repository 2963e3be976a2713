use std::io::Read;
use std::path::PathBuf;

use tracing::debug;

use crate::core::Session;
use crate::error::AppError;

use super::{SessionSource, parse_sessions, unavailable};

/// Reads a saved source response from disk, or stdin for `-`
pub(crate) struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_raw(&self) -> std::io::Result<String> {
        if self.path.as_os_str() == "-" {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            return Ok(raw);
        }
        std::fs::read_to_string(&self.path)
    }
}

impl SessionSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn list_sessions(&self) -> Result<Vec<Session>, AppError> {
        debug!("Reading sessions from {}", self.path.display());
        let raw = self
            .read_raw()
            .map_err(|e| unavailable(self.name(), format!("{}: {e}", self.path.display())))?;
        parse_sessions(&raw)
    }
}
