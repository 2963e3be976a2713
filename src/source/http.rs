use std::time::Duration;

use tracing::{debug, warn};

use crate::core::Session;
use crate::error::AppError;

use super::{SessionSource, deadline_after, parse_sessions, unavailable};

const FETCH_RETRIES: usize = 3;
const RETRY_BACKOFF_MS: u64 = 250;

/// Fetches sessions from the platform's local HTTP gateway
pub(crate) struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub(crate) fn new(url: String, timeout: Duration) -> Self {
        Self { url, timeout }
    }

    fn fetch_raw(&self) -> Result<String, AppError> {
        deadline_after(self.name(), self.timeout)?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build()
            .into();

        let mut last_error = String::new();
        for attempt in 0..FETCH_RETRIES {
            match agent.get(&self.url).call() {
                Ok(response) => {
                    let mut body = response.into_body();
                    return body.read_to_string().map_err(|e| {
                        unavailable(self.name(), format!("failed to read response: {e}"))
                    });
                }
                Err(e) => {
                    debug!("GET {} failed (attempt {}): {e}", self.url, attempt + 1);
                    last_error = e.to_string();
                }
            }

            if attempt + 1 < FETCH_RETRIES {
                std::thread::sleep(Duration::from_millis(
                    RETRY_BACKOFF_MS * (attempt as u64 + 1),
                ));
            }
        }

        warn!("Session endpoint {} unreachable after {FETCH_RETRIES} attempts", self.url);
        Err(unavailable(self.name(), format!("{}: {last_error}", self.url)))
    }
}

impl SessionSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn list_sessions(&self) -> Result<Vec<Session>, AppError> {
        let raw = self.fetch_raw()?;
        parse_sessions(&raw)
    }
}
