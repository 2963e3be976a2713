use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::core::Session;
use crate::error::AppError;

use super::{SessionSource, deadline_after, parse_sessions, unavailable};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs the assistant platform's CLI and parses its JSON stdout
pub(crate) struct CommandSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSource {
    pub(crate) fn new(argv: &[String], timeout: Duration) -> Result<Self, AppError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| AppError::Config("source command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    fn spawn(&self) -> Result<Child, AppError> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    unavailable(self.name(), format!("`{}` not found in PATH", self.program))
                } else {
                    unavailable(self.name(), format!("failed to run `{}`: {e}", self.program))
                }
            })
    }

    /// Wait for the child, killing it once the timeout elapses
    fn run(&self) -> Result<String, AppError> {
        let deadline = deadline_after(self.name(), self.timeout)?;
        let mut child = self.spawn()?;

        // Drain pipes on helper threads so a chatty child cannot block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(unavailable(
                        self.name(),
                        format!(
                            "`{}` did not respond within {:.1}s",
                            self.program,
                            self.timeout.as_secs_f64()
                        ),
                    ));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(unavailable(
                        self.name(),
                        format!("failed to wait for `{}`: {e}", self.program),
                    ));
                }
            }
        };

        let stdout = stdout.map(join_output).unwrap_or_default();
        let stderr = stderr.map(join_output).unwrap_or_default();

        if !status.success() {
            return Err(unavailable(
                self.name(),
                format!("`{}` exited with {}: {}", self.program, status, stderr.trim()),
            ));
        }
        Ok(stdout)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_output(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

impl SessionSource for CommandSource {
    fn name(&self) -> &str {
        "command"
    }

    fn list_sessions(&self) -> Result<Vec<Session>, AppError> {
        debug!("Running `{} {}`", self.program, self.args.join(" "));
        let start = Instant::now();
        let raw = self.run()?;
        debug!(
            "Session command returned {} bytes ({:.2}ms)",
            raw.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        parse_sessions(&raw)
    }
}
