//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, Utc, Weekday};
use clap::{Parser, ValueEnum};

use crate::config::{Config, ConfigWeekStart, default_data_dir};
use crate::consts::LOCK_FILE_NAME;
use crate::core::LockSettings;
use crate::error::AppError;
use crate::source::SourceSpec;
use crate::utils::parse_date;

use super::commands::Commands;

const DEFAULT_LOCK_TIMEOUT_SECS: f64 = 10.0;
const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SOURCE_COMMAND: &[&str] = &["openclaw", "sessions", "--json"];

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum ColorMode {
    /// Auto-detect based on terminal (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub(crate) enum WeekStart {
    Monday,
    Sunday,
}

#[derive(Parser)]
#[command(name = "sessionstats")]
#[command(about = "Daily token usage snapshots and cost rollups for assistant sessions", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Config file (default: ~/.config/sessionstats/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Directory holding one snapshot file per day
    #[arg(long, global = true, value_name = "DIR")]
    pub(crate) data_dir: Option<PathBuf>,

    /// Lock marker path (default: <data-dir>/.sessionstats.lock)
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) lock_path: Option<PathBuf>,

    /// Seconds to wait for another instance to release the lock
    #[arg(long, global = true, value_name = "SECS")]
    pub(crate) lock_timeout: Option<f64>,

    /// Command that prints the session list as JSON (split on whitespace)
    #[arg(long, global = true, value_name = "CMD", allow_hyphen_values = true)]
    pub(crate) source_command: Option<String>,

    /// HTTP endpoint returning the session list as JSON
    #[arg(long, global = true, value_name = "URL", conflicts_with = "source_command")]
    pub(crate) source_url: Option<String>,

    /// Read the session list from a file ("-" for stdin)
    #[arg(long, global = true, value_name = "FILE", conflicts_with_all = ["source_command", "source_url"])]
    pub(crate) sessions_file: Option<PathBuf>,

    /// Replace the built-in pricing table with a TOML file
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) pricing_file: Option<PathBuf>,

    /// Treat this UTC day as today (YYYYMMDD or YYYY-MM-DD)
    #[arg(long, global = true, value_name = "DATE")]
    pub(crate) date: Option<String>,

    /// First day of the week for the weekly rollup
    #[arg(long, global = true, value_enum)]
    pub(crate) week_start: Option<WeekStart>,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Enable debug output (show processing details)
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    /// Only print errors on stderr
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub(crate) quiet: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub(crate) color: ColorMode,

    /// Disable colored output (shorthand for --color=never)
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    #[arg(skip)]
    source_timeout_secs: Option<u64>,

    #[arg(skip)]
    configured_command: Option<Vec<String>>,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: Config) -> Self {
        if !self.no_color && config.no_color {
            self.no_color = true;
        }

        if self.data_dir.is_none() {
            self.data_dir = config.data_dir;
        }
        if self.lock_path.is_none() {
            self.lock_path = config.lock_path;
        }
        if self.lock_timeout.is_none() {
            self.lock_timeout = config.lock_timeout_secs;
        }
        if self.pricing_file.is_none() {
            self.pricing_file = config.pricing_file;
        }
        if self.week_start.is_none() {
            self.week_start = config.week_start.map(|w| match w {
                ConfigWeekStart::Monday => WeekStart::Monday,
                ConfigWeekStart::Sunday => WeekStart::Sunday,
            });
        }
        self.source_timeout_secs = config.source.timeout_secs;

        // A source chosen on the command line replaces the configured one entirely.
        if self.source_command.is_none() && self.source_url.is_none() && self.sessions_file.is_none()
        {
            self.sessions_file = config.source.file;
            if self.sessions_file.is_none() {
                self.source_url = config.source.url;
            }
            if self.sessions_file.is_none() && self.source_url.is_none() {
                self.configured_command = config.source.command;
            }
        }

        self
    }

    pub(crate) fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub(crate) fn lock_settings(&self) -> Result<LockSettings, AppError> {
        let secs = self.lock_timeout.unwrap_or(DEFAULT_LOCK_TIMEOUT_SECS);
        let timeout = Duration::try_from_secs_f64(secs)
            .map_err(|_| AppError::Config(format!("invalid lock timeout: {secs}")))?;
        let path = self
            .lock_path
            .clone()
            .unwrap_or_else(|| self.data_dir().join(LOCK_FILE_NAME));
        Ok(LockSettings::new(path, timeout))
    }

    pub(crate) fn source_spec(&self) -> SourceSpec {
        let timeout =
            Duration::from_secs(self.source_timeout_secs.unwrap_or(DEFAULT_SOURCE_TIMEOUT_SECS));
        if let Some(path) = &self.sessions_file {
            return SourceSpec::File { path: path.clone() };
        }
        if let Some(url) = &self.source_url {
            return SourceSpec::Http {
                url: url.clone(),
                timeout,
            };
        }
        let argv = match (&self.source_command, &self.configured_command) {
            (Some(cmd), _) => cmd.split_whitespace().map(str::to_string).collect(),
            (None, Some(argv)) => argv.clone(),
            (None, None) => DEFAULT_SOURCE_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        SourceSpec::Command { argv, timeout }
    }

    /// The UTC day the run accounts for
    pub(crate) fn today(&self) -> Result<NaiveDate, AppError> {
        match &self.date {
            Some(raw) => parse_date(raw),
            None => Ok(Utc::now().date_naive()),
        }
    }

    pub(crate) fn first_weekday(&self) -> Weekday {
        match self.week_start {
            Some(WeekStart::Sunday) => Weekday::Sun,
            _ => Weekday::Mon,
        }
    }

    pub(crate) fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }
}
