//! CLI subcommand definitions

use clap::Subcommand;

/// Main CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Show today/week/month usage and cost (default)
    Report,
    /// Persist today's totals as the day's snapshot
    Snapshot,
    /// List stored daily snapshots
    History {
        /// First day to list (YYYYMMDD or YYYY-MM-DD, default: start of month)
        #[arg(short, long)]
        since: Option<String>,

        /// Last day to list (YYYYMMDD or YYYY-MM-DD, default: today)
        #[arg(short, long)]
        until: Option<String>,
    },
    /// Show the active pricing table
    Pricing,
}

impl Commands {
    /// Report is the default command
    pub(crate) fn or_default(cmd: Option<Commands>) -> Commands {
        cmd.unwrap_or(Commands::Report)
    }
}
