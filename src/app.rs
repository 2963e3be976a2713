use chrono::NaiveDate;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::core::{Aggregator, DateFilter, LockSettings, SnapshotStore};
use crate::error::AppError;
use crate::output::{
    TableOptions, output_history_json, output_pricing_json, output_report_json,
    output_snapshot_json, print_history_table, print_pricing_table, print_report_table,
    print_snapshot_confirmation,
};
use crate::pricing::PricingTable;
use crate::source::{BoxedSource, build_source};
use crate::utils::{month_start, parse_date};

/// Everything a command needs, resolved once from CLI flags and config
pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) store: SnapshotStore,
    pub(crate) pricing: PricingTable,
    pub(crate) lock: LockSettings,
    pub(crate) source: BoxedSource,
    pub(crate) today: NaiveDate,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn from_cli(cli: &'a Cli) -> Result<Self, AppError> {
        let today = cli.today()?;
        let pricing = PricingTable::load(cli.pricing_file.as_deref())?;
        let lock = cli.lock_settings()?;
        let spec = cli.source_spec();
        debug!("Session source: {spec:?}");
        let source = build_source(&spec)?;
        let store = SnapshotStore::new(cli.data_dir());
        debug!(
            "Snapshot dir {}, lock {}, today {today}",
            store.dir().display(),
            lock.path.display()
        );
        Ok(Self {
            cli,
            store,
            pricing,
            lock,
            source,
            today,
        })
    }

    fn aggregator(&self) -> Aggregator<'_> {
        Aggregator::new(self.source.as_ref(), &self.store, &self.pricing, &self.lock)
            .with_first_weekday(self.cli.first_weekday())
    }

    fn table_options(&self) -> TableOptions {
        TableOptions {
            use_color: self.cli.use_color(),
        }
    }
}

pub(crate) fn run(cli: &Cli) -> Result<(), AppError> {
    match Commands::or_default(cli.command.clone()) {
        Commands::Report => handle_report(&CommandContext::from_cli(cli)?),
        Commands::Snapshot => handle_snapshot(&CommandContext::from_cli(cli)?),
        Commands::History { since, until } => handle_history(
            &CommandContext::from_cli(cli)?,
            since.as_deref(),
            until.as_deref(),
        ),
        // Listing the table needs no store, lock or source
        Commands::Pricing => handle_pricing(cli),
    }
}

fn handle_report(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let report = ctx.aggregator().report(ctx.today)?;
    if ctx.cli.json {
        println!("{}", output_report_json(&report));
    } else {
        print_report_table(&report, ctx.table_options());
    }
    Ok(())
}

fn handle_snapshot(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let outcome = ctx.aggregator().snapshot(ctx.today)?;
    if ctx.cli.json {
        println!("{}", output_snapshot_json(&outcome));
    } else {
        print_snapshot_confirmation(&outcome);
    }
    Ok(())
}

fn handle_history(
    ctx: &CommandContext<'_>,
    since: Option<&str>,
    until: Option<&str>,
) -> Result<(), AppError> {
    let since = since
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| month_start(ctx.today));
    let until = until.map(parse_date).transpose()?.unwrap_or(ctx.today);
    if since > until {
        return Err(AppError::Config(format!(
            "--since {since} is after --until {until}"
        )));
    }

    let (days, warnings) = ctx.aggregator().history(DateFilter::new(since, until))?;
    if ctx.cli.json {
        println!("{}", output_history_json(&days, &warnings));
    } else if days.is_empty() {
        println!("No snapshots stored between {since} and {until}.");
    } else {
        print_history_table(&days, ctx.table_options());
    }
    Ok(())
}

fn handle_pricing(cli: &Cli) -> Result<(), AppError> {
    let pricing = &PricingTable::load(cli.pricing_file.as_deref())?;
    if cli.json {
        println!("{}", output_pricing_json(pricing));
    } else {
        print_pricing_table(
            pricing,
            TableOptions {
                use_color: cli.use_color(),
            },
        );
    }
    Ok(())
}
