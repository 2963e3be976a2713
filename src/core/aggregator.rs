//! Reconciles the live session feed with stored daily snapshots
//!
//! Both entry points run entirely under the store lock. `today` is always a
//! parameter so callers (and tests) control the calendar.
//!
//! Rollup rule: the "today" figure is the stored snapshot for today (if any)
//! plus the live session totals. Week and month sum the stored days from
//! their start up to *yesterday* and then add the today figure once, so
//! today's file is never counted twice.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc, Weekday};
use tracing::{debug, info, warn};

use crate::core::lock::{LockSettings, with_lock};
use crate::core::store::{DayRead, SnapshotStore};
use crate::core::types::{
    DailySnapshot, DateFilter, HistoryDay, Period, Report, RollupResult, Session,
    SnapshotWarning, TokenTotals,
};
use crate::error::AppError;
use crate::pricing::{PricingEntry, PricingTable, calculate_cost};
use crate::source::SessionSource;
use crate::utils::{month_start, previous_day, week_start};

/// Validated view of one source response
#[derive(Debug)]
struct LiveUsage {
    sessions: Vec<Session>,
    primary_model: String,
    totals: TokenTotals,
}

/// Result of a successful `snapshot()`
#[derive(Debug)]
pub(crate) struct SnapshotOutcome {
    pub(crate) snapshot: DailySnapshot,
    pub(crate) path: PathBuf,
    /// Whether an earlier snapshot for the same day was replaced
    pub(crate) replaced: bool,
}

pub(crate) struct Aggregator<'a> {
    source: &'a dyn SessionSource,
    store: &'a SnapshotStore,
    pricing: &'a PricingTable,
    lock: &'a LockSettings,
    first_weekday: Weekday,
}

impl<'a> Aggregator<'a> {
    pub(crate) fn new(
        source: &'a dyn SessionSource,
        store: &'a SnapshotStore,
        pricing: &'a PricingTable,
        lock: &'a LockSettings,
    ) -> Self {
        Self {
            source,
            store,
            pricing,
            lock,
            first_weekday: Weekday::Mon,
        }
    }

    pub(crate) fn with_first_weekday(mut self, first_weekday: Weekday) -> Self {
        self.first_weekday = first_weekday;
        self
    }

    /// Fetch and validate the live sessions
    fn live_usage(&self) -> Result<LiveUsage, AppError> {
        let sessions = self.source.list_sessions()?;
        let Some(first) = sessions.first() else {
            return Err(AppError::NoActiveSessions);
        };
        let primary_model = first.model.clone();

        let mut totals = TokenTotals::default();
        for session in &sessions {
            totals = totals
                .checked_add(&session.tokens)
                .ok_or_else(|| AppError::InvalidTokenCount {
                    key: session.key.clone(),
                    field: "inputTokens/outputTokens",
                    value: "sum overflows u64".to_string(),
                })?;
        }

        let other_models = sessions
            .iter()
            .filter(|s| s.model != primary_model)
            .count();
        if other_models > 0 {
            debug!(
                "{other_models} session(s) use a model other than {primary_model}; pricing by {primary_model}"
            );
        }
        debug!(
            "{} live session(s) from {}: {} in / {} out",
            sessions.len(),
            self.source.name(),
            totals.input_tokens,
            totals.output_tokens
        );

        Ok(LiveUsage {
            sessions,
            primary_model,
            totals,
        })
    }

    /// Persist today's snapshot, replacing any earlier one for the same day
    pub(crate) fn snapshot(&self, today: NaiveDate) -> Result<SnapshotOutcome, AppError> {
        with_lock(self.lock, || {
            let live = self.live_usage()?;
            self.pricing.price_for(&live.primary_model)?;

            let replaced = !matches!(self.store.read_day(today), DayRead::Absent);
            let snapshot = DailySnapshot::new(
                today,
                Utc::now(),
                live.primary_model,
                &live.sessions,
                live.totals,
            );
            let path = self.store.write_day(&snapshot)?;
            info!(
                "Snapshot {} written: {} tokens across {} session(s)",
                snapshot.day_key(),
                snapshot.total_tokens,
                snapshot.sessions.len()
            );
            Ok(SnapshotOutcome {
                snapshot,
                path,
                replaced,
            })
        })
    }

    /// Today/week/month rollups priced at the primary model's rates
    pub(crate) fn report(&self, today: NaiveDate) -> Result<Report, AppError> {
        with_lock(self.lock, || {
            let live = self.live_usage()?;
            let pricing = self.pricing.price_for(&live.primary_model)?;
            let mut warnings = Vec::new();

            let stored_today = match self.store.read_day(today) {
                DayRead::Present(snapshot) => snapshot.totals(),
                DayRead::Absent => TokenTotals::default(),
                DayRead::Corrupt(warning) => {
                    warn!("{warning}");
                    warnings.push(warning);
                    TokenTotals::default()
                }
            };
            let mut today_totals = stored_today;
            today_totals.add(&live.totals);

            let today_rollup = rollup(Period::Today, today, today, today_totals, pricing);
            let week = self.window_rollup(
                Period::Week,
                week_start(today, self.first_weekday),
                today,
                today_totals,
                pricing,
                &mut warnings,
            );
            let month = self.window_rollup(
                Period::Month,
                month_start(today),
                today,
                today_totals,
                pricing,
                &mut warnings,
            );

            Ok(Report {
                model: pricing.model.clone(),
                display_name: pricing.display_name.clone(),
                today: today_rollup,
                week,
                month,
                warnings,
            })
        })
    }

    /// Stored days in `[start, today - 1]` plus the combined today figure
    fn window_rollup(
        &self,
        period: Period,
        start: NaiveDate,
        today: NaiveDate,
        today_totals: TokenTotals,
        pricing: &PricingEntry,
        warnings: &mut Vec<SnapshotWarning>,
    ) -> RollupResult {
        let mut totals = match previous_day(today) {
            Some(yesterday) => {
                let sum = self.store.sum_range(start, yesterday);
                for warning in sum.warnings {
                    if !warnings.contains(&warning) {
                        warnings.push(warning);
                    }
                }
                sum.totals
            }
            None => TokenTotals::default(),
        };
        totals.add(&today_totals);
        rollup(period, start, today, totals, pricing)
    }

    /// Stored days in the filter range, each priced by its own recorded model
    pub(crate) fn history(
        &self,
        filter: DateFilter,
    ) -> Result<(Vec<HistoryDay>, Vec<SnapshotWarning>), AppError> {
        with_lock(self.lock, || {
            let (snapshots, warnings) = self.store.list_days(filter.since, filter.until);
            let days = snapshots
                .into_iter()
                .filter(|s| filter.contains(s.date))
                .map(|s| {
                    let totals = s.totals();
                    let cost = self
                        .pricing
                        .get(&s.model)
                        .map(|pricing| calculate_cost(&totals, pricing));
                    HistoryDay {
                        date: s.date,
                        input_tokens: totals.input_tokens,
                        output_tokens: totals.output_tokens,
                        total_tokens: totals.total_tokens(),
                        sessions: s.sessions.len(),
                        model: s.model,
                        cost,
                    }
                })
                .collect();
            Ok((days, warnings))
        })
    }
}

fn rollup(
    period: Period,
    start: NaiveDate,
    end: NaiveDate,
    totals: TokenTotals,
    pricing: &PricingEntry,
) -> RollupResult {
    RollupResult::new(period, start, end, totals, calculate_cost(&totals, pricing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::StaticSource;
    use std::fs;
    use std::time::Duration;

    const SONNET: &str = "claude-sonnet-4-5";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        store: SnapshotStore,
        pricing: PricingTable,
        lock: LockSettings,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = SnapshotStore::new(dir.path().join("snapshots"));
            let lock = LockSettings::new(
                dir.path().join("snapshots.lock"),
                Duration::from_millis(500),
            );
            Self {
                _dir: dir,
                store,
                pricing: PricingTable::builtin(),
                lock,
            }
        }

        fn aggregator<'a>(&'a self, source: &'a StaticSource) -> Aggregator<'a> {
            Aggregator::new(source, &self.store, &self.pricing, &self.lock)
        }

        fn seed(&self, date: NaiveDate, input: u64, output: u64) {
            let snapshot = DailySnapshot::new(
                date,
                Utc::now(),
                SONNET.to_string(),
                &[],
                TokenTotals::new(input, output),
            );
            self.store.write_day(&snapshot).unwrap();
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn snapshot_totals_sum_all_sessions() {
        let fx = Fixture::new();
        let source = StaticSource::new(&[
            ("a", SONNET, 1000, 500),
            ("b", "claude-haiku-4-5", 20, 7),
            ("c", SONNET, 0, 0),
        ]);
        let outcome = fx.aggregator(&source).snapshot(d(2026, 2, 2)).unwrap();
        let s = &outcome.snapshot;
        assert_eq!(s.input_tokens, 1020);
        assert_eq!(s.output_tokens, 507);
        assert_eq!(s.total_tokens, 1527);
        assert_eq!(s.model, SONNET);
        assert_eq!(s.sessions.len(), 3);
        assert!(!outcome.replaced);
        assert!(outcome.path.ends_with("2026-02-02.json"));
    }

    #[test]
    fn single_session_scenario() {
        let fx = Fixture::new();
        let source = StaticSource::new(&[("a", SONNET, 1000, 500)]);
        let agg = fx.aggregator(&source);

        let outcome = agg.snapshot(d(2026, 2, 2)).unwrap();
        assert_eq!(outcome.snapshot.total_tokens, 1500);

        let fresh = Fixture::new();
        let report = fresh.aggregator(&source).report(d(2026, 2, 2)).unwrap();
        assert_eq!(report.today.total_tokens, 1500);
        assert!(approx(report.today.cost, 0.0105));
        assert_eq!(report.display_name, "Claude Sonnet 4.5");
    }

    #[test]
    fn repeated_snapshot_overwrites_with_equal_content() {
        let fx = Fixture::new();
        let source = StaticSource::new(&[("a", SONNET, 10, 5), ("b", SONNET, 1, 1)]);
        let agg = fx.aggregator(&source);

        let first = agg.snapshot(d(2026, 2, 2)).unwrap();
        let second = agg.snapshot(d(2026, 2, 2)).unwrap();
        assert!(second.replaced);
        assert!(first.snapshot.same_content(&second.snapshot));

        let DayRead::Present(stored) = fx.store.read_day(d(2026, 2, 2)) else {
            panic!("snapshot missing");
        };
        // Overwritten, not accumulated
        assert_eq!(stored.totals(), TokenTotals::new(11, 6));
    }

    #[test]
    fn unknown_model_writes_nothing() {
        let fx = Fixture::new();
        let source = StaticSource::new(&[("a", "mystery-model", 10, 5)]);
        let agg = fx.aggregator(&source);

        let err = agg.snapshot(d(2026, 2, 2)).unwrap_err();
        assert!(matches!(err, AppError::UnknownModel { .. }));
        assert!(matches!(fx.store.read_day(d(2026, 2, 2)), DayRead::Absent));

        let err = agg.report(d(2026, 2, 2)).unwrap_err();
        assert!(matches!(err, AppError::UnknownModel { .. }));
    }

    #[test]
    fn empty_sessions_fail_without_writing() {
        let fx = Fixture::new();
        let source = StaticSource::new(&[]);
        let agg = fx.aggregator(&source);

        assert!(matches!(
            agg.report(d(2026, 2, 2)),
            Err(AppError::NoActiveSessions)
        ));
        assert!(matches!(
            agg.snapshot(d(2026, 2, 2)),
            Err(AppError::NoActiveSessions)
        ));
        assert!(!fx.store.dir().exists());
    }

    #[test]
    fn source_failure_propagates_and_releases_lock() {
        let fx = Fixture::new();
        let source = StaticSource::failing("gateway down");
        let err = fx.aggregator(&source).snapshot(d(2026, 2, 2)).unwrap_err();
        assert!(matches!(err, AppError::SourceUnavailable { .. }));
        assert!(!fx.lock.path.exists());
    }

    #[test]
    fn primary_model_is_first_session() {
        let fx = Fixture::new();
        let source = StaticSource::new(&[
            ("a", "claude-haiku-4-5", 1_000_000, 0),
            ("b", SONNET, 0, 0),
        ]);
        let report = fx.aggregator(&source).report(d(2026, 2, 2)).unwrap();
        assert_eq!(report.model, "claude-haiku-4-5");
        assert!(approx(report.today.cost, 1.0));
    }

    #[test]
    fn week_rollup_scenario() {
        let fx = Fixture::new();
        fx.seed(d(2026, 2, 1), 100, 50);
        fx.seed(d(2026, 2, 2), 200, 100);
        let source = StaticSource::new(&[("a", SONNET, 10, 5)]);
        let mut agg = fx.aggregator(&source);
        // 2026-02-01 is a Sunday; start weeks on Sunday so the range covers both files.
        agg = agg.with_first_weekday(Weekday::Sun);

        let report = agg.report(d(2026, 2, 2)).unwrap();
        assert_eq!(report.week.start_date, d(2026, 2, 1));
        assert_eq!(report.week.input_tokens, 310);
        assert_eq!(report.week.output_tokens, 155);
        assert_eq!(report.week.total_tokens, 465);
        // Today = stored today + live
        assert_eq!(report.today.input_tokens, 210);
        assert_eq!(report.today.output_tokens, 105);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn today_file_counted_once_in_month() {
        let fx = Fixture::new();
        fx.seed(d(2026, 2, 10), 1000, 100);
        fx.seed(d(2026, 2, 16), 50, 5);
        let source = StaticSource::new(&[("a", SONNET, 1, 1)]);
        let report = fx.aggregator(&source).report(d(2026, 2, 16)).unwrap();

        assert_eq!(report.today.input_tokens, 51);
        // Week of Monday 2026-02-16 starts today: only today's combined value
        assert_eq!(report.week.start_date, d(2026, 2, 16));
        assert_eq!(report.week.input_tokens, 51);
        assert_eq!(report.month.start_date, d(2026, 2, 1));
        assert_eq!(report.month.input_tokens, 1051);
        assert_eq!(report.month.output_tokens, 106);
    }

    #[test]
    fn future_days_are_not_summed() {
        let fx = Fixture::new();
        fx.seed(d(2026, 2, 20), 1000, 1000);
        let source = StaticSource::new(&[("a", SONNET, 1, 1)]);
        let report = fx.aggregator(&source).report(d(2026, 2, 16)).unwrap();
        assert_eq!(report.month.input_tokens, 1);
    }

    #[test]
    fn snapshot_then_report_reflects_baseline_plus_live() {
        let fx = Fixture::new();
        let source = StaticSource::new(&[("a", SONNET, 100, 10)]);
        let agg = fx.aggregator(&source);
        agg.snapshot(d(2026, 2, 2)).unwrap();
        let report = agg.report(d(2026, 2, 2)).unwrap();
        assert_eq!(report.today.input_tokens, 200);
        assert_eq!(report.today.output_tokens, 20);
    }

    #[test]
    fn corrupt_day_degrades_with_warning() {
        let fx = Fixture::new();
        fx.seed(d(2026, 2, 3), 100, 50);
        fs::write(fx.store.day_path(d(2026, 2, 4)), "garbage").unwrap();
        let source = StaticSource::new(&[("a", SONNET, 1, 1)]);
        let report = fx.aggregator(&source).report(d(2026, 2, 5)).unwrap();

        assert_eq!(report.month.input_tokens, 101);
        assert_eq!(report.week.input_tokens, 101);
        // Same file surfaces once even though week and month both scanned it
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn corrupt_today_file_counts_as_absent() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.store.dir()).unwrap();
        fs::write(fx.store.day_path(d(2026, 2, 5)), "{}").unwrap();
        let source = StaticSource::new(&[("a", SONNET, 7, 3)]);
        let report = fx.aggregator(&source).report(d(2026, 2, 5)).unwrap();
        assert_eq!(report.today.total_tokens, 10);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn rollups_priced_independently() {
        let fx = Fixture::new();
        fx.seed(d(2026, 2, 1), 1_000_000, 0);
        let source = StaticSource::new(&[("a", SONNET, 1_000_000, 0)]);
        let report = fx.aggregator(&source).report(d(2026, 2, 2)).unwrap();
        assert!(approx(report.today.cost, 3.0));
        assert!(approx(report.month.cost, 6.0));
    }

    #[test]
    fn held_lock_times_out_without_writing() {
        let fx = Fixture::new();
        let _held = crate::core::lock::acquire(&fx.lock).unwrap();
        let source = StaticSource::new(&[("a", SONNET, 1, 1)]);
        let err = fx.aggregator(&source).snapshot(d(2026, 2, 2)).unwrap_err();
        assert!(matches!(err, AppError::LockTimeout { .. }));
        // Source never queried and nothing written
        assert_eq!(source.calls.get(), 0);
        assert!(!fx.store.dir().exists());
    }

    #[test]
    fn history_prices_each_day_by_its_model() {
        let fx = Fixture::new();
        fx.seed(d(2026, 2, 1), 1_000_000, 0);
        let other = DailySnapshot::new(
            d(2026, 2, 2),
            Utc::now(),
            "retired-model".to_string(),
            &[],
            TokenTotals::new(5, 5),
        );
        fx.store.write_day(&other).unwrap();

        let source = StaticSource::new(&[]);
        let (days, warnings) = fx
            .aggregator(&source)
            .history(DateFilter::new(d(2026, 2, 1), d(2026, 2, 28)))
            .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(days.len(), 2);
        assert!(approx(days[0].cost.unwrap(), 3.0));
        assert_eq!(days[1].cost, None);
        // History does not need live sessions
        assert_eq!(source.calls.get(), 0);
    }
}
