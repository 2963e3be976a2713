//! Core data types shared by the store, the aggregator and the output layer
//!
//! Token counts are unsigned; every total is derived from input + output.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::consts::DATE_FORMAT;

/// Input/output token pair
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenTotals {
    pub(crate) input_tokens: u64,
    pub(crate) output_tokens: u64,
}

impl TokenTotals {
    pub(crate) fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub(crate) fn add(&mut self, other: &TokenTotals) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }

    /// Add without saturating; `None` on overflow
    pub(crate) fn checked_add(&self, other: &TokenTotals) -> Option<TokenTotals> {
        Some(TokenTotals {
            input_tokens: self.input_tokens.checked_add(other.input_tokens)?,
            output_tokens: self.output_tokens.checked_add(other.output_tokens)?,
        })
    }

    pub(crate) fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// A live session as reported by the session source. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    pub(crate) key: String,
    pub(crate) model: String,
    pub(crate) tokens: TokenTotals,
}

/// Per-session line inside a persisted snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionBreakdown {
    pub(crate) key: String,
    pub(crate) input_tokens: u64,
    pub(crate) output_tokens: u64,
    pub(crate) total_tokens: u64,
}

impl From<&Session> for SessionBreakdown {
    fn from(session: &Session) -> Self {
        SessionBreakdown {
            key: session.key.clone(),
            input_tokens: session.tokens.input_tokens,
            output_tokens: session.tokens.output_tokens,
            total_tokens: session.tokens.total_tokens(),
        }
    }
}

/// One calendar day (UTC) of aggregated usage, stored as `<date>.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DailySnapshot {
    pub(crate) timestamp: DateTime<Utc>,
    #[serde(with = "day_key")]
    pub(crate) date: NaiveDate,
    pub(crate) model: String,
    pub(crate) input_tokens: u64,
    pub(crate) output_tokens: u64,
    pub(crate) total_tokens: u64,
    #[serde(default)]
    pub(crate) sessions: Vec<SessionBreakdown>,
}

impl DailySnapshot {
    pub(crate) fn new(
        date: NaiveDate,
        timestamp: DateTime<Utc>,
        model: String,
        sessions: &[Session],
        totals: TokenTotals,
    ) -> Self {
        DailySnapshot {
            timestamp,
            date,
            model,
            input_tokens: totals.input_tokens,
            output_tokens: totals.output_tokens,
            total_tokens: totals.total_tokens(),
            sessions: sessions.iter().map(SessionBreakdown::from).collect(),
        }
    }

    pub(crate) fn totals(&self) -> TokenTotals {
        TokenTotals::new(self.input_tokens, self.output_tokens)
    }

    /// Canonical day key (`YYYY-MM-DD`)
    pub(crate) fn day_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Structural checks beyond what deserialization enforces
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        match self.input_tokens.checked_add(self.output_tokens) {
            Some(sum) if sum == self.total_tokens => {}
            _ => {
                return Err(format!(
                    "totalTokens {} != inputTokens {} + outputTokens {}",
                    self.total_tokens, self.input_tokens, self.output_tokens
                ));
            }
        }
        for session in &self.sessions {
            if session.input_tokens.checked_add(session.output_tokens)
                != Some(session.total_tokens)
            {
                return Err(format!(
                    "session \"{}\" totalTokens does not match its input + output",
                    session.key
                ));
            }
        }
        Ok(())
    }

    /// Same content apart from the capture timestamp
    pub(crate) fn same_content(&self, other: &DailySnapshot) -> bool {
        self.date == other.date
            && self.model == other.model
            && self.input_tokens == other.input_tokens
            && self.output_tokens == other.output_tokens
            && self.total_tokens == other.total_tokens
            && self.sessions == other.sessions
    }
}

/// Serde adapter enforcing the fixed-width `YYYY-MM-DD` day key
mod day_key {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::consts::DATE_FORMAT;
    use crate::utils::parse_day_key;

    pub(super) fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse_day_key(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid day key \"{raw}\"")))
    }
}

/// Rollup window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Period {
    Today,
    Week,
    Month,
}

impl Period {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Period::Today => "Today",
            Period::Week => "Week",
            Period::Month => "Month",
        }
    }
}

/// Derived usage over a date window, never persisted
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RollupResult {
    pub(crate) period: Period,
    #[serde(with = "day_key")]
    pub(crate) start_date: NaiveDate,
    #[serde(with = "day_key")]
    pub(crate) end_date: NaiveDate,
    pub(crate) input_tokens: u64,
    pub(crate) output_tokens: u64,
    pub(crate) total_tokens: u64,
    pub(crate) cost: f64,
}

impl RollupResult {
    pub(crate) fn new(
        period: Period,
        start_date: NaiveDate,
        end_date: NaiveDate,
        totals: TokenTotals,
        cost: f64,
    ) -> Self {
        RollupResult {
            period,
            start_date,
            end_date,
            input_tokens: totals.input_tokens,
            output_tokens: totals.output_tokens,
            total_tokens: totals.total_tokens(),
            cost,
        }
    }
}

/// Non-fatal problem with one stored day; the day is left out of sums
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SnapshotWarning {
    pub(crate) file: String,
    pub(crate) reason: String,
}

impl std::fmt::Display for SnapshotWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipping corrupt snapshot {}: {}", self.file, self.reason)
    }
}

/// Full result of `report()`, handed to the output layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Report {
    pub(crate) model: String,
    pub(crate) display_name: String,
    pub(crate) today: RollupResult,
    pub(crate) week: RollupResult,
    pub(crate) month: RollupResult,
    pub(crate) warnings: Vec<SnapshotWarning>,
}

impl Report {
    pub(crate) fn rollups(&self) -> [&RollupResult; 3] {
        [&self.today, &self.week, &self.month]
    }
}

/// One stored day as listed by `history`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryDay {
    #[serde(with = "day_key")]
    pub(crate) date: NaiveDate,
    pub(crate) model: String,
    pub(crate) input_tokens: u64,
    pub(crate) output_tokens: u64,
    pub(crate) total_tokens: u64,
    pub(crate) sessions: usize,
    /// `None` when the day's model is no longer in the pricing table
    pub(crate) cost: Option<f64>,
}

/// Inclusive date range for history queries
#[derive(Debug, Clone, Copy)]
pub(crate) struct DateFilter {
    pub(crate) since: NaiveDate,
    pub(crate) until: NaiveDate,
}

impl DateFilter {
    pub(crate) fn new(since: NaiveDate, until: NaiveDate) -> Self {
        Self { since, until }
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        self.since <= date && date <= self.until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn session(key: &str, input: u64, output: u64) -> Session {
        Session {
            key: key.to_string(),
            model: "claude-sonnet-4-5".to_string(),
            tokens: TokenTotals::new(input, output),
        }
    }

    #[test]
    fn totals_default_all_zero() {
        let t = TokenTotals::default();
        assert_eq!(t.input_tokens, 0);
        assert_eq!(t.output_tokens, 0);
        assert_eq!(t.total_tokens(), 0);
    }

    #[test]
    fn totals_add_accumulates() {
        let mut t = TokenTotals::new(100, 50);
        t.add(&TokenTotals::new(10, 5));
        assert_eq!(t, TokenTotals::new(110, 55));
        assert_eq!(t.total_tokens(), 165);
    }

    #[test]
    fn totals_checked_add_detects_overflow() {
        let t = TokenTotals::new(u64::MAX, 0);
        assert!(t.checked_add(&TokenTotals::new(1, 0)).is_none());
        assert_eq!(
            TokenTotals::new(1, 2).checked_add(&TokenTotals::new(3, 4)),
            Some(TokenTotals::new(4, 6))
        );
    }

    #[test]
    fn snapshot_new_sets_total_and_breakdown() {
        let sessions = vec![session("a", 1000, 500), session("b", 10, 5)];
        let snap = DailySnapshot::new(
            d(2026, 2, 2),
            Utc::now(),
            "claude-sonnet-4-5".to_string(),
            &sessions,
            TokenTotals::new(1010, 505),
        );
        assert_eq!(snap.total_tokens, 1515);
        assert_eq!(snap.sessions.len(), 2);
        assert_eq!(snap.sessions[0].total_tokens, 1500);
        assert_eq!(snap.day_key(), "2026-02-02");
        assert!(snap.check_consistency().is_ok());
    }

    #[test]
    fn snapshot_json_uses_camel_case_and_day_key() {
        let snap = DailySnapshot::new(
            d(2026, 2, 1),
            "2026-02-01T23:00:00Z".parse().unwrap(),
            "claude-sonnet-4-5".to_string(),
            &[session("a", 100, 50)],
            TokenTotals::new(100, 50),
        );
        let json: serde_json::Value = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["date"], "2026-02-01");
        assert_eq!(json["inputTokens"], 100);
        assert_eq!(json["outputTokens"], 50);
        assert_eq!(json["totalTokens"], 150);
        assert_eq!(json["sessions"][0]["key"], "a");
        assert_eq!(json["sessions"][0]["totalTokens"], 150);
    }

    #[test]
    fn snapshot_rejects_unpadded_date() {
        let raw = r#"{"timestamp":"2026-02-01T00:00:00Z","date":"2026-2-1","model":"m",
            "inputTokens":1,"outputTokens":1,"totalTokens":2,"sessions":[]}"#;
        assert!(serde_json::from_str::<DailySnapshot>(raw).is_err());
    }

    #[test]
    fn snapshot_rejects_negative_tokens() {
        let raw = r#"{"timestamp":"2026-02-01T00:00:00Z","date":"2026-02-01","model":"m",
            "inputTokens":-1,"outputTokens":1,"totalTokens":0,"sessions":[]}"#;
        assert!(serde_json::from_str::<DailySnapshot>(raw).is_err());
    }

    #[test]
    fn consistency_flags_wrong_total() {
        let mut snap = DailySnapshot::new(
            d(2026, 2, 1),
            Utc::now(),
            "m".to_string(),
            &[],
            TokenTotals::new(1, 1),
        );
        snap.total_tokens = 3;
        assert!(snap.check_consistency().is_err());
    }

    #[test]
    fn same_content_ignores_timestamp() {
        let sessions = [session("a", 1, 2)];
        let a = DailySnapshot::new(
            d(2026, 2, 1),
            "2026-02-01T01:00:00Z".parse().unwrap(),
            "m".to_string(),
            &sessions,
            TokenTotals::new(1, 2),
        );
        let mut b = a.clone();
        b.timestamp = "2026-02-01T02:00:00Z".parse().unwrap();
        assert!(a.same_content(&b));
        b.input_tokens = 9;
        assert!(!a.same_content(&b));
    }

    #[test]
    fn rollup_total_is_input_plus_output() {
        let r = RollupResult::new(
            Period::Week,
            d(2026, 2, 1),
            d(2026, 2, 2),
            TokenTotals::new(310, 155),
            0.0,
        );
        assert_eq!(r.total_tokens, 465);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["period"], "week");
        assert_eq!(json["startDate"], "2026-02-01");
    }

    #[test]
    fn date_filter_inclusive_bounds() {
        let f = DateFilter::new(d(2026, 2, 1), d(2026, 2, 3));
        assert!(f.contains(d(2026, 2, 1)));
        assert!(f.contains(d(2026, 2, 3)));
        assert!(!f.contains(d(2026, 1, 31)));
        assert!(!f.contains(d(2026, 2, 4)));
    }
}
